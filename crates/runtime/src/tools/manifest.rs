//! TOML tool sources.
//!
//! A source named `math` is the file `math.toml` in one of the tool search
//! directories, and `pkg.math` is `pkg/math.toml`:
//!
//! ```toml
//! [[tool]]
//! name = "add_numbers"
//! doc = "Adds two numbers together and returns the result."
//! command = ["python3", "add.py"]
//!
//! [[tool.param]]
//! name = "a"
//! type = "int"
//! ```

use super::command::{CommandTool, DEFAULT_TIMEOUT};
use super::schema::{Candidate, ParamDecl};
use super::{RegistryError, Tool};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default, rename = "tool")]
    tools: Vec<ManifestTool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestTool {
    name: String,
    doc: Option<String>,
    command: Vec<String>,
    #[serde(default)]
    safe: bool,
    timeout_secs: Option<u64>,
    #[serde(default, rename = "param")]
    params: Vec<ParamDecl>,
}

/// A callable declared by a source together with its handler.
#[derive(Clone)]
pub struct SourceTool {
    pub candidate: Candidate,
    pub handler: Arc<dyn Tool>,
}

impl std::fmt::Debug for SourceTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTool")
            .field("candidate", &self.candidate)
            .finish_non_exhaustive()
    }
}

/// Loads tool sources by name.
pub trait SourceLoader {
    /// Every callable declared by `source` in `dir`, or `None` when `dir`
    /// has no such source.
    fn load(&self, dir: &Path, source: &str) -> Result<Option<Vec<SourceTool>>, RegistryError>;
}

/// Loads `<dir>/<source>.toml` manifests of command tools.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    default_timeout: Duration,
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ManifestLoader {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// `pkg.math` lives at `<dir>/pkg/math.toml`.
    pub fn manifest_path(dir: &Path, source: &str) -> PathBuf {
        dir.join(format!("{}.toml", source.replace('.', "/")))
    }

    fn parse(&self, path: &Path, text: &str) -> Result<Vec<SourceTool>, RegistryError> {
        let manifest_error = |message: String| RegistryError::Manifest {
            path: path.to_path_buf(),
            message,
        };

        let manifest: Manifest = toml::from_str(text).map_err(|e| manifest_error(e.to_string()))?;
        let dir = path.parent().unwrap_or(Path::new("."));

        let mut names = HashSet::new();
        if let Some(tool) = manifest.tools.iter().find(|t| !names.insert(t.name.as_str())) {
            return Err(manifest_error(format!("tool '{}' is declared twice", tool.name)));
        }

        manifest
            .tools
            .into_iter()
            .map(|tool| {
                let timeout = tool
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(self.default_timeout);
                let handler = CommandTool::new(&tool.command, dir, timeout).ok_or_else(|| {
                    manifest_error(format!("tool '{}' has an empty command", tool.name))
                })?;
                Ok(SourceTool {
                    candidate: Candidate {
                        name: tool.name,
                        doc: tool.doc,
                        params: tool.params,
                        safe: tool.safe,
                    },
                    handler: Arc::new(handler),
                })
            })
            .collect()
    }
}

impl SourceLoader for ManifestLoader {
    fn load(&self, dir: &Path, source: &str) -> Result<Option<Vec<SourceTool>>, RegistryError> {
        let path = Self::manifest_path(dir, source);
        if !path.is_file() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading tool source");

        let text = std::fs::read_to_string(&path).map_err(|e| RegistryError::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        self.parse(&path, &text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
[[tool]]
name = "add_numbers"
doc = """
Adds two numbers together and returns the result.

This is a simple arithmetic tool that takes two integers
and returns their sum.
"""
command = ["python3", "add.py"]

[[tool.param]]
name = "a"
type = "int"

[[tool.param]]
name = "b"
type = "int"

[[tool]]
name = "greet"
doc = "Greets a person by name."
command = ["./greet.sh"]
safe = true
timeout_secs = 5

[[tool.param]]
name = "name"
type = "str"
default = "World"

[[tool]]
name = "no_docstring_func"
command = ["true"]
"#;

    #[test]
    fn parses_manifest() {
        let tools = ManifestLoader::default()
            .parse(Path::new("/opt/tools/sample.toml"), SAMPLE)
            .unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.candidate.name.as_str()).collect();
        assert_eq!(names, ["add_numbers", "greet", "no_docstring_func"]);

        let greet = &tools[1].candidate;
        assert!(greet.safe);
        assert_eq!(greet.params[0].declared_type.as_deref(), Some("str"));
        assert_eq!(greet.params[0].default, Some(json!("World")));
        assert!(tools[2].candidate.doc.is_none());
    }

    #[test]
    fn empty_command_is_a_manifest_error() {
        let text = "[[tool]]\nname = \"x\"\ndoc = \"X.\"\ncommand = []\n";
        let err = ManifestLoader::default()
            .parse(Path::new("bad.toml"), text)
            .unwrap_err();
        assert!(err.to_string().contains("empty command"));
    }

    #[test]
    fn repeated_tool_name_is_a_manifest_error() {
        let text = "[[tool]]\nname = \"add\"\ndoc = \"One.\"\ncommand = [\"echo\", \"one\"]\n\
                    [[tool]]\nname = \"add\"\ndoc = \"Two.\"\ncommand = [\"echo\", \"two\"]\n";
        let err = ManifestLoader::default()
            .parse(Path::new("dup.toml"), text)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Manifest { .. }));
        assert!(err.to_string().contains("'add' is declared twice"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = "[[tool]]\nname = \"x\"\ncommand = [\"true\"]\nsafety = true\n";
        assert!(matches!(
            ManifestLoader::default().parse(Path::new("bad.toml"), text),
            Err(RegistryError::Manifest { .. })
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ManifestLoader::default().load(dir.path(), "absent").unwrap();
        assert!(loaded.is_none());

        std::fs::write(dir.path().join("present.toml"), SAMPLE).unwrap();
        let loaded = ManifestLoader::default().load(dir.path(), "present").unwrap();
        assert_eq!(loaded.unwrap().len(), 3);
    }

    #[test]
    fn dotted_sources_are_nested() {
        assert_eq!(
            ManifestLoader::manifest_path(Path::new("/t"), "pkg.math"),
            PathBuf::from("/t/pkg/math.toml")
        );
    }
}
