//! Prompt files: optional TOML front matter between `---` lines, then a
//! template body with `{{variable}}` placeholders.
//!
//! ```text
//! ---
//! model = "openai/gpt-4o"
//! tools = ["calculator"]
//! system = "Answer in one sentence."
//! ---
//! What is {{a}} times {{b}}?
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Front matter keys the prompt itself uses. Every other key is
/// configuration and is layered by the config loader.
#[derive(Debug, Default, Deserialize)]
pub struct PromptMeta {
    pub system: Option<String>,
}

#[derive(Debug)]
pub struct PromptFile {
    pub path: PathBuf,
    front_matter: Option<String>,
    pub meta: PromptMeta,
    pub body: String,
}

impl PromptFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::PromptFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        let front_matter_error = |message: String| Error::FrontMatter {
            path: path.clone(),
            message,
        };

        let (front_matter, body) = match split_front_matter(text) {
            Split::None => (None, text),
            Split::Unterminated => {
                return Err(front_matter_error("missing closing '---'".into()));
            }
            Split::Found { front_matter, body } => (Some(front_matter), body),
        };

        let meta = match front_matter {
            Some(toml_text) => {
                toml::from_str(toml_text).map_err(|e| front_matter_error(e.to_string()))?
            }
            None => PromptMeta::default(),
        };

        Ok(Self {
            front_matter: front_matter.map(str::to_string),
            meta,
            body: body.to_string(),
            path,
        })
    }

    /// Raw TOML of the front matter, if the file has any.
    pub fn front_matter(&self) -> Option<&str> {
        self.front_matter.as_deref()
    }

    /// Directory holding the prompt file.
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

enum Split<'a> {
    None,
    Unterminated,
    Found { front_matter: &'a str, body: &'a str },
}

fn split_front_matter(text: &str) -> Split<'_> {
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return Split::None;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Split::Found {
                front_matter: &rest[..offset],
                body: &rest[offset + line.len()..],
            };
        }
        offset += line.len();
    }
    Split::Unterminated
}

/// Variables from piped input: a JSON object is used as is; any other
/// non-empty text is bound to `input`.
pub fn variables_from_input(input: &str) -> Map<String, Value> {
    let input = input.trim();
    if input.is_empty() {
        return Map::new();
    }
    match serde_json::from_str(input) {
        Ok(Value::Object(variables)) => variables,
        _ => {
            let mut variables = Map::new();
            variables.insert("input".into(), Value::String(input.to_string()));
            variables
        }
    }
}

/// Substitute `{{name}}` placeholders.
///
/// Whitespace inside the braces is ignored and dotted names reach into
/// objects and arrays. Missing variables render as nothing, strings as
/// their text, other values as JSON.
pub fn render(template: &str, variables: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        match lookup(variables, after[..end].trim()) {
            Some(Value::String(text)) => out.push_str(text),
            Some(Value::Null) | None => {}
            Some(value) => out.push_str(&value.to_string()),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn lookup<'a>(variables: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let mut parts = name.split('.');
    let mut value = variables.get(parts.next()?)?;
    for part in parts {
        value = match value {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}
