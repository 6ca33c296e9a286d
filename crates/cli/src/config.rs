//! Layered configuration.
//!
//! Lowest to highest priority:
//! 1. Built-in defaults, then the standard `OPENAI_API_KEY`,
//!    `ANTHROPIC_API_KEY`, `BASE_URL` and `OPENAI_BASE_URL` variables
//! 2. `~/.runprompt/config.toml`
//! 3. `$XDG_CONFIG_HOME/runprompt/config.toml`
//! 4. `./.runprompt/config.toml`
//! 5. Prompt file front matter
//! 6. `RUNPROMPT_*` environment variables
//! 7. Command-line flags

use crate::error::{Error, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use policy::ApprovalPolicy;
use runtime::BackendSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const CONFIG_DIR: &str = ".runprompt";
const CONFIG_FILE: &str = "config.toml";
const YAML_CONFIG_FILES: &[&str] = &["config.yml", "config.yaml"];
const ENV_PREFIX: &str = "RUNPROMPT_";

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `provider/name`, e.g. `openai/gpt-4o`.
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tool patterns to offer the model.
    pub tools: Vec<String>,
    /// Directories searched for tool sources before the prompt's own.
    pub tool_path: Vec<PathBuf>,
    pub tool_timeout_secs: u64,

    /// Run safe tools without asking.
    pub safe_yes: bool,
    pub approval: ApprovalPolicy,

    pub cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Model requests per run; `0` means no limit.
    pub max_turns: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: String::new(),
            base_url: None,
            openai_api_key: None,
            anthropic_api_key: None,
            max_tokens: None,
            tools: Vec::new(),
            tool_path: Vec::new(),
            tool_timeout_secs: runtime::tools::DEFAULT_TIMEOUT.as_secs(),
            safe_yes: false,
            approval: ApprovalPolicy::default(),
            cache: false,
            cache_dir: None,
            max_turns: runtime::DEFAULT_MAX_TURNS,
        }
    }
}

impl Settings {
    pub fn backend(&self) -> BackendSettings {
        BackendSettings {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            openai_api_key: self.openai_api_key.clone(),
            anthropic_api_key: self.anthropic_api_key.clone(),
            max_tokens: self.max_tokens,
        }
    }

    /// `safe_yes` turns on auto-approval on top of the configured policy.
    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy {
            auto_approve_safe: self.approval.auto_approve_safe || self.safe_yes,
        }
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Configured directories first, then the prompt's directory, then the
    /// working directory.
    pub fn tool_search_path(&self, prompt_dir: &Path) -> Vec<PathBuf> {
        let mut paths = self.tool_path.clone();
        for dir in [prompt_dir.to_path_buf(), PathBuf::from(".")] {
            if !paths.contains(&dir) {
                paths.push(dir);
            }
        }
        paths
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("runprompt")))
            .ok_or_else(|| Error::Config("no cache directory; set cache_dir".into()))
    }
}

/// Command-line values; unset ones leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_path: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_yes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,
}

/// Finds and merges the configuration sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    home: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    cwd: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            home: dirs::home_dir(),
            config_dir: dirs::config_dir(),
            cwd: PathBuf::from("."),
        }
    }
}

impl ConfigLoader {
    /// Config files in merge order, whether or not they exist.
    pub fn config_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if let Some(home) = &self.home {
            files.push(home.join(CONFIG_DIR).join(CONFIG_FILE));
        }
        if let Some(config_dir) = &self.config_dir {
            files.push(config_dir.join("runprompt").join(CONFIG_FILE));
        }
        files.push(self.cwd.join(CONFIG_DIR).join(CONFIG_FILE));
        files
    }

    /// YAML config files sitting where TOML ones are looked for. They are
    /// never read.
    pub fn yaml_config_files(&self) -> Vec<PathBuf> {
        self.config_files()
            .iter()
            .filter_map(|file| file.parent())
            .flat_map(|dir| YAML_CONFIG_FILES.iter().map(move |name| dir.join(name)))
            .filter(|file| file.is_file())
            .collect()
    }

    pub fn figment(&self, front_matter: Option<&str>, overrides: &Overrides) -> Figment {
        for file in self.yaml_config_files() {
            warn!(
                path = %file.display(),
                "ignoring YAML config file; configuration is read from {CONFIG_FILE}"
            );
        }

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Env::raw().only(&["BASE_URL"]))
            .merge(Env::raw().only(&["OPENAI_BASE_URL"]).map(|_| "base_url".into()))
            .merge(Env::raw().only(&["OPENAI_API_KEY", "ANTHROPIC_API_KEY"]));

        for file in self.config_files() {
            if file.is_file() {
                figment = figment.merge(Toml::file(file));
            }
        }

        if let Some(front_matter) = front_matter {
            figment = figment.merge(Toml::string(front_matter));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["log", "cache", "tools", "tool_path"]))
            .merge(Serialized::defaults(list_env_overrides()))
            .merge(Serialized::defaults(overrides))
    }

    pub fn load(&self, front_matter: Option<&str>, overrides: &Overrides) -> Result<Settings> {
        Ok(self.figment(front_matter, overrides).extract()?)
    }
}

/// `RUNPROMPT_*` values whose text is not a config value: a truthy flag
/// and separator-delimited lists.
fn list_env_overrides() -> Overrides {
    let var = |name: &str| std::env::var(format!("{ENV_PREFIX}{name}")).ok();
    Overrides {
        cache: var("CACHE").map(|v| is_truthy(&v)),
        tools: var("TOOLS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        tool_path: var("TOOL_PATH")
            .map(|v| std::env::split_paths(&v).collect())
            .unwrap_or_default(),
        ..Overrides::default()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load(
        jail: &Jail,
        front_matter: Option<&str>,
        overrides: &Overrides,
    ) -> figment::error::Result<Settings> {
        let root = jail.directory().to_path_buf();
        let loader = ConfigLoader {
            home: Some(root.join("home")),
            config_dir: Some(root.join("xdg")),
            cwd: root.join("work"),
        };
        loader.figment(front_matter, overrides).extract()
    }

    #[test]
    fn defaults() {
        Jail::expect_with(|jail| {
            let settings = load(jail, None, &Overrides::default())?;
            assert_eq!(settings.model, "");
            assert_eq!(settings.max_turns, 32);
            assert_eq!(settings.tool_timeout_secs, 30);
            assert!(!settings.cache);
            assert!(!settings.approval_policy().auto_approve_safe);
            Ok(())
        });
    }

    #[test]
    fn later_files_override_earlier_ones() {
        Jail::expect_with(|jail| {
            jail.create_dir("home/.runprompt")?;
            jail.create_file(
                "home/.runprompt/config.toml",
                "model = \"openai/from-home\"\nopenai_api_key = \"key-from-config\"\n",
            )?;
            jail.create_dir("work/.runprompt")?;
            jail.create_file("work/.runprompt/config.toml", "model = \"openai/from-local\"\n")?;

            let settings = load(jail, None, &Overrides::default())?;
            assert_eq!(settings.model, "openai/from-local");
            assert_eq!(settings.openai_api_key.as_deref(), Some("key-from-config"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_front_matter_and_cli_overrides_env() {
        Jail::expect_with(|jail| {
            jail.create_dir("xdg/runprompt")?;
            jail.create_file(
                "xdg/runprompt/config.toml",
                "model = \"openai/gpt-4o-from-config\"\ntool_path = [\"/opt/tools\"]\n",
            )?;
            let front_matter = "model = \"openai/from-front-matter\"\ntools = [\"calculator\"]\nsystem = \"ignored here\"\n";

            let settings = load(jail, Some(front_matter), &Overrides::default())?;
            assert_eq!(settings.model, "openai/from-front-matter");
            assert_eq!(settings.tools, ["calculator"]);
            assert_eq!(settings.tool_path, [PathBuf::from("/opt/tools")]);

            jail.set_env("RUNPROMPT_MODEL", "openai/from-env");
            let settings = load(jail, Some(front_matter), &Overrides::default())?;
            assert_eq!(settings.model, "openai/from-env");

            let overrides = Overrides {
                model: Some("openai/from-cli".into()),
                ..Overrides::default()
            };
            let settings = load(jail, Some(front_matter), &overrides)?;
            assert_eq!(settings.model, "openai/from-cli");
            Ok(())
        });
    }

    #[test]
    fn standard_variables_are_fallbacks() {
        Jail::expect_with(|jail| {
            jail.set_env("OPENAI_BASE_URL", "http://127.0.0.1:18790");
            jail.set_env("OPENAI_API_KEY", "test-key");
            let settings = load(jail, None, &Overrides::default())?;
            assert_eq!(settings.base_url.as_deref(), Some("http://127.0.0.1:18790"));
            assert_eq!(settings.openai_api_key.as_deref(), Some("test-key"));

            jail.set_env("RUNPROMPT_OPENAI_API_KEY", "prefixed-key");
            let settings = load(jail, None, &Overrides::default())?;
            assert_eq!(settings.openai_api_key.as_deref(), Some("prefixed-key"));
            Ok(())
        });
    }

    #[test]
    fn cache_and_list_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("RUNPROMPT_CACHE", "1");
            jail.set_env("RUNPROMPT_CACHE_DIR", "/tmp/runprompt-cache");
            jail.set_env("RUNPROMPT_TOOLS", "calculator, sample_tools.*");
            let settings = load(jail, None, &Overrides::default())?;
            assert!(settings.cache);
            assert_eq!(settings.cache_dir, Some(PathBuf::from("/tmp/runprompt-cache")));
            assert_eq!(settings.tools, ["calculator", "sample_tools.*"]);
            Ok(())
        });
    }

    #[test]
    fn approval_table_and_safe_yes() {
        Jail::expect_with(|jail| {
            let overrides = Overrides {
                safe_yes: Some(true),
                ..Overrides::default()
            };
            assert!(load(jail, None, &overrides)?.approval_policy().auto_approve_safe);

            jail.create_dir("work/.runprompt")?;
            jail.create_file(
                "work/.runprompt/config.toml",
                "[approval]\nauto_approve_safe = true\n",
            )?;
            let settings = load(jail, None, &Overrides::default())?;
            assert!(settings.approval_policy().auto_approve_safe);

            jail.create_file(
                "work/.runprompt/config.toml",
                "[approval]\nallow = [\"add_numbers\"]\n",
            )?;
            assert!(load(jail, None, &Overrides::default()).is_err());
            Ok(())
        });
    }

    #[test]
    fn yaml_config_is_reported_not_read() {
        Jail::expect_with(|jail| {
            jail.create_dir("work/.runprompt")?;
            jail.create_file("work/.runprompt/config.yml", "model: openai/from-yaml\n")?;

            let root = jail.directory().to_path_buf();
            let loader = ConfigLoader {
                home: Some(root.join("home")),
                config_dir: Some(root.join("xdg")),
                cwd: root.join("work"),
            };
            assert_eq!(
                loader.yaml_config_files(),
                [root.join("work/.runprompt/config.yml")]
            );
            assert_eq!(load(jail, None, &Overrides::default())?.model, "");
            Ok(())
        });
    }

    #[test]
    fn search_path_order() {
        let settings = Settings {
            tool_path: vec![PathBuf::from("/opt/tools"), PathBuf::from(".")],
            ..Settings::default()
        };
        assert_eq!(
            settings.tool_search_path(Path::new("prompts")),
            [
                PathBuf::from("/opt/tools"),
                PathBuf::from("."),
                PathBuf::from("prompts")
            ]
        );
    }

    #[test]
    fn truthy_values() {
        for value in ["1", "true", "YES", " on "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["0", "false", "", "maybe"] {
            assert!(!is_truthy(value), "{value}");
        }
    }
}
