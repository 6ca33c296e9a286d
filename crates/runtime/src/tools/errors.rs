use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// These never abort a conversation: the orchestrator turns them into the
/// text of an error result for the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("timeout after {0}ms")]
    Timeout(u64),
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Errors raised while resolving tool patterns at startup. All are fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("invalid tool pattern '{0}': expected 'source.name', 'source.*' or 'calculator'")]
    InvalidPattern(String),

    #[error("tool source '{source_name}' not found in search path {}", display_paths(.searched))]
    SourceNotFound {
        source_name: String,
        searched: Vec<PathBuf>,
    },

    #[error("tool '{name}' not found in source '{source_name}'")]
    CallableNotFound { source_name: String, name: String },

    #[error("duplicate tool name '{name}' from sources '{first}' and '{second}'")]
    DuplicateTool {
        name: String,
        first: String,
        second: String,
    },

    #[error("failed to load tool source {path}: {message}")]
    Manifest { path: PathBuf, message: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    let joined = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}
