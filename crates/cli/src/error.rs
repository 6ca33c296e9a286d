//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors. Each one ends the run with `Error: <message>` and exit
/// code 1.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The prompt file could not be read.
    #[error("failed to read prompt file {path}: {source}")]
    PromptFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The prompt file's front matter is malformed.
    #[error("invalid front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(String),

    /// A configuration source failed to parse.
    #[error("config error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The backend could not be built.
    #[error(transparent)]
    Model(#[from] runtime::ModelError),

    /// A requested tool could not be resolved.
    #[error(transparent)]
    Registry(#[from] runtime::RegistryError),

    /// An error occurred in the response cache.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for Error {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
