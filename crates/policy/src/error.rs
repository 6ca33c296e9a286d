//! Approval error types.

use thiserror::Error;

/// Approval errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operator could not be asked, e.g. the terminal went away.
    #[error("failed to ask for approval: {0}")]
    Prompt(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
