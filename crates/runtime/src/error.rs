use crate::model::ModelError;
use crate::tools::RegistryError;
use thiserror::Error;

/// Failures that end a run.
///
/// Problems with individual tool calls are not here: they become tool
/// results and the conversation continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Approval(#[from] policy::Error),

    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error("no final answer after {0} model requests")]
    TurnLimit(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
