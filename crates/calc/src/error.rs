//! Evaluation error types.

use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
///
/// Every variant renders a message meant to be read by the model that
/// submitted the expression, so it can correct itself.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// The text is not a single well-formed expression.
    #[error("invalid syntax at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A string literal appeared anywhere in the expression.
    #[error("only numbers allowed (got a string literal)")]
    StringLiteral,

    /// A bare name that is not one of the known constants.
    #[error("name not allowed: {0}")]
    NameNotAllowed(String),

    /// A call to a function outside the whitelist.
    #[error("function not allowed: {0}")]
    FunctionNotAllowed(String),

    /// A call whose target is not a bare function name.
    #[error("only simple function calls are allowed")]
    NonSimpleCall,

    /// A syntactic construct the evaluator refuses.
    #[error("{0} not allowed")]
    NotAllowed(&'static str),

    /// An operator the evaluator refuses.
    #[error("operator not allowed: {0}")]
    OperatorNotAllowed(&'static str),

    /// Operand or argument of the wrong kind.
    #[error("{0}")]
    Type(String),

    /// Argument outside the domain of a function.
    #[error("{0}")]
    Domain(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,
}

impl EvalError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub(crate) fn domain() -> Self {
        Self::Domain("math domain error".into())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
