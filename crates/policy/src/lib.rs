//! Approval policy for model-requested tool calls.
//!
//! Core principle: **no tool runs without approval.** Approval comes from
//! the operator at a prompt, or silently for tools declared safe when the
//! operator opted into that.

mod error;
mod gate;
mod policy;
mod prompter;

pub use error::{Error, Result};
pub use gate::{ApprovalGate, ApprovalRequest};
pub use policy::{ApprovalPolicy, Decision};
pub use prompter::Prompter;
