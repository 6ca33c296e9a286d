//! Approval policy configuration and decisions.

use crate::ApprovalRequest;
use serde::{Deserialize, Serialize};

/// Approval policy, usually deserialized from the `[approval]` table of a
/// config file.
///
/// The only way around the prompt is a tool its source marked safe, and
/// only once the operator opted in. Tools without the mark always ask.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalPolicy {
    /// Run tools declared safe without asking.
    #[serde(default)]
    pub auto_approve_safe: bool,
}

/// Outcome of checking a request against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The operator has to decide.
    Ask,
}

impl ApprovalPolicy {
    /// Policy that auto-approves safe tools and asks for everything else.
    pub fn safe_yes() -> Self {
        Self {
            auto_approve_safe: true,
        }
    }

    /// Check a tool call request.
    pub fn check(&self, request: &ApprovalRequest) -> Decision {
        if request.safe && self.auto_approve_safe {
            Decision::Allow
        } else {
            Decision::Ask
        }
    }
}
