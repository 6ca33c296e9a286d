//! Tool handler trait.

use crate::tools::ToolError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Something that can be invoked on behalf of the model.
///
/// Handlers receive arguments already bound against the tool's descriptor:
/// every required parameter present, defaults filled, no unknown keys.
/// This is the boundary between the conversation loop and side effects.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}
