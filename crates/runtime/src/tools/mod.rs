//! Tools the model may call: declaration, compilation, loading and lookup.

mod calculator;
mod command;
pub mod errors;
mod manifest;
mod registry;
pub mod schema;
mod r#trait;

pub use calculator::{CALCULATOR, CalculatorTool};
pub use command::{CommandTool, DEFAULT_TIMEOUT};
pub use errors::{RegistryError, ToolError};
pub use manifest::{ManifestLoader, SourceLoader, SourceTool};
pub use r#trait::Tool;
pub use registry::{BUILTIN_SOURCE, RegisteredTool, ToolPattern, ToolRegistry};
pub use schema::{
    Candidate, ParamDecl, Parameter, SemanticType, ToolDescriptor, bind_arguments, compile,
};
