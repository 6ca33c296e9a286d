//! runprompt runtime: model transport, tools, and the conversation loop.
//!
//! # Overview
//!
//! - **Backend**: a trait over chat-completion providers (OpenAI,
//!   Anthropic), optionally wrapped in a response cache.
//! - **ToolRegistry**: the tools a run may offer, resolved at startup from
//!   patterns such as `calculator` or `sample_tools.*`.
//! - **Conversation**: sends the prompt, answers tool calls through the
//!   approval gate, and returns the model's final text.
//!
//! # Example
//!
//! ```no_run
//! use policy::{ApprovalGate, ApprovalPolicy};
//! use runtime::{AnyBackend, BackendSettings, Conversation, ManifestLoader, Message, ToolRegistry};
//! use std::io;
//!
//! struct Stdin;
//!
//! impl policy::Prompter for Stdin {
//!     fn ask(&mut self, question: &str) -> io::Result<String> {
//!         eprint!("{question}");
//!         let mut answer = String::new();
//!         io::stdin().read_line(&mut answer)?;
//!         Ok(answer)
//!     }
//! }
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = AnyBackend::from_settings(&BackendSettings {
//!     model: "openai/gpt-4o".into(),
//!     openai_api_key: Some("sk-...".into()),
//!     ..Default::default()
//! })?;
//! let registry = ToolRegistry::resolve(&["calculator"], &[], &ManifestLoader::default())?;
//! let gate = ApprovalGate::new(ApprovalPolicy::default(), Stdin);
//!
//! let mut conversation = Conversation::new(backend, registry, gate);
//! let answer = conversation.run(vec![Message::user("What is 2 ** 10?")]).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

mod conversation;
mod error;
pub mod model;
pub mod providers;
pub mod tools;

pub use conversation::{Conversation, DECLINED, DEFAULT_MAX_TURNS};
pub use error::{Error, Result};
pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolOutcome,
    ToolResult, ToolSpec, Usage,
};
pub use providers::{
    AnthropicBackend, AnyBackend, BackendSettings, CachedBackend, OpenAiBackend, split_model,
};
pub use tools::{ManifestLoader, RegistryError, Tool, ToolError, ToolRegistry};
