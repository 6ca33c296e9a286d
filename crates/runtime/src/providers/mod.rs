//! LLM provider adapters.
//!
//! Each provider implements [`Backend`] for its specific API. Model names
//! carry a `provider/` prefix that selects the adapter.

mod anthropic;
mod cached;
mod openai;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
pub use cached::CachedBackend;
pub use openai::{OPENAI_BASE_URL, OpenAiBackend, OpenAiBackendBuilder};

use crate::model::{Backend, ModelError, ModelRequest, ModelResponse};
use std::fmt;

/// Everything needed to pick and build a backend.
#[derive(Debug, Clone, Default)]
pub struct BackendSettings {
    /// `provider/name`, or a bare name which means OpenAI.
    pub model: String,
    /// An OpenAI-compatible server; forces the OpenAI wire format.
    pub base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub max_tokens: Option<u32>,
}

/// Split `provider/name` into its parts.
pub fn split_model(model: &str) -> (Option<&str>, &str) {
    match model.split_once('/') {
        Some((provider, name)) if !provider.is_empty() => (Some(provider), name),
        _ => (None, model),
    }
}

/// A backend chosen at runtime.
pub enum AnyBackend {
    OpenAi(OpenAiBackend),
    Anthropic(AnthropicBackend),
}

impl AnyBackend {
    pub fn from_settings(settings: &BackendSettings) -> Result<Self, ModelError> {
        let (provider, name) = split_model(&settings.model);
        if name.is_empty() {
            return Err(ModelError::Config(
                "no model configured; set `model` in front matter or config, RUNPROMPT_MODEL, or --model".into(),
            ));
        }

        if let Some(base_url) = &settings.base_url {
            let mut builder = OpenAiBackend::builder(name).base_url(base_url);
            if let Some(key) = &settings.openai_api_key {
                builder = builder.api_key(key);
            }
            if let Some(max_tokens) = settings.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
            return Ok(Self::OpenAi(builder.build()));
        }

        match provider.unwrap_or("openai") {
            "openai" => {
                let key = settings.openai_api_key.as_ref().ok_or_else(|| {
                    ModelError::Config("OPENAI_API_KEY is not set".into())
                })?;
                let mut builder = OpenAiBackend::builder(name).api_key(key);
                if let Some(max_tokens) = settings.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                Ok(Self::OpenAi(builder.build()))
            }
            "anthropic" => {
                let key = settings.anthropic_api_key.as_ref().ok_or_else(|| {
                    ModelError::Config("ANTHROPIC_API_KEY is not set".into())
                })?;
                let mut builder = AnthropicBackend::builder(key, name);
                if let Some(max_tokens) = settings.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                Ok(Self::Anthropic(builder.build()))
            }
            other => Err(ModelError::Config(format!(
                "unknown provider '{other}' (expected openai or anthropic, or set a base URL)"
            ))),
        }
    }
}

impl fmt::Display for AnyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi(backend) => backend.fmt(f),
            Self::Anthropic(backend) => backend.fmt(f),
        }
    }
}

impl Backend for AnyBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        match self {
            Self::OpenAi(backend) => backend.call(request).await,
            Self::Anthropic(backend) => backend.call(request).await,
        }
    }
}
