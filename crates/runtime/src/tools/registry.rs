//! Startup resolution of tool patterns into the set offered to the model.

use super::calculator::{CALCULATOR, CalculatorTool};
use super::manifest::{SourceLoader, SourceTool};
use super::schema::{ToolDescriptor, compile};
use super::{RegistryError, Tool, ToolError};
use crate::model::ToolSpec;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Source name of the tools that ship with the binary.
pub const BUILTIN_SOURCE: &str = "builtin";

/// A parsed `--tools` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolPattern {
    /// The built-in calculator.
    Builtin,
    /// Every documented callable of a source.
    All { source: String },
    /// One callable of a source.
    One { source: String, name: String },
}

impl ToolPattern {
    pub fn parse(pattern: &str) -> Result<Self, RegistryError> {
        let pattern = pattern.trim();
        let invalid = || RegistryError::InvalidPattern(pattern.to_string());

        if pattern == CALCULATOR {
            return Ok(Self::Builtin);
        }

        let (source, name) = pattern.rsplit_once('.').ok_or_else(invalid)?;
        if source.is_empty() || source.split('.').any(str::is_empty) || name.is_empty() {
            return Err(invalid());
        }

        match (source, name) {
            (BUILTIN_SOURCE, "*" | CALCULATOR) => Ok(Self::Builtin),
            (BUILTIN_SOURCE, other) => Err(RegistryError::CallableNotFound {
                source_name: BUILTIN_SOURCE.to_string(),
                name: other.to_string(),
            }),
            (_, "*") => Ok(Self::All {
                source: source.to_string(),
            }),
            _ if is_identifier(name) => Ok(Self::One {
                source: source.to_string(),
                name: name.to_string(),
            }),
            _ => Err(invalid()),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// A tool ready to be offered and invoked.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn Tool>,
    /// Declared defaults, used when binding arguments.
    pub defaults: Map<String, Value>,
    /// Source the tool came from.
    pub source: String,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("descriptor", &self.descriptor)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Tools available for one run, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every pattern against the search path.
    ///
    /// The first directory that contains a source wins. Any failure is
    /// fatal, so a run never starts with a partial tool set.
    pub fn resolve<P: AsRef<str>>(
        patterns: &[P],
        search_paths: &[PathBuf],
        loader: &impl SourceLoader,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let mut loaded: HashMap<String, Vec<SourceTool>> = HashMap::new();

        for pattern in patterns {
            match ToolPattern::parse(pattern.as_ref())? {
                ToolPattern::Builtin => {
                    registry.register(BUILTIN_SOURCE, Self::calculator())?;
                }
                ToolPattern::All { source } => {
                    let tools = Self::load(&mut loaded, &source, search_paths, loader)?.to_vec();
                    for tool in tools {
                        registry.register(&source, tool)?;
                    }
                }
                ToolPattern::One { source, name } => {
                    let tool = Self::load(&mut loaded, &source, search_paths, loader)?
                        .iter()
                        .find(|t| t.candidate.name == name)
                        .cloned()
                        .ok_or_else(|| RegistryError::CallableNotFound {
                            source_name: source.clone(),
                            name: name.clone(),
                        })?;
                    registry.register(&source, tool)?;
                }
            }
        }

        debug!(tools = registry.len(), "resolved tools");
        Ok(registry)
    }

    fn calculator() -> SourceTool {
        SourceTool {
            candidate: CalculatorTool::candidate(),
            handler: Arc::new(CalculatorTool),
        }
    }

    fn load<'a>(
        loaded: &'a mut HashMap<String, Vec<SourceTool>>,
        source: &str,
        search_paths: &[PathBuf],
        loader: &impl SourceLoader,
    ) -> Result<&'a [SourceTool], RegistryError> {
        if !loaded.contains_key(source) {
            let mut found = None;
            for dir in search_paths {
                if let Some(tools) = loader.load(dir, source)? {
                    found = Some(tools);
                    break;
                }
            }
            let tools = found.ok_or_else(|| RegistryError::SourceNotFound {
                source_name: source.to_string(),
                searched: search_paths.to_vec(),
            })?;
            loaded.insert(source.to_string(), tools);
        }
        Ok(loaded.get(source).map(Vec::as_slice).unwrap_or_default())
    }

    /// Add one tool. Returns `false` when it was skipped: undocumented,
    /// shadowing the built-in calculator, or the very callable already
    /// registered. A different callable under a taken name is an error,
    /// even from the same source.
    pub fn register(&mut self, source: &str, tool: SourceTool) -> Result<bool, RegistryError> {
        let Some(descriptor) = compile(&tool.candidate) else {
            debug!(tool = %tool.candidate.name, source, "skipping undocumented callable");
            return Ok(false);
        };

        if descriptor.name == CALCULATOR && source != BUILTIN_SOURCE {
            warn!(source, "skipping external tool named calculator; the name is reserved");
            return Ok(false);
        }

        if let Some(existing) = self.find(&descriptor.name) {
            let same_callable = existing.source == source
                && (source == BUILTIN_SOURCE || Arc::ptr_eq(&existing.handler, &tool.handler));
            if same_callable {
                return Ok(false);
            }
            return Err(RegistryError::DuplicateTool {
                name: descriptor.name,
                first: existing.source.clone(),
                second: source.to_string(),
            });
        }

        debug!(tool = %descriptor.name, source, safe = descriptor.safe, "registered tool");
        self.tools.push(RegisteredTool {
            defaults: tool.candidate.defaults(),
            descriptor,
            handler: tool.handler,
            source: source.to_string(),
        });
        Ok(true)
    }

    fn find(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.descriptor.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&RegisteredTool, ToolError> {
        self.find(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Specs for the model, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.descriptor.spec()).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.descriptor.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
