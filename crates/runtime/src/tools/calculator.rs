//! The built-in `calculator` tool.

use super::schema::{Candidate, ParamDecl};
use super::{Tool, ToolError};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub const CALCULATOR: &str = "calculator";

/// Evaluates arithmetic in the `calc` sandbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    /// Declaration of the tool, documented like any other source.
    pub fn candidate() -> Candidate {
        let functions = calc::Function::names().collect::<Vec<_>>().join(", ");
        Candidate {
            name: CALCULATOR.to_string(),
            doc: Some(format!(
                "Evaluate a mathematical expression and return the result. \
                 Supports + - * / // % ** and parentheses, lists and tuples, \
                 the constants pi, e, tau, inf, nan, and the functions {functions}.\n\n\
                 No variables, strings or other Python syntax."
            )),
            params: vec![ParamDecl::new("expression", Some("str"))],
            safe: true,
        }
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let expression = arguments
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("'expression' must be a string".into()))?;

        calc::evaluate(expression)
            .map(|value| Value::String(value.to_string()))
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}
