//! Per-call approval.

use crate::{ApprovalPolicy, Decision, Prompter, Result};
use serde_json::Value;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// A tool call awaiting approval.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub tool: String,
    pub safe: bool,
    pub arguments: Value,
}

impl ApprovalRequest {
    pub fn new(tool: impl Into<String>, safe: bool, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            safe,
            arguments,
        }
    }
}

/// Decides whether each model-requested call is executed.
pub struct ApprovalGate {
    policy: ApprovalPolicy,
    prompter: Box<dyn Prompter>,
}

impl ApprovalGate {
    pub fn new(policy: ApprovalPolicy, prompter: impl Prompter + 'static) -> Self {
        Self {
            policy,
            prompter: Box::new(prompter),
        }
    }

    /// Returns `true` when the call should run.
    ///
    /// Blocks on the prompter when the policy leaves the decision to the
    /// operator. Only `y` or `yes` (any case) approves.
    pub fn should_execute(&mut self, request: &ApprovalRequest) -> Result<bool> {
        match self.policy.check(request) {
            Decision::Allow => {
                debug!(tool = %request.tool, "approved by policy");
                Ok(true)
            }
            Decision::Ask => {
                let answer = self.prompter.ask(&question(request))?;
                let approved = is_yes(&answer);
                if !approved {
                    warn!(tool = %request.tool, "tool call declined");
                }
                Ok(approved)
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn question(request: &ApprovalRequest) -> String {
    let mut text = format!("Tool: {}\n", request.tool);
    match &request.arguments {
        Value::Object(arguments) => {
            for (name, value) in arguments {
                let _ = writeln!(text, "  {name}: {}", display(value));
            }
        }
        other => {
            let _ = writeln!(text, "  {other}");
        }
    }
    text.push_str("Run this tool? [y/N] ");
    text
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Scripted {
        answers: Arc<Mutex<Vec<String>>>,
        questions: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn answering(answers: &[&str]) -> Self {
            let scripted = Self::default();
            *scripted.answers.lock().unwrap() = answers.iter().rev().map(|a| a.to_string()).collect();
            scripted
        }
    }

    impl Prompter for Scripted {
        fn ask(&mut self, question: &str) -> io::Result<String> {
            self.questions.lock().unwrap().push(question.to_string());
            Ok(self.answers.lock().unwrap().pop().unwrap_or_default())
        }
    }

    fn add_numbers() -> ApprovalRequest {
        ApprovalRequest::new("add_numbers", false, json!({"a": 2, "b": 3}))
    }

    #[test]
    fn only_yes_approves() {
        for (answer, expected) in [
            ("y", true),
            ("yes", true),
            (" YES \n", true),
            ("Y", true),
            ("n", false),
            ("", false),
            ("yep", false),
            ("no", false),
        ] {
            let mut gate = ApprovalGate::new(ApprovalPolicy::default(), Scripted::answering(&[answer]));
            assert_eq!(
                gate.should_execute(&add_numbers()).unwrap(),
                expected,
                "answer {answer:?}"
            );
        }
    }

    #[test]
    fn prompt_shows_tool_and_arguments() {
        let prompter = Scripted::answering(&["y"]);
        let mut gate = ApprovalGate::new(ApprovalPolicy::default(), prompter.clone());
        gate.should_execute(&add_numbers()).unwrap();

        let questions = prompter.questions.lock().unwrap();
        assert_eq!(questions.len(), 1);
        assert!(questions[0].starts_with("Tool: add_numbers\n"));
        assert!(questions[0].contains("  a: 2\n"));
        assert!(questions[0].ends_with("Run this tool? [y/N] "));
    }

    #[test]
    fn safe_tool_with_safe_yes_skips_the_prompt() {
        let prompter = Scripted::default();
        let mut gate = ApprovalGate::new(ApprovalPolicy::safe_yes(), prompter.clone());
        let greet = ApprovalRequest::new("greet", true, json!({"name": "World"}));

        assert!(gate.should_execute(&greet).unwrap());
        assert!(prompter.questions.lock().unwrap().is_empty());
    }

    #[test]
    fn safe_yes_still_prompts_for_unsafe_tools() {
        let prompter = Scripted::answering(&["n"]);
        let mut gate = ApprovalGate::new(ApprovalPolicy::safe_yes(), prompter.clone());

        assert!(!gate.should_execute(&add_numbers()).unwrap());
        assert_eq!(prompter.questions.lock().unwrap().len(), 1);
    }

    #[test]
    fn safe_tool_without_safe_yes_still_prompts() {
        let prompter = Scripted::answering(&["y"]);
        let mut gate = ApprovalGate::new(ApprovalPolicy::default(), prompter.clone());
        let calc = ApprovalRequest::new("calculator", true, json!({"expression": "1+1"}));

        assert!(gate.should_execute(&calc).unwrap());
        assert_eq!(prompter.questions.lock().unwrap().len(), 1);
    }

    #[test]
    fn unmarked_tool_prompts_under_every_policy() {
        for policy in [ApprovalPolicy::default(), ApprovalPolicy::safe_yes()] {
            let prompter = Scripted::answering(&["n"]);
            let mut gate = ApprovalGate::new(policy, prompter.clone());

            assert!(!gate.should_execute(&add_numbers()).unwrap());
            assert_eq!(prompter.questions.lock().unwrap().len(), 1);
        }
    }
}
