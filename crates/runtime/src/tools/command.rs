//! Tools backed by an external command.

use super::{Tool, ToolError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a command per call.
///
/// The bound arguments are written to stdin as one JSON object. Stdout is
/// the result: parsed as JSON when it is JSON, otherwise the trimmed text.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: PathBuf,
    args: Vec<String>,
    dir: PathBuf,
    timeout: Duration,
}

impl CommandTool {
    /// `command[0]` is the program; a relative path containing a separator
    /// is resolved against `dir`, which is also the working directory.
    pub fn new(command: &[String], dir: impl Into<PathBuf>, timeout: Duration) -> Option<Self> {
        let (program, args) = command.split_first()?;
        let dir = dir.into();
        let program = Path::new(program);
        let program = if program.is_relative() && program.components().count() > 1 {
            dir.join(program)
        } else {
            program.to_path_buf()
        };
        Some(Self {
            program,
            args: args.to_vec(),
            dir,
            timeout,
        })
    }

    async fn run(&self, input: Vec<u8>) -> Result<std::process::Output, ToolError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ToolError::Execution(format!("failed to start {}: {e}", self.program.display()))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A command may exit without reading its input.
            if let Err(e) = stdin.write_all(&input).await {
                debug!(program = %self.program.display(), error = %e, "stdin not consumed");
            }
        }

        child
            .wait_with_output()
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}

#[async_trait]
impl Tool for CommandTool {
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let input = serde_json::to_vec(&Value::Object(arguments))
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        debug!(program = %self.program.display(), dir = %self.dir.display(), "running command tool");
        let output = tokio::time::timeout(self.timeout, self.run(input))
            .await
            .map_err(|_| ToolError::Timeout(self.timeout.as_millis() as u64))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ToolError::Execution(if stderr.is_empty() {
                format!("command exited with {}", output.status)
            } else {
                stderr
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = stdout.trim();
        Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn sh(script: &str, timeout: Duration) -> CommandTool {
        let command = ["sh".to_string(), "-c".to_string(), script.to_string()];
        CommandTool::new(&command, std::env::temp_dir(), timeout).unwrap()
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandTool::new(&[], "/tmp", DEFAULT_TIMEOUT).is_none());
    }

    #[test]
    fn relative_program_resolves_against_dir() {
        let command = ["./add.sh".to_string()];
        let tool = CommandTool::new(&command, "/opt/tools", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(tool.program, PathBuf::from("/opt/tools/./add.sh"));

        let command = ["python3".to_string()];
        let tool = CommandTool::new(&command, "/opt/tools", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(tool.program, PathBuf::from("python3"));
    }

    #[tokio::test]
    async fn arguments_arrive_on_stdin() {
        let tool = sh("cat", DEFAULT_TIMEOUT);
        let args = json!({"a": 2, "b": 3}).as_object().unwrap().clone();
        assert_eq!(tool.invoke(args).await.unwrap(), json!({"a": 2, "b": 3}));
    }

    #[tokio::test]
    async fn non_json_output_is_text() {
        let tool = sh("echo 'Hello, World!'", DEFAULT_TIMEOUT);
        assert_eq!(tool.invoke(Map::new()).await.unwrap(), json!("Hello, World!"));
    }

    #[tokio::test]
    async fn failure_carries_stderr() {
        let tool = sh("echo boom >&2; exit 3", DEFAULT_TIMEOUT);
        assert_eq!(
            tool.invoke(Map::new()).await.unwrap_err(),
            ToolError::Execution("boom".into())
        );
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let tool = sh("sleep 5", Duration::from_millis(100));
        assert_eq!(
            tool.invoke(Map::new()).await.unwrap_err(),
            ToolError::Timeout(100)
        );
    }
}
