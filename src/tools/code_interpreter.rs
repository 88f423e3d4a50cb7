//! 代码解释器：LLM 生成自包含 Python 脚本，本地解释器执行并取 stdout
//!
//! 不做沙箱；仅施加超时，超时后子进程随句柄一起被杀掉。

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Command;

use crate::core::AgentError;
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::Message;

pub const NO_OUTPUT: &str = "[No output from code execution]";

const CODER_SYSTEM_PROMPT: &str = "You are a world-class Python programmer. The user will provide a prompt that requires a calculation or a programmatic solution.
Your task is to write a self-contained Python script that solves the user's prompt.
The script MUST print the final, single numerical answer to standard output.
Do not provide any explanation, commentary, or markdown formatting.
Only provide the raw Python code.";

/// 去掉 ```python / ``` 包裹
pub fn strip_code_fences(raw: &str) -> &str {
    let mut code = raw.trim();
    if let Some(rest) = code.strip_prefix("```python") {
        code = rest;
    } else if let Some(rest) = code.strip_prefix("```") {
        code = rest;
    }
    if let Some(rest) = code.strip_suffix("```") {
        code = rest;
    }
    code.trim()
}

pub struct CodeInterpreter {
    llm: Arc<dyn LlmClient>,
    interpreter: String,
    timeout: Duration,
}

impl CodeInterpreter {
    pub fn new(llm: Arc<dyn LlmClient>, interpreter: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            llm,
            interpreter: interpreter.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn solve(&self, prompt: &str) -> Result<String, AgentError> {
        let messages = vec![Message::system(CODER_SYSTEM_PROMPT), Message::user(prompt)];
        let generated = self
            .llm
            .complete(&messages, &CompletionOptions::deterministic())
            .await?;
        let code = strip_code_fences(&generated);
        tracing::debug!(lines = code.lines().count(), "generated script");
        self.execute(code).await
    }

    /// 执行脚本，返回去掉首尾空白的 stdout；为空时返回 NO_OUTPUT
    pub async fn execute(&self, code: &str) -> Result<String, AgentError> {
        let child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::Execution(format!("spawn {}: {}", self.interpreter, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AgentError::Execution(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| AgentError::Execution(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let last = stderr.trim().lines().last().unwrap_or("").to_string();
            return Err(AgentError::Execution(format!("exit {}: {}", output.status, last)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(NO_OUTPUT.to_string())
        } else {
            Ok(stdout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(strip_code_fences("```\nprint(2)\n```\n"), "print(2)");
        assert_eq!(strip_code_fences("print(3)"), "print(3)");
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_execution_error() {
        let llm = Arc::new(MockLlmClient::with_responses(["print(1)"]));
        let interp = CodeInterpreter::new(llm.clone(), "definitely-not-an-interpreter-xyz", 5);
        let err = interp.solve("what is 1?").await.unwrap_err();
        assert!(matches!(err, AgentError::Execution(_)));
        assert_eq!(llm.calls()[0].options.temperature, Some(0.0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_interpreter_output_is_trimmed() {
        let interp = CodeInterpreter::new(Arc::new(MockLlmClient::new()), "sh", 5);
        assert_eq!(interp.execute("echo '  385  '").await.unwrap(), "385");
        assert_eq!(interp.execute("true").await.unwrap(), NO_OUTPUT);
        assert!(interp.execute("exit 3").await.is_err());
    }
}
