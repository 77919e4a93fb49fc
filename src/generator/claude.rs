//! `claude` CLI generator: prompt on stdin, reply on stdout.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::{Effort, TextGenerator};
use crate::config::GeneratorConfig;

pub struct ClaudeCliGenerator {
    claude_cmd: String,
    timeout: Duration,
}

impl ClaudeCliGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            claude_cmd: config.claude_cmd.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn command(&self, effort: Effort) -> Command {
        let mut cmd = Command::new(&self.claude_cmd);
        cmd.arg("--print");
        if effort == Effort::Low {
            cmd.args(["--model", "haiku"]);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl TextGenerator for ClaudeCliGenerator {
    async fn generate(&self, prompt: &str, effort: Effort) -> Result<String> {
        let mut child = self
            .command(effort)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", self.claude_cmd))?;

        let mut stdin = child.stdin.take().context("Failed to get stdin")?;
        let mut stdout = child.stdout.take().context("Failed to get stdout")?;
        let mut stderr = child.stderr.take().context("Failed to get stderr")?;

        // Feed stdin while draining the output pipes, all under the timeout
        let run = async {
            let write_prompt = async move {
                stdin
                    .write_all(prompt.as_bytes())
                    .await
                    .context("Failed to write prompt to stdin")?;
                stdin.shutdown().await.context("Failed to close stdin")?;
                drop(stdin);
                Ok::<_, anyhow::Error>(())
            };
            let mut output = String::new();
            let mut errors = String::new();
            let (written, read_out, read_err) = tokio::join!(
                write_prompt,
                stdout.read_to_string(&mut output),
                stderr.read_to_string(&mut errors)
            );
            written?;
            read_out.context("Failed to read stdout")?;
            read_err.context("Failed to read stderr")?;
            let status = child.wait().await.context("Failed to wait for process")?;
            Ok::<_, anyhow::Error>((status, output, errors))
        };

        let (status, output, errors) = tokio::time::timeout(self.timeout, run)
            .await
            .with_context(|| format!("'{}' timed out after {:?}", self.claude_cmd, self.timeout))??;

        if !status.success() {
            anyhow::bail!(
                "'{}' exited with code {}: {}",
                self.claude_cmd,
                status.code().unwrap_or(-1),
                errors.trim()
            );
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "claude-cli"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn generator(cmd: &str, timeout_secs: u64) -> ClaudeCliGenerator {
        ClaudeCliGenerator::new(&GeneratorConfig {
            claude_cmd: cmd.into(),
            request_timeout_secs: timeout_secs,
            ..GeneratorConfig::default()
        })
    }

    fn script(dir: &std::path::Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-claude.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_prompt_goes_through_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = script(dir.path(), "cat");
        let reply = generator(&cmd, 10)
            .generate("echo this back", Effort::Medium)
            .await
            .unwrap();
        assert_eq!(reply, "echo this back");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = script(dir.path(), "cat > /dev/null; echo boom >&2; exit 3");
        let err = generator(&cmd, 10)
            .generate("x", Effort::Medium)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exited with code 3"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    }

    #[tokio::test]
    async fn test_child_ignoring_stdin_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = script(dir.path(), "sleep 30");
        // Larger than a pipe buffer, so the write blocks until the child reads
        let prompt = "x".repeat(1 << 20);
        let started = std::time::Instant::now();
        let err = generator(&cmd, 1)
            .generate(&prompt, Effort::Medium)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let err = generator("/nonexistent/claude-binary", 10)
            .generate("x", Effort::Low)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to spawn"));
    }
}
