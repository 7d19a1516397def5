//! Command sequence execution
//!
//! The whole sequence runs as one shell script under `set -e`, so shell
//! state (`cd`, `export`) carries from one command to the next and the
//! first failing command stops the script.
//!
//! The script is fed to `sh -s` on stdin so login passwords never appear in
//! the process argument list. The commands are wrapped in a `{ ...; }` group
//! reading from `/dev/null`; the shell parses the whole group before running
//! it, so no command can consume the rest of the script.

use crate::config::schema::ExecutorConfig;
use crate::docker::login::redact_password;
use crate::error::{DockyardError, DockyardResult};
use crate::orchestration::{build_error_output, stream_child_output, write_line};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs an ordered command sequence and reports overall success
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run `commands` in order, streaming combined output into `sink`.
    ///
    /// Returns `Ok(false)` when a command fails; `Err` only when the
    /// commands could not be run at all.
    async fn execute(
        &self,
        commands: &[String],
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> DockyardResult<bool>;
}

/// Executes command sequences through a POSIX shell
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    timeout: Option<Duration>,
}

impl ShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        let executor = Self::new(config.shell.clone());
        match config.timeout_secs {
            0 => executor,
            secs => executor.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Kill the script if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn script(commands: &[String]) -> String {
        let mut script = String::from("set -e\n{\n");
        for command in commands {
            script.push_str(command);
            script.push('\n');
        }
        script.push_str("} </dev/null\n");
        script
    }

    fn shell_command(&self) -> Command {
        let mut command = Command::new(&self.shell);
        command
            .arg("-s")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl ProcessExecutor for ShellExecutor {
    async fn execute(
        &self,
        commands: &[String],
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> DockyardResult<bool> {
        if commands.is_empty() {
            return Err(DockyardError::EmptySequence);
        }

        for command in commands {
            write_line(sink, &format!("» {}", redact_password(command))).await?;
        }

        debug!("Executing {} commands via {}", commands.len(), self.shell);

        let mut child = self
            .shell_command()
            .spawn()
            .map_err(|e| DockyardError::command_failed(format!("{} -s", self.shell), e))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DockyardError::Internal("child stdin was not piped".to_string()))?;
        let script = Self::script(commands);

        let run = async {
            let feed = async move {
                stdin.write_all(script.as_bytes()).await?;
                stdin.shutdown().await
            };
            let (fed, output) = tokio::join!(feed, stream_child_output(&mut child, sink));
            let output = output?;
            // A shell that exits early closes its stdin; its status reports why
            if let Err(e) = fed {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(DockyardError::io("feeding build script", e));
                }
            }
            let status = child
                .wait()
                .await
                .map_err(|e| DockyardError::io("waiting for build shell", e))?;
            Ok::<_, DockyardError>((status, output))
        };

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.ok(),
            None => Some(run.await),
        };

        let (status, output) = match outcome {
            Some(result) => result?,
            None => {
                let limit = self.timeout.unwrap_or_default();
                warn!("Build exceeded {:?}, killing shell", limit);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill build shell: {}", e);
                }
                return Err(DockyardError::BuildTimeout(limit.as_secs()));
            }
        };

        if status.success() {
            Ok(true)
        } else {
            warn!("Command sequence failed with {}", status);
            debug!("Build output tail:\n{}", build_error_output(&output));
            Ok(false)
        }
    }
}
