//! Command submission and completion detection.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::dialect::{parse_job_pid, ShellDialect, ShellReply};
use crate::error::SerialExecError;
use crate::output::clean_output_with;
use crate::stream::ShellStream;
use crate::Result;

/// Default hard deadline for one command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What woke the runner up.
enum Event {
    Line(Option<Result<String>>),
    Deadline,
}

/// Runs one command on an initialised console and recovers its output.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
    dialect: ShellDialect,
}

impl CommandRunner {
    /// Create a runner with the default deadline and bash job-control markers.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            dialect: ShellDialect::bash(),
        }
    }

    /// Set the wall-clock deadline measured from command submission.
    ///
    /// Every console line is kept in memory until the command completes or
    /// the deadline fires, so the deadline together with the baud rate bounds
    /// how much output a single run can buffer. Long deadlines on chatty
    /// commands trade memory for patience.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the shell dialect used to recognise completion.
    pub fn dialect(mut self, dialect: ShellDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Run `command` and close the stream, whatever the outcome.
    pub async fn run<S>(&self, mut stream: ShellStream<S>, command: &str) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let outcome = self.run_in_session(&mut stream, command).await;
        if let Err(e) = stream.close().await {
            warn!(error = %e, "failed to close console stream");
        }
        outcome
    }

    /// Run `command` and leave the stream open for further commands.
    ///
    /// The caller keeps ownership and must call
    /// [`SessionInitializer::ready`](super::SessionInitializer::ready) again
    /// if the console may have left the shell prompt in between.
    pub async fn run_in_session<S>(
        &self,
        stream: &mut ShellStream<S>,
        command: &str,
    ) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        stream.write_str(&self.dialect.wrap_command(command)).await?;
        info!(command, timeout_ms = self.timeout.as_millis() as u64, "command submitted");

        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let mut captured: Vec<String> = Vec::new();

        loop {
            let event = tokio::select! {
                biased;
                line = stream.next_line() => Event::Line(line),
                () = &mut deadline => Event::Deadline,
            };

            match event {
                Event::Line(Some(Ok(line))) => {
                    debug!(line = %line, "console line");
                    let reply = self.dialect.classify(&line);
                    captured.push(line);

                    match reply {
                        ShellReply::Partial => {}
                        ShellReply::Completion(0) => {
                            info!(lines = captured.len(), "command completed");
                            return Ok(self.clean(&captured));
                        }
                        ShellReply::Completion(code) => {
                            info!(exit_code = code, "command exited with failure");
                            return Err(SerialExecError::RemoteCommandFailed {
                                output: self.clean(&captured),
                                exit_code: Some(code),
                            });
                        }
                        ShellReply::Failure => {
                            info!("command job exited abnormally");
                            return Err(SerialExecError::RemoteCommandFailed {
                                output: self.clean(&captured),
                                exit_code: None,
                            });
                        }
                    }
                }
                Event::Line(Some(Err(e))) => return Err(e),
                Event::Line(None) => {
                    warn!(lines = captured.len(), "console stream ended before completion");
                    return Err(SerialExecError::StreamEnded {
                        partial_output: captured.join("\n"),
                    });
                }
                Event::Deadline => {
                    warn!(lines = captured.len(), "command timed out");
                    kill_runaway(stream, &captured).await;
                    return Err(SerialExecError::CommandTimeout {
                        partial_output: captured.join("\n"),
                    });
                }
            }
        }
    }

    fn clean(&self, captured: &[String]) -> String {
        clean_output_with(captured, self.dialect.done_marker())
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort kill of the backgrounded job; never awaits confirmation.
///
/// The job pid is on the second captured line, after the echoed command.
async fn kill_runaway<S>(stream: &mut ShellStream<S>, captured: &[String])
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let Some(job_line) = captured.get(1) else {
        debug!("no job line captured, skipping kill");
        return;
    };
    let Some(pid) = parse_job_pid(job_line) else {
        warn!(line = %job_line, "job line carries no pid, skipping kill");
        return;
    };

    warn!(pid, "killing runaway remote process");
    let kill = format!("kill -9 {}\r", pid);
    if let Err(e) = stream.write_str(&kill).await {
        warn!(pid, error = %e, "failed to send kill");
        return;
    }
    if let Err(e) = stream.write_str("\r").await {
        warn!(error = %e, "failed to redraw prompt after kill");
    }
}
