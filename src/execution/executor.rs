//! One-shot command execution over a console stream.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use super::command::Command;
use crate::protocol::{
    CommandRunner, SessionInitializer, ShellDialect, DEFAULT_INIT_ATTEMPTS,
    DEFAULT_INIT_INTERVAL, DEFAULT_TIMEOUT,
};
use crate::stream::{serial, ShellStream, DEFAULT_MAX_LINE_LENGTH};
use crate::Result;

/// Tunables for login negotiation and command execution.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Deadline for commands that do not set their own.
    pub timeout: Duration,
    /// Polling attempts while waiting for a root prompt.
    pub init_attempts: u32,
    /// Delay between polling attempts.
    pub init_interval: Duration,
    /// Remove escape sequences from console text.
    pub strip_ansi: bool,
    /// Longest unterminated line buffered before it is emitted.
    pub max_line_length: usize,
    /// Job-control wording of the remote shell.
    pub dialect: ShellDialect,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            init_attempts: DEFAULT_INIT_ATTEMPTS,
            init_interval: DEFAULT_INIT_INTERVAL,
            strip_ansi: true,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            dialect: ShellDialect::bash(),
        }
    }
}

/// Logs in and runs a single command per stream.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    options: ExecutorOptions,
}

impl Executor {
    /// Create an executor with the given options.
    pub fn new(options: ExecutorOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Open the serial device and run `command` on it.
    pub async fn execute_serial(
        &self,
        path: &str,
        baud_rate: u32,
        command: &Command,
    ) -> Result<String> {
        command.validate()?;
        let port = serial::open(path, baud_rate)?;
        info!(path, baud_rate, "serial console opened");
        self.execute_on(port, command).await
    }

    /// Log in on `transport` and run `command`.
    ///
    /// The transport is closed before this returns, on every path.
    pub async fn execute_on<S>(&self, transport: S, command: &Command) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        command.validate()?;
        let mut stream = ShellStream::with_options(
            transport,
            self.options.strip_ansi,
            self.options.max_line_length,
        );

        let initializer = SessionInitializer::new()
            .attempts(self.options.init_attempts)
            .interval(self.options.init_interval);
        if let Err(e) = initializer.ready(&mut stream).await {
            if let Err(close_err) = stream.close().await {
                warn!(error = %close_err, "failed to close console stream");
            }
            return Err(e);
        }

        self.runner(command)
            .run(stream, &command.command_line)
            .await
    }

    /// Deadline applied to `command`.
    pub fn effective_timeout(&self, command: &Command) -> Duration {
        command.timeout.unwrap_or(self.options.timeout)
    }

    fn runner(&self, command: &Command) -> CommandRunner {
        CommandRunner::new()
            .timeout(self.effective_timeout(command))
            .dialect(self.options.dialect.clone())
    }
}

/// Run `command` on the serial console at `path`.
///
/// `timeout_ms` is a hard deadline measured from command submission; the
/// usual value is 10 000.
pub async fn execute(path: &str, baud_rate: u32, command: &str, timeout_ms: u64) -> Result<String> {
    let command = Command::new(command).timeout(Duration::from_millis(timeout_ms));
    Executor::default()
        .execute_serial(path, baud_rate, &command)
        .await
}
