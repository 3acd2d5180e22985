//! Login handshake over an unframed console.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::error::SerialExecError;
use crate::stream::{ReadOutcome, ShellStream};
use crate::Result;

/// Default number of polling attempts.
pub const DEFAULT_INIT_ATTEMPTS: u32 = 10;

/// Default spacing between polling attempts.
pub const DEFAULT_INIT_INTERVAL: Duration = Duration::from_secs(1);

const LOGIN_PROMPT: &str = "login";
const ROOT_PROMPT: &str = "root@";
const LOGIN_USER: &str = "root\r";
const NUDGE: &str = "\r";

/// Brings a console from an unknown state to an interactive root shell.
///
/// Only passwordless root logins are handled.
#[derive(Debug, Clone)]
pub struct SessionInitializer {
    attempts: u32,
    interval: Duration,
}

impl SessionInitializer {
    /// Create an initializer with the default budget of ten one-second polls.
    pub fn new() -> Self {
        Self {
            attempts: DEFAULT_INIT_ATTEMPTS,
            interval: DEFAULT_INIT_INTERVAL,
        }
    }

    /// Set the number of polling attempts.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set the delay between polling attempts.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Drive the console until a root prompt is seen.
    ///
    /// Everything read here is discarded. Fails with
    /// [`SerialExecError::InitTimeout`] once the attempt budget is spent, or
    /// earlier if the transport itself fails.
    pub async fn ready<S>(&self, stream: &mut ShellStream<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        // Some consoles hold back output until they see a keypress
        stream.write_str(NUDGE).await?;

        for attempt in 1..=self.attempts {
            match stream.poll_available().await? {
                ReadOutcome::Data(text) if text.contains(LOGIN_PROMPT) => {
                    debug!(attempt, "login prompt seen, logging in as root");
                    stream.write_str(LOGIN_USER).await?;
                }
                ReadOutcome::Data(text) if text.contains(ROOT_PROMPT) => {
                    info!(attempt, "root shell ready");
                    return Ok(());
                }
                ReadOutcome::Data(_) | ReadOutcome::NoData => {
                    debug!(attempt, "no prompt yet, nudging console");
                    stream.write_str(NUDGE).await?;
                }
            }
            tokio::time::sleep(self.interval).await;
        }

        warn!(attempts = self.attempts, "console never reached a root prompt");
        Err(SerialExecError::InitTimeout {
            attempts: self.attempts,
        })
    }
}

impl Default for SessionInitializer {
    fn default() -> Self {
        Self::new()
    }
}
