//! Duplex byte stream to the remote console.
//!
//! [`ShellStream`] wraps any async byte channel: a serial port in
//! production, an in-memory `tokio::io::duplex` pipe in tests. It offers
//! the two read styles the protocol needs. Raw polling is used while
//! negotiating the login, where prompts are not newline-terminated, and
//! line-at-a-time reading is used while a command runs.

mod codec;
pub mod serial;

pub use codec::{LineCodec, DEFAULT_MAX_LINE_LENGTH};

use std::io;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, trace};

use crate::error::SerialExecError;
use crate::output::OutputSanitizer;
use crate::Result;

/// How long a poll waits for the console before reporting no data.
const POLL_WINDOW: Duration = Duration::from_millis(50);

/// Upper bound on bytes collected by a single poll.
const MAX_POLL_BYTES: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

/// Result of polling the console for whatever is currently available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Text received since the previous poll.
    Data(String),
    /// Nothing arrived within the poll window.
    NoData,
}

/// An open console stream, owned by exactly one component at a time.
///
/// Closing consumes the stream, so it can be closed at most once.
pub struct ShellStream<S> {
    framed: FramedRead<S, LineCodec>,
    strip_ansi: bool,
}

impl<S> ShellStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a transport with the default line codec.
    pub fn new(inner: S) -> Self {
        Self::with_codec(inner, LineCodec::new())
    }

    /// Wrap a transport, choosing whether escape sequences are stripped.
    pub fn with_options(inner: S, strip_ansi: bool, max_line_length: usize) -> Self {
        Self::with_codec(
            inner,
            LineCodec::new()
                .strip_ansi(strip_ansi)
                .max_line_length(max_line_length),
        )
    }

    fn with_codec(inner: S, codec: LineCodec) -> Self {
        let strip_ansi = codec.strips_ansi();
        Self {
            framed: FramedRead::new(inner, codec),
            strip_ansi,
        }
    }

    /// Write `data` and flush it to the console.
    pub async fn write_str(&mut self, data: &str) -> Result<()> {
        trace!(data = ?data, "console write");
        let writer = self.framed.get_mut();
        writer.write_all(data.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Collect whatever the console has sent since the last read.
    ///
    /// A quiet console, or a transient error such as `WouldBlock`, is
    /// [`ReadOutcome::NoData`]. End of stream and any other I/O failure are
    /// returned as errors so the caller can abort early.
    pub async fn poll_available(&mut self) -> Result<ReadOutcome> {
        let mut data = self.framed.read_buffer_mut().split().to_vec();
        let mut buf = [0u8; READ_CHUNK];

        while data.len() < MAX_POLL_BYTES {
            match tokio::time::timeout(POLL_WINDOW, self.framed.get_mut().read(&mut buf)).await {
                Err(_) => break,
                Ok(Ok(0)) if data.is_empty() => {
                    return Err(SerialExecError::StreamEnded {
                        partial_output: String::new(),
                    });
                }
                // Report what arrived; the next poll sees the end of stream
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => data.extend_from_slice(&buf[..n]),
                Ok(Err(e)) if is_transient(&e) => {
                    debug!(error = %e, "transient read error while polling");
                    break;
                }
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        if data.is_empty() {
            return Ok(ReadOutcome::NoData);
        }

        let text = if self.strip_ansi {
            OutputSanitizer::strip_ansi(&data)
        } else {
            String::from_utf8_lossy(&data).into_owned()
        };
        trace!(text = ?text, "console poll");
        Ok(ReadOutcome::Data(text))
    }

    /// Next console line in arrival order; `None` once the stream has ended.
    pub async fn next_line(&mut self) -> Option<Result<String>> {
        self.framed
            .next()
            .await
            .map(|line| line.map_err(SerialExecError::from))
    }

    /// Shut down the write side and release the transport.
    pub async fn close(self) -> Result<()> {
        let mut inner = self.framed.into_inner();
        inner.shutdown().await?;
        debug!("console stream closed");
        Ok(())
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}
