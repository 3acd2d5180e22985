//! Error types for serial-exec.

use thiserror::Error;

/// Main error type for serial-exec operations.
#[derive(Error, Debug)]
pub enum SerialExecError {
    /// The remote never presented a root prompt within the attempt budget.
    #[error("timed out waiting for the terminal to initialise after {attempts} attempts")]
    InitTimeout { attempts: u32 },

    /// No completion marker arrived before the deadline.
    #[error("command timed out")]
    CommandTimeout {
        /// Raw lines captured before the deadline, joined with newlines.
        partial_output: String,
    },

    /// The remote shell reported a non-zero exit or an abnormal job exit.
    #[error("remote command failed{}", exit_code_suffix(.exit_code))]
    RemoteCommandFailed {
        /// Cleaned command output.
        output: String,
        /// Exit code from `Done(n)`; `None` when the job reported `Exit`.
        exit_code: Option<i32>,
    },

    /// The transport reached end-of-stream before the exchange finished.
    #[error("serial stream ended unexpectedly")]
    StreamEnded { partial_output: String },

    /// I/O error on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command cannot be sent over the console as given.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Serial device could not be opened or configured.
    #[error("serial port error: {0}")]
    Serial(String),
}

fn exit_code_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl SerialExecError {
    /// Output captured alongside the failure, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandTimeout { partial_output } | Self::StreamEnded { partial_output } => {
                Some(partial_output)
            }
            Self::RemoteCommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Process exit status the CLI reports for this error.
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::RemoteCommandFailed {
                exit_code: Some(code),
                ..
            } if *code > 0 && *code < 256 => *code,
            Self::CommandTimeout { .. } => 124,
            Self::InitTimeout { .. } => 2,
            _ => 1,
        }
    }
}

impl From<tokio_serial::Error> for SerialExecError {
    fn from(e: tokio_serial::Error) -> Self {
        Self::Serial(e.to_string())
    }
}

/// Convenience Result type for serial-exec operations.
pub type Result<T> = std::result::Result<T, SerialExecError>;
