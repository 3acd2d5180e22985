//! # serial-exec
//!
//! Run a single shell command on a device whose only interface is a serial
//! console, and get back the command's output and exit status.
//!
//! The console gives no framing between one command's output and the next
//! prompt, so the command is submitted as `<command> & wait`. The shell's
//! job-control banner (`[1]+  Done`, `[1]+  Done(127)`, `[1]+  Exit`) then
//! marks completion and carries the exit code.
//!
//! ## Features
//!
//! - **Login handshake**: nudges an idle console and logs in as root when a
//!   login prompt appears
//! - **Completion detection**: line-by-line classification of console
//!   output racing a hard deadline
//! - **Runaway cleanup**: best-effort `kill -9` of the backgrounded job on
//!   timeout
//! - **Clean output**: echoed command, job pid line and job banner removed
//!
//! ## Quick Start
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> serial_exec::Result<()> {
//!     serial_exec::logging::try_init().ok();
//!
//!     let output =
//!         serial_exec::execute("/dev/ttyUSB0", 115_200, "cat /etc/os-release", 10_000).await?;
//!     println!("{}", output);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod output;
pub mod protocol;
pub mod stream;

// Re-export commonly used types
pub use error::{Result, SerialExecError};
pub use execution::{execute, Command, Executor, ExecutorOptions};
pub use output::{clean_output, OutputSanitizer};
pub use protocol::{CommandRunner, SessionInitializer, ShellDialect, ShellReply};
pub use stream::{ReadOutcome, ShellStream};
