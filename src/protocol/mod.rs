//! Terminal automation protocol for a shell behind a serial console.
//!
//! - [`SessionInitializer`] negotiates an unauthenticated root login
//! - [`CommandRunner`] submits one command as `<command> & wait` and waits
//!   for the shell's job-control banner to report completion
//! - [`ShellDialect`] owns every marker string and the line classifier
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use serial_exec::protocol::{CommandRunner, SessionInitializer};
//! use serial_exec::stream::{serial, ShellStream};
//!
//! # async fn demo() -> serial_exec::Result<()> {
//! let port = serial::open("/dev/ttyUSB0", 115_200)?;
//! let mut stream = ShellStream::new(port);
//!
//! SessionInitializer::new().ready(&mut stream).await?;
//! let output = CommandRunner::new()
//!     .timeout(Duration::from_secs(5))
//!     .run(stream, "cat /etc/hostname")
//!     .await?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

mod dialect;
mod init;
mod runner;

pub use dialect::{
    parse_exit_code, parse_job_pid, ShellDialect, ShellReply, BASH_DONE_MARKER,
    BASH_EXIT_CODE_PATTERN, BASH_EXIT_MARKER, BASH_WAIT_SUFFIX,
};
pub use init::{SessionInitializer, DEFAULT_INIT_ATTEMPTS, DEFAULT_INIT_INTERVAL};
pub use runner::{CommandRunner, DEFAULT_TIMEOUT};
