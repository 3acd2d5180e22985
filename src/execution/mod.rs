//! Public entry point: log in over a console and run one command.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> serial_exec::Result<()> {
//! let output = serial_exec::execute("/dev/ttyUSB0", 115_200, "cat /etc/hostname", 10_000).await?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

mod command;
mod executor;

pub use command::Command;
pub use executor::{execute, Executor, ExecutorOptions};
