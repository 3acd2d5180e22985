//! Output processing for serial console traffic.
//!
//! - ANSI escape code stripping for raw console text
//! - Recovery of a command's own output from the captured line buffer
//!
//! # Example
//!
//! ```
//! use serial_exec::output::{clean_output, OutputSanitizer};
//!
//! let line = OutputSanitizer::strip_line("\x1b[?2004hroot@box:~# ");
//! assert_eq!(line, "root@box:~# ");
//!
//! let captured = [
//!     "uname & wait",
//!     "[1] 301",
//!     "Linux",
//!     "[1]+  Done                    uname",
//! ];
//! assert_eq!(clean_output(&captured), "Linux");
//! ```

mod clean;
mod sanitizer;

pub use clean::{clean_output, clean_output_with, clean_text};
pub use sanitizer::OutputSanitizer;
