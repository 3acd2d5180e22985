//! Command-line interface for serial-exec.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Serial device path.
    pub device: Option<String>,
    /// Baud rate.
    pub baud_rate: Option<u32>,
    /// Command deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Keep escape sequences in console text.
    pub no_strip_ansi: bool,
    /// Remote command, words joined with single spaces.
    pub command: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// Everything from the first positional word onwards belongs to the remote
/// command, so options meant for it need no `--` separator.
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);
    let mut words: Vec<String> = Vec::new();

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('d') | Long("device") => {
                result.device = Some(parser.value()?.parse()?);
            }
            Short('b') | Long("baud") => {
                let value: String = parser.value()?.parse()?;
                result.baud_rate = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("baud", value))?,
                );
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout_ms = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("timeout", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("no-strip-ansi") => {
                result.no_strip_ansi = true;
            }
            Value(val) => {
                words.push(val.string()?);
                for rest in parser.raw_args()? {
                    words.push(rest.string()?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if !words.is_empty() {
        result.command = Some(words.join(" "));
    }

    Ok(result)
}

impl Args {
    /// The remote command, or an error when none was given.
    pub fn require_command(&self) -> Result<&str, ArgsError> {
        self.command.as_deref().ok_or(ArgsError::MissingCommand)
    }
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"serial-exec {version}
Run a shell command on a device behind a serial console

USAGE:
    serial-exec [OPTIONS] <COMMAND>...

OPTIONS:
    -d, --device <PATH>     Serial device, e.g. /dev/ttyUSB0
    -b, --baud <RATE>       Baud rate [default: 115200]
    -t, --timeout <MS>      Command deadline in milliseconds [default: 10000]
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --no-strip-ansi     Keep escape sequences in output
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SERIAL_EXEC_DEVICE      Serial device (overrides config)
    SERIAL_EXEC_BAUD        Baud rate (overrides config)
    SERIAL_EXEC_TIMEOUT_MS  Command deadline (overrides config)
    SERIAL_EXEC_LOG_LEVEL   Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXIT STATUS:
    0                       Command completed with exit code 0
    1-255                   Remote exit code, or 1 for other failures
    2                       No root prompt appeared
    124                     Command timed out

EXAMPLES:
    serial-exec -d /dev/ttyUSB0 cat /etc/hostname
    serial-exec -d /dev/ttyS0 -b 9600 -t 60000 opkg update
    serial-exec -c /etc/serial-exec.json uname -a
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("serial-exec {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// No remote command was given.
    MissingCommand,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::MissingCommand => write!(f, "no command given"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
