//! Command representation.

use std::time::Duration;

use crate::error::SerialExecError;
use crate::Result;

/// A command to run on the remote console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The command line, exactly as typed at the remote prompt.
    pub command_line: String,
    /// Deadline override; the executor default applies when unset.
    pub timeout: Option<Duration>,
}

impl Command {
    /// Create a new command with the given command line.
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            timeout: None,
        }
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Check that the command can be sent as a single console line.
    ///
    /// A line break would submit the text early and desynchronise the echo
    /// and job lines the output cleaner relies on.
    pub fn validate(&self) -> Result<()> {
        if self.command_line.trim().is_empty() {
            return Err(SerialExecError::InvalidCommand("command is empty".into()));
        }
        if self.command_line.contains(['\r', '\n']) {
            return Err(SerialExecError::InvalidCommand(
                "command must be a single line".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new() {
        let cmd = Command::new("ls -la");
        assert_eq!(cmd.command_line, "ls -la");
        assert!(cmd.timeout.is_none());
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_command_timeout() {
        let cmd = Command::new("dmesg").timeout(Duration::from_secs(30));
        assert_eq!(cmd.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            Command::new("   ").validate(),
            Err(SerialExecError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_multiline_command_rejected() {
        assert!(Command::new("echo a\necho b").validate().is_err());
        assert!(Command::new("echo a\r").validate().is_err());
    }
}
