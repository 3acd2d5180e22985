//! Shell job-control markers and the line classifier.

use std::sync::OnceLock;

use regex::Regex;

/// Job-control banner printed when the backgrounded job exits cleanly.
pub const BASH_DONE_MARKER: &str = "[1]+  Done";

/// Job-control banner printed when the backgrounded job exits abnormally.
pub const BASH_EXIT_MARKER: &str = "[1]+  Exit";

/// Suffix that backgrounds the command and waits on it.
pub const BASH_WAIT_SUFFIX: &str = "& wait";

/// Where bash puts a non-zero exit code on the completion line.
pub const BASH_EXIT_CODE_PATTERN: &str = r"Done\((\d+)\)";

/// Classification of a single console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellReply {
    /// The job finished; carries the reported exit code.
    Completion(i32),
    /// The job exited abnormally.
    Failure,
    /// Anything else: echo, job pid, command output, prompts.
    Partial,
}

/// The strings a shell prints around a backgrounded job.
///
/// All marker matching goes through [`ShellDialect::classify`], so another
/// shell's job-control wording only needs a new dialect value.
#[derive(Debug, Clone)]
pub struct ShellDialect {
    wait_suffix: String,
    done_marker: String,
    exit_marker: String,
    exit_code: Regex,
}

impl ShellDialect {
    /// Bash and busybox ash job-control output.
    pub fn bash() -> Self {
        Self {
            wait_suffix: BASH_WAIT_SUFFIX.to_string(),
            done_marker: BASH_DONE_MARKER.to_string(),
            exit_marker: BASH_EXIT_MARKER.to_string(),
            exit_code: bash_exit_code_regex().clone(),
        }
    }

    /// Build a dialect from its suffix and marker strings.
    ///
    /// The exit code is read from `<done_marker>(<digits>)` on the completion
    /// line; use [`ShellDialect::exit_code_pattern`] when the shell reports it
    /// some other way.
    pub fn new(
        wait_suffix: impl Into<String>,
        done_marker: impl Into<String>,
        exit_marker: impl Into<String>,
    ) -> Self {
        let done_marker = done_marker.into();
        let pattern = format!(r"{}\((\d+)\)", regex::escape(&done_marker));
        Self {
            wait_suffix: wait_suffix.into(),
            exit_code: Regex::new(&pattern).expect("escaped marker is a valid pattern"),
            done_marker,
            exit_marker: exit_marker.into(),
        }
    }

    /// Replace the exit code pattern. Its first capture group must hold the digits.
    pub fn exit_code_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.exit_code = Regex::new(pattern)?;
        Ok(self)
    }

    /// The completion marker.
    pub fn done_marker(&self) -> &str {
        &self.done_marker
    }

    /// The error marker.
    pub fn exit_marker(&self) -> &str {
        &self.exit_marker
    }

    /// Compose the line written to the console for `command`.
    pub fn wrap_command(&self, command: &str) -> String {
        format!("{} {} \r", command, self.wait_suffix)
    }

    /// Classify one console line.
    pub fn classify(&self, line: &str) -> ShellReply {
        if line.contains(&self.done_marker) {
            ShellReply::Completion(self.parse_exit_code(line))
        } else if line.contains(&self.exit_marker) {
            ShellReply::Failure
        } else {
            ShellReply::Partial
        }
    }

    /// Exit code from a completion line; `0` when none is given.
    pub fn parse_exit_code(&self, line: &str) -> i32 {
        match self.exit_code.captures(line).and_then(|caps| caps.get(1)) {
            // Too many digits for an i32 is still a failure, never success
            Some(digits) => digits.as_str().parse().unwrap_or(i32::MAX),
            None => 0,
        }
    }
}

impl Default for ShellDialect {
    fn default() -> Self {
        Self::bash()
    }
}

fn bash_exit_code_regex() -> &'static Regex {
    static EXIT_CODE: OnceLock<Regex> = OnceLock::new();
    EXIT_CODE.get_or_init(|| Regex::new(BASH_EXIT_CODE_PATTERN).expect("exit code pattern is valid"))
}

/// Exit code from a bash completion line; `0` when none is given.
pub fn parse_exit_code(line: &str) -> i32 {
    ShellDialect::bash().parse_exit_code(line)
}

/// Background pid from the job-control line, e.g. `[1] 5678`.
///
/// Returns `None` unless the second whitespace-separated token is a number.
pub fn parse_job_pid(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
