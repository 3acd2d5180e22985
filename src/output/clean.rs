//! Recovery of a command's own output from captured console lines.

use crate::protocol::BASH_DONE_MARKER;

/// Lines of shell noise preceding real output: the echoed command and
/// the job-control line carrying the background pid.
const LEADING_NOISE_LINES: usize = 2;

/// Clean captured lines using the bash completion marker.
pub fn clean_output<S: AsRef<str>>(lines: &[S]) -> String {
    clean_output_with(lines, BASH_DONE_MARKER)
}

/// Clean captured lines, cutting at `done_marker`.
///
/// The first two lines are dropped unconditionally. The remainder is joined
/// with `\n` and everything from the first occurrence of the marker onwards
/// is removed: the marker is sometimes printed on the same line as the
/// command's last output, so it cannot be removed line by line.
pub fn clean_output_with<S: AsRef<str>>(lines: &[S], done_marker: &str) -> String {
    let joined = lines
        .iter()
        .skip(LEADING_NOISE_LINES)
        .map(|line| line.as_ref())
        .collect::<Vec<&str>>()
        .join("\n");
    strip_from_marker(&joined, done_marker)
}

/// Apply only the marker cut and trim to already-joined text.
///
/// `clean_text(&clean_output(lines)) == clean_output(lines)` for any input.
pub fn clean_text(text: &str) -> String {
    strip_from_marker(text, BASH_DONE_MARKER)
}

fn strip_from_marker(text: &str, marker: &str) -> String {
    let kept = match text.find(marker) {
        Some(idx) => &text[..idx],
        None => text,
    };
    kept.trim().to_string()
}
