//! ANSI escape stripping for serial console text.

use vte::{Params, Parser, Perform};

/// Output sanitizer using VTE parser.
pub struct OutputSanitizer;

impl OutputSanitizer {
    /// Strip ANSI escape codes from raw bytes.
    ///
    /// Newlines and tabs survive; carriage returns survive too so that
    /// callers splitting on `\r\n` still see the pair.
    pub fn strip_ansi(input: &[u8]) -> String {
        let mut extractor = PlainTextExtractor::new(true);
        Parser::new().advance(&mut extractor, input);
        extractor.into_string()
    }

    /// Strip escape codes and carriage returns from a single console line.
    ///
    /// Serial shells redraw their prompt with bare `\r`, which must not
    /// leak into matched or returned text.
    pub fn strip_line(input: &str) -> String {
        let mut extractor = PlainTextExtractor::new(false);
        Parser::new().advance(&mut extractor, input.as_bytes());
        extractor.into_string()
    }
}

/// VTE performer that keeps printable text only.
struct PlainTextExtractor {
    output: Vec<u8>,
    keep_carriage_return: bool,
}

impl PlainTextExtractor {
    fn new(keep_carriage_return: bool) -> Self {
        Self {
            output: Vec::new(),
            keep_carriage_return,
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Perform for PlainTextExtractor {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.output
            .extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x0A | 0x09 => self.output.push(byte),
            0x0D if self.keep_carriage_return => self.output.push(byte),
            // BEL, backspace and friends
            _ => {}
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, _action: char) {}

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}

    fn osc_dispatch(&mut self, _params: &[&[u8]], _bell_terminated: bool) {}

    fn csi_dispatch(
        &mut self,
        _params: &Params,
        _intermediates: &[u8],
        _ignore: bool,
        _action: char,
    ) {
    }

    fn esc_dispatch(&mut self, _intermediates: &[u8], _ignore: bool, _byte: u8) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(OutputSanitizer::strip_ansi(b"hello world"), "hello world");
    }

    #[test]
    fn test_colored_prompt() {
        let input = b"\x1b[01;32mroot@box\x1b[00m:\x1b[01;34m~\x1b[00m# ";
        assert_eq!(OutputSanitizer::strip_ansi(input), "root@box:~# ");
    }

    #[test]
    fn test_bracketed_paste_toggle() {
        let input = "\x1b[?2004hroot@box:~# \x1b[?2004l";
        assert_eq!(OutputSanitizer::strip_line(input), "root@box:~# ");
    }

    #[test]
    fn test_login_banner_keeps_line_breaks() {
        let input = b"\r\nDebian GNU/Linux 12 box ttyS0\r\n\r\nbox login: ";
        let output = OutputSanitizer::strip_ansi(input);
        assert_eq!(output, "\r\nDebian GNU/Linux 12 box ttyS0\r\n\r\nbox login: ");
    }

    #[test]
    fn test_strip_line_drops_carriage_returns() {
        let input = "file1.txt\r";
        assert_eq!(OutputSanitizer::strip_line(input), "file1.txt");
    }

    #[test]
    fn test_osc_title() {
        let input = "\x1b]0;root@box: ~\x07root@box:~# ";
        assert_eq!(OutputSanitizer::strip_line(input), "root@box:~# ");
    }

    #[test]
    fn test_preserve_tabs() {
        assert_eq!(OutputSanitizer::strip_line("col1\tcol2"), "col1\tcol2");
    }

    #[test]
    fn test_job_banner_untouched() {
        let input = "[1]+  Done(127)               catg /etc/hostname";
        assert_eq!(OutputSanitizer::strip_line(input), input);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(OutputSanitizer::strip_ansi(b""), "");
        assert_eq!(OutputSanitizer::strip_line(""), "");
    }
}
