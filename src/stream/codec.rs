//! Line splitting for raw console bytes.

use std::io;

use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::output::OutputSanitizer;

/// Default cap on an unterminated line before it is emitted anyway.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Splits console bytes into text lines on `\n`.
///
/// A trailing `\r` is dropped, invalid UTF-8 is replaced rather than
/// rejected, and escape sequences are optionally removed. A line that grows
/// past `max_line_length` without a newline is emitted as-is so a chatty
/// console cannot grow the buffer without bound; the cut never falls inside
/// a multibyte character.
#[derive(Debug, Clone)]
pub struct LineCodec {
    strip_ansi: bool,
    max_line_length: usize,
    next_index: usize,
}

impl LineCodec {
    /// Create a codec that strips escape sequences.
    pub fn new() -> Self {
        Self {
            strip_ansi: true,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            next_index: 0,
        }
    }

    /// Set whether escape sequences are removed from each line.
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Set the maximum length of an unterminated line.
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max.max(1);
        self
    }

    /// Whether escape sequences are removed.
    pub fn strips_ansi(&self) -> bool {
        self.strip_ansi
    }

    fn finish(&self, bytes: &[u8]) -> String {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        let text = String::from_utf8_lossy(bytes);
        if self.strip_ansi {
            OutputSanitizer::strip_line(&text)
        } else {
            text.into_owned()
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let search_from = self.next_index.min(buf.len());
        if let Some(offset) = buf[search_from..].iter().position(|b| *b == b'\n') {
            let newline = search_from + offset;
            self.next_index = 0;
            let line = buf.split_to(newline + 1);
            return Ok(Some(self.finish(&line[..newline])));
        }

        if buf.len() >= self.max_line_length {
            self.next_index = 0;
            let cut = char_boundary(&buf[..]);
            let line = buf.split_to(cut);
            return Ok(Some(self.finish(&line)));
        }

        self.next_index = buf.len();
        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        let line = buf.split_to(buf.len());
        Ok(Some(self.finish(&line)))
    }
}

/// Length of `bytes` without a trailing incomplete UTF-8 sequence.
///
/// Falls back to the full length when nothing precedes that sequence.
fn char_boundary(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let idx = len - back;
        let width = match bytes[idx] {
            b if b & 0xC0 == 0x80 => continue,
            b if b & 0xE0 == 0xC0 => 2,
            b if b & 0xF0 == 0xE0 => 3,
            b if b & 0xF8 == 0xF0 => 4,
            _ => return len,
        };
        return if back < width && idx > 0 { idx } else { len };
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut LineCodec, input: &[u8]) -> Vec<String> {
        let mut buf = BytesMut::from(input);
        let mut lines = Vec::new();
        while let Some(line) = codec.decode(&mut buf).unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_splits_crlf_lines() {
        let mut codec = LineCodec::new();
        let lines = decode_all(&mut codec, b"ls -la & wait\r\n[1] 1234\r\nfile1.txt\r\n");
        assert_eq!(lines, vec!["ls -la & wait", "[1] 1234", "file1.txt"]);
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"file1"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b".txt\r\nfile2");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("file1.txt"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"file2");
    }

    #[test]
    fn test_eof_flushes_remainder() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"root@box:~# "[..]);
        assert_eq!(
            codec.decode_eof(&mut buf).unwrap().as_deref(),
            Some("root@box:~# ")
        );
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_strips_escape_sequences() {
        let mut codec = LineCodec::new();
        let lines = decode_all(&mut codec, b"\x1b[?2004l\r\x1b[0;32mok\x1b[0m\r\n");
        assert_eq!(lines, vec!["ok"]);
    }

    #[test]
    fn test_keeps_escape_sequences_when_disabled() {
        let mut codec = LineCodec::new().strip_ansi(false);
        let lines = decode_all(&mut codec, b"\x1b[0;32mok\x1b[0m\r\n");
        assert_eq!(lines, vec!["\x1b[0;32mok\x1b[0m"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut codec = LineCodec::new();
        let lines = decode_all(&mut codec, b"ab\xffcd\n");
        assert_eq!(lines, vec!["ab\u{FFFD}cd"]);
    }

    #[test]
    fn test_overlong_line_is_emitted() {
        let mut codec = LineCodec::new().max_line_length(4);
        let lines = decode_all(&mut codec, b"abcdef");
        assert_eq!(lines, vec!["abcdef"]);
    }

    #[test]
    fn test_overlong_line_keeps_multibyte_chars_whole() {
        let mut codec = LineCodec::new().max_line_length(4);
        let mut buf = BytesMut::from(&b"abc\xc3"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("abc"));
        assert_eq!(&buf[..], b"\xc3");
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\xa9!\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("\u{e9}!"));
    }

    #[test]
    fn test_char_boundary() {
        assert_eq!(char_boundary(b"abc"), 3);
        assert_eq!(char_boundary("ab\u{e9}".as_bytes()), 4);
        assert_eq!(char_boundary(b"ab\xe2\x82"), 2);
        assert_eq!(char_boundary(b"ab\xf0\x9f\x98"), 2);
        assert_eq!(char_boundary(b"\xe2\x82"), 2);
        assert_eq!(char_boundary(b"ab\x80"), 3);
    }
}
