//! One-byte-at-a-time reader over a caller-owned input window, plus the size-limit
//! accounting every bounded phase (header block, chunk header) is built on top of.
//!
//! The input window is a `Cursor<&[u8]>`, the same type the teacher crate threads through
//! its request/response state machines (`in_curr_data`): its position is exactly "what has
//! been consumed so far" and advancing it is how a caller sees how much of its buffer the
//! parser used.

use crate::error::{ParserError, Result};
use crate::util::trim_whitespace;
use std::io::{Cursor, Read};

/// The input window type threaded through every parser operation.
pub type Input<'a> = Cursor<&'a [u8]>;

/// Byte-at-a-time reader with a bounded accumulation buffer.
///
/// A `Tokenizer` never reads past the end of its current `Input`; [`Tokenizer::next`]
/// returns `Ok(0)` (the "no more bytes available right now" sentinel) rather than blocking
/// when the window is exhausted. Every delivered byte counts against the active size-limit
/// checkpoint installed by [`Tokenizer::reset_limit`]; exceeding it fails with
/// `BadRequest("size limit exceeded")`.
#[derive(Debug)]
pub struct Tokenizer {
    buf: Vec<u8>,
    limit: usize,
    consumed: usize,
}

impl Tokenizer {
    /// Builds a tokenizer whose accumulation buffer starts with room for `initial_capacity`
    /// bytes and whose first checkpoint allows `limit` bytes.
    pub fn new(initial_capacity: usize, limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(initial_capacity),
            limit,
            consumed: 0,
        }
    }

    /// Returns the next byte from `input`, or `0` if the window is exhausted.
    ///
    /// This is the single chokepoint for size-limit accounting: every byte actually
    /// delivered (the sentinel does not count) increments the checkpoint counter.
    pub fn next(&mut self, input: &mut Input<'_>) -> Result<u8> {
        let mut one = [0u8; 1];
        match input.read(&mut one) {
            Ok(1) => {
                self.consumed += 1;
                if self.consumed > self.limit {
                    return Err(ParserError::bad_request("size limit exceeded"));
                }
                Ok(one[0])
            }
            _ => Ok(0),
        }
    }

    /// Pushes a byte onto the accumulation buffer.
    pub fn put_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Returns the accumulation buffer, UTF-8-safe but ASCII-expected: invalid UTF-8 is
    /// replaced rather than rejected, since header bytes are not guaranteed to be valid
    /// UTF-8 and this parser does not treat that as fatal.
    pub fn get_string(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Returns the accumulation buffer trimmed of leading/trailing whitespace. Fails if the
    /// token is empty after trimming.
    pub fn get_trimmed_string(&self) -> Result<&[u8]> {
        let trimmed = trim_whitespace(&self.buf);
        if trimmed.is_empty() {
            return Err(ParserError::bad_request("empty token"));
        }
        Ok(trimmed)
    }

    /// Returns the raw accumulation buffer, untrimmed.
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Clears the accumulation buffer without touching the size-limit checkpoint.
    pub fn clear_buffer(&mut self) {
        self.buf.clear();
    }

    /// Current length of the accumulation buffer.
    pub fn buffer_position(&self) -> usize {
        self.buf.len()
    }

    /// Installs a new size-limit checkpoint, resetting the consumed-since-checkpoint
    /// counter to zero. Called before a new bounded phase begins (a header block, a single
    /// chunk header).
    pub fn reset_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.consumed = 0;
    }
}

/// Decoded protocol-version token, shared by request lines and status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
    /// `HTTPS/1.0` -- seen behind some TLS-terminating proxies that rewrite the scheme into
    /// the version token itself.
    Https10,
    /// `HTTPS/1.1`.
    Https11,
    /// No recognizable version token (HTTP/0.9 has none at all).
    Unknown,
}

impl HttpVersion {
    fn from_token(token: &[u8]) -> Self {
        match token {
            b"HTTP/1.0" => HttpVersion::Http10,
            b"HTTP/1.1" => HttpVersion::Http11,
            b"HTTPS/1.0" => HttpVersion::Https10,
            b"HTTPS/1.1" => HttpVersion::Https11,
            _ => HttpVersion::Unknown,
        }
    }
}

/// The three whitespace-delimited tokens of a request line or status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartLine {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
    pub third: Vec<u8>,
    pub version: HttpVersion,
}

/// Where [`StartLineParser`] is within the line. The first two fields are delimited by a
/// run of spaces/tabs; the third runs to the line terminator and may itself contain spaces
/// (a status line's reason phrase, e.g. `Not Found`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinePhase {
    First,
    SpaceAfterFirst,
    Second,
    SpaceAfterSecond,
    Third,
}

/// Resumable parser for one request line or status line.
///
/// Lives alongside a [`Tokenizer`] the same way the header parser's phase lives alongside
/// it: the phase and the completed-so-far tokens are this struct's state, the in-progress
/// token is the `Tokenizer`'s accumulation buffer. A partial call (the line isn't fully
/// buffered yet) leaves both untouched so the next call resumes exactly where this one left
/// off, satisfying the same incrementality property the header parser provides.
#[derive(Debug)]
pub struct StartLineParser {
    phase: LinePhase,
    first: Vec<u8>,
    second: Vec<u8>,
}

impl Default for StartLineParser {
    fn default() -> Self {
        Self {
            phase: LinePhase::First,
            first: Vec::new(),
            second: Vec::new(),
        }
    }
}

impl StartLineParser {
    /// Resets to the initial phase, discarding any in-progress tokens.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Consumes bytes from `input` until a full request-line or status-line (`first second
    /// third<LF>`) has been seen, or the input is exhausted. Returns `Ok(None)` in the
    /// latter case; the caller resumes by calling again with more input.
    ///
    /// `log_hook` receives `LogCode::BareLfLineEnding` (via [`crate::log::log_bare_lf`]) when
    /// the line ended in a bare `\n` rather than `\r\n`, the same leniency the header parser
    /// reports for header lines.
    pub fn parse(
        &mut self,
        tok: &mut Tokenizer,
        input: &mut Input<'_>,
        log_hook: &mut Option<crate::log::LogHook>,
    ) -> Result<Option<StartLine>> {
        loop {
            let b = tok.next(input)?;
            if b == 0 {
                return Ok(None);
            }
            match self.phase {
                LinePhase::First => {
                    if b == b' ' || b == b'\t' {
                        self.first = tok.buffer().to_vec();
                        tok.clear_buffer();
                        self.phase = LinePhase::SpaceAfterFirst;
                    } else {
                        tok.put_byte(b);
                    }
                }
                LinePhase::SpaceAfterFirst => {
                    if b != b' ' && b != b'\t' {
                        tok.put_byte(b);
                        self.phase = LinePhase::Second;
                    }
                }
                LinePhase::Second => {
                    if b == b' ' || b == b'\t' {
                        self.second = tok.buffer().to_vec();
                        tok.clear_buffer();
                        self.phase = LinePhase::SpaceAfterSecond;
                    } else {
                        tok.put_byte(b);
                    }
                }
                LinePhase::SpaceAfterSecond => {
                    if b != b' ' && b != b'\t' {
                        tok.put_byte(b);
                        self.phase = LinePhase::Third;
                    }
                }
                LinePhase::Third => {
                    if b == b'\n' {
                        let mut third = tok.buffer().to_vec();
                        tok.clear_buffer();
                        let had_cr = third.last() == Some(&b'\r');
                        if had_cr {
                            third.pop();
                        }
                        crate::log::log_bare_lf(log_hook, had_cr);
                        let version = HttpVersion::from_token(&third)
                            .or_unknown_from(&self.first);
                        let line = StartLine {
                            first: std::mem::take(&mut self.first),
                            second: std::mem::take(&mut self.second),
                            third,
                            version,
                        };
                        self.phase = LinePhase::First;
                        return Ok(Some(line));
                    }
                    tok.put_byte(b);
                }
            }
        }
    }
}

impl HttpVersion {
    fn or_unknown_from(self, alt_token: &[u8]) -> Self {
        if self != HttpVersion::Unknown {
            self
        } else {
            HttpVersion::from_token(alt_token)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cur(s: &[u8]) -> Input<'_> {
        Cursor::new(s)
    }

    #[test]
    fn next_yields_bytes_then_sentinel() {
        let mut tok = Tokenizer::new(16, 1024);
        let mut input = cur(b"ab");
        assert_eq!(tok.next(&mut input).unwrap(), b'a');
        assert_eq!(tok.next(&mut input).unwrap(), b'b');
        assert_eq!(tok.next(&mut input).unwrap(), 0);
    }

    #[test]
    fn size_limit_enforced() {
        let mut tok = Tokenizer::new(16, 2);
        let mut input = cur(b"abc");
        tok.next(&mut input).unwrap();
        tok.next(&mut input).unwrap();
        assert!(matches!(
            tok.next(&mut input),
            Err(ParserError::BadRequest(_))
        ));
    }

    #[test]
    fn trimmed_string_rejects_all_whitespace() {
        let mut tok = Tokenizer::new(16, 1024);
        for b in b"   " {
            tok.put_byte(*b);
        }
        assert!(tok.get_trimmed_string().is_err());
    }

    #[test]
    fn request_line_tokenizes() {
        let mut tok = Tokenizer::new(64, 1024);
        let mut sl = StartLineParser::default();
        let mut log_hook = None;
        let mut input = cur(b"GET /index.html HTTP/1.1\n");
        let line = sl.parse(&mut tok, &mut input, &mut log_hook).unwrap().unwrap();
        assert_eq!(line.first, b"GET");
        assert_eq!(line.second, b"/index.html");
        assert_eq!(line.third, b"HTTP/1.1");
        assert_eq!(line.version, HttpVersion::Http11);
    }

    #[test]
    fn status_line_tokenizes() {
        let mut tok = Tokenizer::new(64, 1024);
        let mut sl = StartLineParser::default();
        let mut log_hook = None;
        let mut input = cur(b"HTTP/1.1 200 OK\n");
        let line = sl.parse(&mut tok, &mut input, &mut log_hook).unwrap().unwrap();
        assert_eq!(line.first, b"HTTP/1.1");
        assert_eq!(line.second, b"200");
        assert_eq!(line.third, b"OK");
        assert_eq!(line.version, HttpVersion::Http11);
    }

    #[test]
    fn status_line_with_multi_word_reason() {
        let mut tok = Tokenizer::new(64, 1024);
        let mut sl = StartLineParser::default();
        let mut log_hook = None;
        let mut input = cur(b"HTTP/1.1 404 Not Found\n");
        let line = sl.parse(&mut tok, &mut input, &mut log_hook).unwrap().unwrap();
        assert_eq!(line.second, b"404");
        assert_eq!(line.third, b"Not Found");
    }

    #[test]
    fn incomplete_start_line_asks_for_more_then_resumes() {
        let mut tok = Tokenizer::new(64, 1024);
        let mut sl = StartLineParser::default();
        let mut log_hook = None;
        let mut input = cur(b"GET /index.html HTTP/1.1");
        assert!(sl.parse(&mut tok, &mut input, &mut log_hook).unwrap().is_none());
        let mut rest = cur(b"\n");
        let line = sl.parse(&mut tok, &mut rest, &mut log_hook).unwrap().unwrap();
        assert_eq!(line.first, b"GET");
        assert_eq!(line.third, b"HTTP/1.1");
    }

    #[test]
    fn bare_lf_line_ending_is_logged() {
        let mut tok = Tokenizer::new(64, 1024);
        let mut sl = StartLineParser::default();
        let mut seen = Vec::new();
        let mut log_hook: Option<crate::log::LogHook> =
            Some(Box::new(|rec| seen.push(rec.code)));
        let mut input = cur(b"GET / HTTP/1.1\n");
        sl.parse(&mut tok, &mut input, &mut log_hook).unwrap();
        drop(log_hook);
        assert_eq!(seen, vec![crate::log::LogCode::BareLfLineEnding]);
    }

    #[test]
    fn crlf_line_ending_is_not_logged() {
        let mut tok = Tokenizer::new(64, 1024);
        let mut sl = StartLineParser::default();
        let mut seen = Vec::new();
        let mut log_hook: Option<crate::log::LogHook> =
            Some(Box::new(|rec| seen.push(rec.code)));
        let mut input = cur(b"GET / HTTP/1.1\r\n");
        sl.parse(&mut tok, &mut input, &mut log_hook).unwrap();
        drop(log_hook);
        assert!(seen.is_empty());
    }
}
