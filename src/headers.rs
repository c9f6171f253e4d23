//! The header block state machine (spec.md 4.2).
//!
//! Consumes name/value pairs one line at a time, emits them to a [`ParserSink`], and
//! detects the two framing headers (`Content-Length`, `Transfer-Encoding`). Reinvoked, with
//! `in_trailers` set, to consume the trailer headers of a chunked message -- trailers must
//! not influence framing, so framing detection is skipped in that mode.

use crate::error::{ParserError, Result};
use crate::log::{log_bare_lf, LogCode, LogSeverity, ParserLogRecord};
use crate::parsers::parse_content_length;
use crate::tokenizer::{Input, Tokenizer};
use crate::util::{eq_ignore_ascii_case, is_space_or_tab, is_token_char, trim_whitespace};

/// Where the header parser is within the current header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPhase {
    Start,
    InName,
    HeaderSpace,
    InValue,
    End,
}

/// How the end of the message body will be determined. Set once, by the header parser (or
/// by the body framer's resolution of `Unknown`), and fixed for the rest of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// Not yet determined; fixed once the header block ends.
    Unknown,
    /// No body (`Content-Length: 0`, or `Unknown` resolved bodyless).
    None,
    /// `Content-Length` body.
    Length,
    /// `Transfer-Encoding: chunked` body.
    Chunked,
    /// Reserved for a future self-delimiting framing (see spec.md 9); never produced by this
    /// implementation, which resolves undetermined framing as bodyless instead.
    SelfDefining,
    /// Body runs until the transport signals EOF; the framer does not detect EOF itself.
    EofTerminated,
}

/// Caller-supplied callbacks receiving parsed headers.
pub trait ParserSink {
    /// Invoked for each header, including trailers. Returning `true` yields control back to
    /// the caller; `parse_headers` returns `Ok(true)` and resumes at `InName` next call.
    fn header_complete(&mut self, name: &[u8], value: &[u8]) -> bool;

    /// Invoked once, when framing is still `Unknown` at the end of the header block.
    /// Returning `false` shuts the message down with no body.
    fn may_have_body(&mut self) -> bool;
}

/// Parses one header block (or, in trailer mode, one trailer block).
#[derive(Debug)]
pub struct HeaderParser {
    phase: HeaderPhase,
    pending_name: Vec<u8>,
    in_trailers: bool,
    seen_transfer_encoding: bool,
    seen_content_length: bool,
    content_length: u64,
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self {
            phase: HeaderPhase::Start,
            pending_name: Vec::new(),
            in_trailers: false,
            seen_transfer_encoding: false,
            seen_content_length: false,
            content_length: 0,
        }
    }
}

impl HeaderParser {
    /// Resets to the initial phase for a brand new header block (request/response headers).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Resets to the initial phase for the trailer block of a chunked message. Framing
    /// headers are ignored while `in_trailers` is set.
    pub fn reset_for_trailers(&mut self) {
        self.phase = HeaderPhase::Start;
        self.pending_name.clear();
        self.in_trailers = true;
        // seen_transfer_encoding/seen_content_length deliberately retained: a trailer named
        // Content-Length must still not flip framing, but we don't want a false "repeated
        // header" anomaly against the trailer either, so the framing-detection call is
        // simply skipped entirely below while in_trailers is set.
    }

    /// `true` once the header phase has reached `End` (terminal for this message).
    pub fn is_end(&self) -> bool {
        self.phase == HeaderPhase::End
    }

    /// The declared `Content-Length`, valid only once framing has been detected as `Length`.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Consumes the header block. Returns `Ok(true)` when it is fully consumed or the sink
    /// asked for control back; `Ok(false)` when more input is needed.
    pub fn parse_headers(
        &mut self,
        tok: &mut Tokenizer,
        input: &mut Input<'_>,
        sink: &mut dyn ParserSink,
        framing: &mut BodyFraming,
        header_size_limit: usize,
        log_hook: &mut Option<crate::log::LogHook>,
    ) -> Result<bool> {
        if self.phase == HeaderPhase::End {
            return Err(ParserError::invalid_state(
                "parse_headers invoked after header block ended",
            ));
        }
        loop {
            match self.phase {
                HeaderPhase::End => unreachable!(),
                HeaderPhase::Start => {
                    tok.reset_limit(header_size_limit);
                    tok.clear_buffer();
                    self.phase = HeaderPhase::InName;
                }
                HeaderPhase::InName => {
                    let b = tok.next(input)?;
                    if b == 0 {
                        return Ok(false);
                    }
                    if b == b':' {
                        self.pending_name = tok.buffer().to_vec();
                        tok.clear_buffer();
                        self.phase = HeaderPhase::HeaderSpace;
                    } else if b == b'\n' {
                        let mut name = tok.buffer().to_vec();
                        let had_cr = name.last() == Some(&b'\r');
                        if had_cr {
                            name.pop();
                        }
                        tok.clear_buffer();
                        log_bare_lf(log_hook, had_cr);
                        if name.is_empty() {
                            if !self.in_trailers && *framing == BodyFraming::Unknown && !sink.may_have_body()
                            {
                                *framing = BodyFraming::None;
                            }
                            self.phase = HeaderPhase::End;
                            return Ok(true);
                        }
                        // A line with no colon: emit it as (name, "").
                        let _ = sink.header_complete(&name, b"");
                        self.phase = HeaderPhase::InName;
                    } else if is_token_char(b) {
                        tok.put_byte(b);
                    } else {
                        return Err(ParserError::bad_request(
                            "header name contains a byte illegal in an HTTP token",
                        ));
                    }
                }
                HeaderPhase::HeaderSpace => {
                    let b = tok.next(input)?;
                    if b == 0 {
                        return Ok(false);
                    }
                    if is_space_or_tab(b) {
                        continue;
                    } else if b == b'\n' {
                        return Err(ParserError::bad_request(format!(
                            "missing value for header {}",
                            String::from_utf8_lossy(&self.pending_name)
                        )));
                    } else {
                        tok.put_byte(b);
                        self.phase = HeaderPhase::InValue;
                    }
                }
                HeaderPhase::InValue => {
                    let b = tok.next(input)?;
                    if b == 0 {
                        return Ok(false);
                    }
                    if b != b'\n' {
                        tok.put_byte(b);
                        continue;
                    }
                    let raw = tok.buffer().to_vec();
                    tok.clear_buffer();
                    log_bare_lf(log_hook, raw.last() == Some(&b'\r'));
                    let trimmed = trim_whitespace(&raw).to_vec();
                    if trimmed.is_empty() {
                        return Err(ParserError::bad_request(format!(
                            "empty value for header {}",
                            String::from_utf8_lossy(&self.pending_name)
                        )));
                    }
                    if !self.in_trailers {
                        self.detect_framing(&self.pending_name.clone(), &trimmed, framing, log_hook)?;
                    }
                    let name = std::mem::take(&mut self.pending_name);
                    let stop = sink.header_complete(&name, &trimmed);
                    self.phase = HeaderPhase::InName;
                    if stop {
                        return Ok(true);
                    }
                }
            }
        }
    }

    fn detect_framing(
        &mut self,
        name: &[u8],
        value: &[u8],
        framing: &mut BodyFraming,
        log_hook: &mut Option<crate::log::LogHook>,
    ) -> Result<()> {
        if eq_ignore_ascii_case(name, b"transfer-encoding") {
            if self.seen_transfer_encoding {
                emit_log(
                    log_hook,
                    LogCode::RepeatedFramingHeader,
                    LogSeverity::Warning,
                    "repeated Transfer-Encoding header",
                );
            }
            self.seen_transfer_encoding = true;
            if !eq_ignore_ascii_case(trim_whitespace(value), b"chunked") {
                return Err(ParserError::bad_request("Unknown Transfer-Encoding"));
            }
            if self.seen_content_length {
                emit_log(
                    log_hook,
                    LogCode::AmbiguousFraming,
                    LogSeverity::Warning,
                    "both Transfer-Encoding and Content-Length present; Transfer-Encoding wins",
                );
            }
            *framing = BodyFraming::Chunked;
        } else if eq_ignore_ascii_case(name, b"content-length") {
            if self.seen_content_length {
                emit_log(
                    log_hook,
                    LogCode::RepeatedFramingHeader,
                    LogSeverity::Warning,
                    "repeated Content-Length header",
                );
            }
            self.seen_content_length = true;
            if *framing == BodyFraming::Chunked {
                // Transfer-Encoding already settled framing; Content-Length is otherwise
                // ignored, but still an ambiguous-framing anomaly regardless of which header
                // arrived first.
                emit_log(
                    log_hook,
                    LogCode::AmbiguousFraming,
                    LogSeverity::Warning,
                    "both Transfer-Encoding and Content-Length present; Transfer-Encoding wins",
                );
                return Ok(());
            }
            let len = parse_content_length(value)
                .ok_or_else(|| ParserError::bad_request("Invalid Content-Length"))?;
            self.content_length = len;
            *framing = if len == 0 {
                BodyFraming::None
            } else {
                BodyFraming::Length
            };
        }
        Ok(())
    }
}

fn emit_log(
    hook: &mut Option<crate::log::LogHook>,
    code: LogCode,
    severity: LogSeverity,
    message: &'static str,
) {
    if let Some(hook) = hook {
        hook(&ParserLogRecord::new(code, severity, message));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Collector {
        headers: Vec<(Vec<u8>, Vec<u8>)>,
        has_body: bool,
    }

    impl ParserSink for Collector {
        fn header_complete(&mut self, name: &[u8], value: &[u8]) -> bool {
            self.headers.push((name.to_vec(), value.to_vec()));
            false
        }
        fn may_have_body(&mut self) -> bool {
            self.has_body
        }
    }

    fn run(data: &[u8]) -> (bool, Vec<(Vec<u8>, Vec<u8>)>, BodyFraming) {
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut input: Input = Cursor::new(data);
        let done = parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap();
        (done, sink.headers, framing)
    }

    #[test]
    fn single_header_and_blank_line() {
        let (done, headers, framing) = run(b"Content-Length: 5\n\n");
        assert!(done);
        assert_eq!(headers, vec![(b"Content-Length".to_vec(), b"5".to_vec())]);
        assert_eq!(framing, BodyFraming::Length);
    }

    #[test]
    fn case_insensitive_chunked() {
        let (done, _headers, framing) = run(b"Transfer-Encoding: Chunked\n\n");
        assert!(done);
        assert_eq!(framing, BodyFraming::Chunked);
    }

    #[test]
    fn case_insensitive_content_length_name() {
        let (done, _headers, framing) = run(b"content-length: 42\n\n");
        assert!(done);
        assert_eq!(framing, BodyFraming::Length);
    }

    #[test]
    fn unknown_transfer_encoding_is_bad_request() {
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut input: Input = Cursor::new(&b"Transfer-Encoding: gzip\n\n"[..]);
        let err = parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap_err();
        assert!(matches!(err, ParserError::BadRequest(_)));
    }

    #[test]
    fn invalid_content_length_is_bad_request() {
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut input: Input = Cursor::new(&b"Content-Length: -1\n\n"[..]);
        let err = parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap_err();
        assert!(matches!(err, ParserError::BadRequest(_)));
    }

    #[test]
    fn missing_value_is_bad_request() {
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut input: Input = Cursor::new(&b"X-Empty:\n\n"[..]);
        let err = parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap_err();
        assert!(matches!(err, ParserError::BadRequest(_)));
    }

    #[test]
    fn header_block_over_limit_fails() {
        let mut tok = Tokenizer::new(64, 16);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let data = b"X-Long-Header: 0123456789abcdef\n\n";
        let mut input: Input = Cursor::new(&data[..]);
        let err = parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 16, &mut log_hook)
            .unwrap_err();
        assert!(matches!(err, ParserError::BadRequest(_)));
    }

    #[test]
    fn incremental_split_matches_one_shot() {
        let data: &[u8] = b"A: 1\nB: 2\n\n";
        // One shot.
        let (_done, one_shot, _f) = run(data);

        // Split byte-by-byte.
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut done = false;
        for &byte in data {
            if done {
                break;
            }
            let chunk = [byte];
            let mut input: Input = Cursor::new(&chunk[..]);
            done = parser
                .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
                .unwrap();
        }
        assert!(done);
        assert_eq!(one_shot, sink.headers);
    }

    #[test]
    fn header_name_with_illegal_token_byte_is_bad_request() {
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut input: Input = Cursor::new(&b"X Bad: 1\n\n"[..]);
        let err = parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap_err();
        assert!(matches!(err, ParserError::BadRequest(_)));
    }

    #[test]
    fn end_then_reinvoke_is_invalid_state() {
        let mut tok = Tokenizer::new(64, 4096);
        let mut parser = HeaderParser::default();
        let mut sink = Collector::default();
        let mut framing = BodyFraming::Unknown;
        let mut log_hook = None;
        let mut input: Input = Cursor::new(&b"\n"[..]);
        assert!(parser
            .parse_headers(&mut tok, &mut input, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap());
        let mut input2: Input = Cursor::new(&b"\n"[..]);
        let err = parser
            .parse_headers(&mut tok, &mut input2, &mut sink, &mut framing, 4096, &mut log_hook)
            .unwrap_err();
        assert!(matches!(err, ParserError::InvalidState(_)));
    }
}
