//! The body framer (spec.md 4.3): drives body consumption in one of four modes and hands
//! the caller zero-copy slices of its own input buffer.

use crate::error::{ParserError, Result};
use crate::headers::{BodyFraming, HeaderParser, ParserSink};
use crate::log::{log_bare_lf, LogCode, LogHook, LogSeverity, ParserLogRecord};
use crate::parsers::parse_chunked_length;
use crate::tokenizer::{Input, Tokenizer};
use crate::util::is_hex_digit;

/// Where the chunked-transfer-coding state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPhase {
    Start,
    Size,
    Params,
    Body,
    Lf,
    Trailers,
}

/// Returns a read-only view of the entire remaining input window, advancing the window's
/// position to its limit. Never copies.
fn submit_buffer<'a>(input: &mut Input<'a>) -> &'a [u8] {
    let full: &'a [u8] = *input.get_ref();
    let pos = input.position() as usize;
    input.set_position(full.len() as u64);
    &full[pos..]
}

/// Returns a read-only view of exactly the next `n` bytes of the input window, advancing
/// the window's position by `n`. Never copies. Panics if fewer than `n` bytes remain --
/// callers must only ask for what [`Input::position`] vs. the buffer length proves is there.
fn submit_partial_buffer<'a>(input: &mut Input<'a>, n: usize) -> &'a [u8] {
    let full: &'a [u8] = *input.get_ref();
    let pos = input.position() as usize;
    input.set_position((pos + n) as u64);
    &full[pos..pos + n]
}

fn available(input: &Input<'_>) -> usize {
    let full = *input.get_ref();
    full.len() - input.position() as usize
}

/// Delivers up to `remaining` bytes from `input`, honoring the "slice of exactly what's
/// needed, or the whole window if that's less" rule common to `Length` mode and a single
/// chunk's `Body` phase. Returns the slice (or `None` if nothing is available yet) and the
/// number of bytes it advanced `remaining` by.
fn deliver_bounded<'a>(input: &mut Input<'a>, remaining: u64) -> (Option<&'a [u8]>, u64) {
    let avail = available(input);
    if avail == 0 {
        return (None, 0);
    }
    if avail as u64 >= remaining {
        let n = remaining as usize;
        (Some(submit_partial_buffer(input, n)), remaining)
    } else {
        let slice = submit_buffer(input);
        let n = slice.len() as u64;
        (Some(slice), n)
    }
}

fn emit_log(hook: &mut Option<LogHook>, code: LogCode, severity: LogSeverity, message: &'static str) {
    if let Some(hook) = hook {
        hook(&ParserLogRecord::new(code, severity, message));
    }
}

/// Drives body consumption for one message.
#[derive(Debug)]
pub struct BodyFramer {
    chunk_phase: ChunkPhase,
    content_length: u64,
    delivered: u64,
    chunk_length: u64,
    chunk_position: u64,
    complete: bool,
    /// Whether the byte immediately before the one just read was a bare `\r` -- tracked across
    /// calls the same way `chunk_phase` is, so a chunk-header or chunk-terminator line split
    /// across two `parse_content` invocations is still classified correctly at its `\n`.
    last_was_cr: bool,
}

impl Default for BodyFramer {
    fn default() -> Self {
        Self {
            chunk_phase: ChunkPhase::Start,
            content_length: 0,
            delivered: 0,
            chunk_length: 0,
            chunk_position: 0,
            complete: false,
            last_was_cr: false,
        }
    }
}

impl BodyFramer {
    /// Resets all per-message body state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `true` once the message body has been fully delivered (or determined to not exist).
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Installs the declared length for `Length`-mode framing. Must be called once, right
    /// after the header parser set framing to `Length`.
    pub fn set_content_length(&mut self, len: u64) {
        self.content_length = len;
        self.delivered = 0;
    }

    /// Forces the body to a terminal state; used by `HttpParser::shutdown` and to end an
    /// `EofTerminated` body once the caller's transport has signaled EOF.
    pub fn force_complete(&mut self) {
        self.complete = true;
    }

    /// Consumes as much body as `input` currently allows and returns a slice of whatever
    /// was delivered, dispatching on `framing`.
    pub fn parse_content<'a>(
        &mut self,
        tok: &mut Tokenizer,
        input: &mut Input<'a>,
        framing: &mut BodyFraming,
        headers: &mut HeaderParser,
        sink: &mut dyn ParserSink,
        max_chunk_size: u64,
        log_hook: &mut Option<LogHook>,
    ) -> Result<Option<&'a [u8]>> {
        if self.complete {
            return Ok(None);
        }
        match framing {
            BodyFraming::Unknown => {
                emit_log(
                    log_hook,
                    LogCode::UnknownFramingTreatedAsBodyless,
                    LogSeverity::Info,
                    "no Content-Length or Transfer-Encoding; treating message as bodyless",
                );
                *framing = BodyFraming::None;
                self.complete = true;
                Ok(None)
            }
            BodyFraming::None => {
                self.complete = true;
                Ok(None)
            }
            BodyFraming::Length => {
                let remaining = self.content_length - self.delivered;
                let (slice, n) = deliver_bounded(input, remaining);
                self.delivered += n;
                if self.delivered == self.content_length {
                    self.complete = true;
                }
                Ok(slice)
            }
            BodyFraming::Chunked => self.parse_chunked(tok, input, headers, sink, max_chunk_size, log_hook),
            BodyFraming::SelfDefining => Err(ParserError::invalid_state(
                "SelfDefining framing is reserved and never produced by this parser",
            )),
            BodyFraming::EofTerminated => {
                let avail = available(input);
                if avail == 0 {
                    return Ok(None);
                }
                Ok(Some(submit_buffer(input)))
            }
        }
    }

    fn parse_chunked<'a>(
        &mut self,
        tok: &mut Tokenizer,
        input: &mut Input<'a>,
        headers: &mut HeaderParser,
        sink: &mut dyn ParserSink,
        max_chunk_size: u64,
        log_hook: &mut Option<LogHook>,
    ) -> Result<Option<&'a [u8]>> {
        loop {
            match self.chunk_phase {
                ChunkPhase::Start => {
                    tok.reset_limit(256);
                    tok.clear_buffer();
                    self.last_was_cr = false;
                    self.chunk_phase = ChunkPhase::Size;
                }
                ChunkPhase::Size => {
                    let b = tok.next(input)?;
                    if b == 0 {
                        return Ok(None);
                    }
                    if is_hex_digit(b) {
                        tok.put_byte(b);
                        self.last_was_cr = false;
                    } else if b == b';' || b == b' ' || b == b'\t' {
                        self.finalize_chunk_size(tok, max_chunk_size)?;
                        self.chunk_phase = ChunkPhase::Params;
                        self.last_was_cr = false;
                    } else if b == b'\n' {
                        self.finalize_chunk_size(tok, max_chunk_size)?;
                        log_bare_lf(log_hook, self.last_was_cr);
                        self.last_was_cr = false;
                        self.after_chunk_size(headers);
                    } else if b == b'\r' {
                        // Tolerated bare CR ahead of the terminating LF; see the tokenizer's
                        // line-ending handling elsewhere in the state machine.
                        self.last_was_cr = true;
                    } else {
                        return Err(ParserError::bad_request("bad chunked encoding"));
                    }
                }
                ChunkPhase::Params => {
                    let b = tok.next(input)?;
                    if b == 0 {
                        return Ok(None);
                    }
                    if b == b'\n' {
                        log_bare_lf(log_hook, self.last_was_cr);
                        self.last_was_cr = false;
                        self.after_chunk_size(headers);
                    } else {
                        // Any other byte, including a bare CR, is a discarded chunk-extension
                        // character; only remember it for the next iteration's `\n` check.
                        self.last_was_cr = b == b'\r';
                    }
                }
                ChunkPhase::Body => {
                    let remaining = self.chunk_length - self.chunk_position;
                    let (slice, n) = deliver_bounded(input, remaining);
                    self.chunk_position += n;
                    if self.chunk_position == self.chunk_length {
                        self.chunk_position = 0;
                        self.chunk_length = 0;
                        self.chunk_phase = ChunkPhase::Lf;
                        self.last_was_cr = false;
                    }
                    if slice.is_some() {
                        return Ok(slice);
                    }
                    if n == 0 {
                        return Ok(None);
                    }
                }
                ChunkPhase::Lf => {
                    let b = tok.next(input)?;
                    if b == 0 {
                        return Ok(None);
                    }
                    if b == b'\r' {
                        self.last_was_cr = true;
                        continue;
                    }
                    if b != b'\n' {
                        return Err(ParserError::bad_request("bad chunked encoding"));
                    }
                    log_bare_lf(log_hook, self.last_was_cr);
                    self.last_was_cr = false;
                    self.chunk_phase = ChunkPhase::Start;
                }
                ChunkPhase::Trailers => {
                    let done = headers.parse_headers(
                        tok,
                        input,
                        sink,
                        &mut BodyFraming::Chunked,
                        256,
                        log_hook,
                    )?;
                    if !done {
                        return Ok(None);
                    }
                    self.complete = true;
                    return Ok(Some(&[][..]));
                }
            }
        }
    }

    fn finalize_chunk_size(&mut self, tok: &mut Tokenizer, max_chunk_size: u64) -> Result<()> {
        let len = parse_chunked_length(tok.buffer())
            .ok_or_else(|| ParserError::bad_request("bad chunked encoding"))?;
        tok.clear_buffer();
        if len > max_chunk_size {
            return Err(ParserError::bad_request("chunk too large"));
        }
        self.chunk_length = len;
        Ok(())
    }

    fn after_chunk_size(&mut self, headers: &mut HeaderParser) {
        if self.chunk_length == 0 {
            headers.reset_for_trailers();
            self.chunk_phase = ChunkPhase::Trailers;
        } else {
            self.chunk_position = 0;
            self.chunk_phase = ChunkPhase::Body;
        }
    }
}
