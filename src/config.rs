//! Per-connection configuration.
//!
//! One `Config` is built once per connection and handed to [`HttpParser::new`]
//! (`crate::parser::HttpParser::new`); `reset()` clears per-message parser state but never
//! touches the configuration that produced it.

use crate::log::LogHook;

/// Construction-time limits and hooks for an [`HttpParser`](crate::parser::HttpParser).
pub struct Config {
    /// Initial capacity reserved for the accumulation buffer. Grows as needed up to no
    /// further bound of its own -- the effective ceiling on any one token is whichever
    /// size-limit checkpoint is active (`header_size_limit` for header lines, 256 bytes for
    /// a chunk header).
    pub initial_buffer_size: usize,
    /// Hard cap, in bytes, on the header block (every header name and value combined,
    /// including the request/status line when the tokenizer's shared `start_line` helper is
    /// used). Exceeding it fails the parse with `BadRequest`.
    pub header_size_limit: usize,
    /// Hard cap on a single chunk's declared size in `Transfer-Encoding: chunked` bodies.
    pub max_chunk_size: usize,
    /// Sink for non-fatal protocol anomalies. `None` (the default) discards them.
    pub log_hook: Option<LogHook>,
}

impl Config {
    /// 80 KiB, matching the header size ceiling common production HTTP servers ship with.
    pub const DEFAULT_HEADER_SIZE_LIMIT: usize = 80 * 1024;
    /// 10 MiB: large enough for real chunked bodies, small enough to bound one allocation.
    pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10 * 1024 * 1024;
    /// Initial accumulation buffer capacity.
    pub const DEFAULT_INITIAL_BUFFER_SIZE: usize = 4096;

    /// Builds a `Config` with the given limits and no log hook.
    pub fn new(initial_buffer_size: usize, header_size_limit: usize, max_chunk_size: usize) -> Self {
        Self {
            initial_buffer_size,
            header_size_limit,
            max_chunk_size,
            log_hook: None,
        }
    }

    /// Installs (or replaces) the log hook.
    pub fn set_log_hook(&mut self, hook: LogHook) -> &mut Self {
        self.log_hook = Some(hook);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_INITIAL_BUFFER_SIZE,
            Self::DEFAULT_HEADER_SIZE_LIMIT,
            Self::DEFAULT_MAX_CHUNK_SIZE,
        )
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("initial_buffer_size", &self.initial_buffer_size)
            .field("header_size_limit", &self.header_size_limit)
            .field("max_chunk_size", &self.max_chunk_size)
            .field("log_hook", &self.log_hook.as_ref().map(|_| "<hook>"))
            .finish()
    }
}
