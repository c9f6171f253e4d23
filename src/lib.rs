//! An incremental, streaming HTTP/1.x message parser.
//!
//! Consumes bytes from a caller-supplied buffer and emits headers and body fragments as
//! they become available. It never performs I/O, never blocks, and never reads past the
//! end of what has arrived -- the caller owns the transport (and, ahead of this parser, any
//! TLS termination) and feeds buffers in as they arrive.
//!
//! The three cooperating pieces, leaves first, are [`tokenizer`], [`headers`] and [`body`];
//! [`parser::HttpParser`] is the type most callers actually hold.
//!
//! ```
//! use htp_stream::{config::Config, headers::ParserSink, parser::HttpParser};
//! use std::io::Cursor;
//!
//! struct PrintSink;
//! impl ParserSink for PrintSink {
//!     fn header_complete(&mut self, _name: &[u8], _value: &[u8]) -> bool {
//!         false
//!     }
//!     fn may_have_body(&mut self) -> bool {
//!         false
//!     }
//! }
//!
//! let mut parser = HttpParser::new(Config::default());
//! let mut sink = PrintSink;
//! let mut input = Cursor::new(&b"Content-Length: 5\n\nhello"[..]);
//! assert!(parser.parse_headers(&mut input, &mut sink).unwrap());
//! let body = parser.parse_content(&mut input).unwrap();
//! assert_eq!(body, Some(&b"hello"[..]));
//! assert!(parser.content_complete());
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod headers;
pub mod log;
pub mod parser;
pub mod parsers;
pub mod tokenizer;
pub mod util;

pub use config::Config;
pub use error::{ParserError, Result};
pub use headers::{BodyFraming, ParserSink};
pub use parser::HttpParser;
pub use tokenizer::{HttpVersion, Input, StartLine, StartLineParser};
