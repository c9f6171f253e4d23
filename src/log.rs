//! Non-fatal anomaly reporting.
//!
//! The core parser never recovers from a fatal condition -- those always surface as a
//! [`crate::error::ParserError`]. Everything short of fatal (a tolerated bare-LF line ending,
//! an ambiguous `Transfer-Encoding`/`Content-Length` pair, a repeated framing header) is
//! reported through a [`LogHook`] instead, the same split the teacher crate draws between
//! `htp_error!` and `htp_warn!`. A [`Config`](crate::config::Config) with no hook installed
//! drops these records on the floor.

use std::borrow::Cow;
use std::fmt;

/// One anomaly this crate knows how to recognize.
///
/// `#[non_exhaustive]` because future versions may recognize more anomalies without that
/// being a breaking change for callers who only match a subset.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCode {
    /// A header line ended in bare LF with no preceding CR.
    BareLfLineEnding,
    /// Both `Transfer-Encoding: chunked` and `Content-Length` were present; `Transfer-Encoding`
    /// won per RFC 7230 3.3.3 and the `Content-Length` header was ignored for framing.
    AmbiguousFraming,
    /// The same framing header appeared more than once on the same message.
    RepeatedFramingHeader,
    /// A message had neither `Content-Length` nor `Transfer-Encoding`; treated as bodyless.
    UnknownFramingTreatedAsBodyless,
}

/// Severity attached to a [`ParserLogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Worth surfacing to an operator but does not change parsing behavior.
    Info,
    /// The parser deviated from strict wire-spec behavior to accommodate the anomaly.
    Warning,
}

/// One record delivered to a [`LogHook`].
#[derive(Debug, Clone)]
pub struct ParserLogRecord {
    /// Which anomaly this is.
    pub code: LogCode,
    /// Human-readable detail, e.g. naming the offending header.
    pub message: Cow<'static, str>,
    /// How serious the anomaly is.
    pub severity: LogSeverity,
}

impl ParserLogRecord {
    pub(crate) fn new(
        code: LogCode,
        severity: LogSeverity,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for ParserLogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {:?}: {}", self.severity, self.code, self.message)
    }
}

/// A caller-supplied sink for non-fatal anomalies.
///
/// Boxed rather than generic over the parser, mirroring the teacher crate's `DataHook`: the
/// parser is not generic over its sink, and a trait object keeps the common case (no hook,
/// or one simple closure) free of type-parameter noise.
pub type LogHook = Box<dyn FnMut(&ParserLogRecord)>;

/// Reports a bare-LF line ending (`had_cr == false`) at every site that tolerates one --
/// header lines, the request/status line, and chunk-header lines -- so a caller enforcing
/// strict CRLF on top of this lenient parser can observe exactly where it diverged. A `\r\n`
/// ending (`had_cr == true`) is unremarkable and not reported.
pub(crate) fn log_bare_lf(hook: &mut Option<LogHook>, had_cr: bool) {
    if had_cr {
        return;
    }
    if let Some(hook) = hook {
        hook(&ParserLogRecord::new(
            LogCode::BareLfLineEnding,
            LogSeverity::Info,
            "line terminated with bare LF, no preceding CR",
        ));
    }
}
