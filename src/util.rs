//! Byte classification helpers shared by the tokenizer, header parser and body framer.

use bstr::ByteSlice;

/// Space or horizontal tab -- the characters skipped after a header's `:` separator.
pub fn is_space_or_tab(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// True for bytes legal in an HTTP/1.x token (header name, chunk-extension name, method).
///
/// Per RFC 7230 3.2.6: any US-ASCII visible character except the defined separators.
pub fn is_token_char(c: u8) -> bool {
    match c {
        b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"' | b'/' | b'[' | b']'
        | b'?' | b'=' | b'{' | b'}' | b' ' | b'\t' => false,
        0x00..=0x1f | 0x7f => false,
        _ => true,
    }
}

/// Trims leading/trailing spaces and tabs, the only whitespace a trimmed header token drops.
pub fn trim_whitespace(input: &[u8]) -> &[u8] {
    input.trim_with(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n')
}

/// True for ASCII hex digits, used by the chunk-size tokenizer.
pub fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

/// Case-insensitive ASCII equality, used to match the two framing header names and the
/// `chunked` transfer-coding token.
pub fn eq_ignore_ascii_case(a: &[u8], b: &[u8]) -> bool {
    a.eq_ignore_ascii_case(b)
}
