//! Small numeric-token parsers shared by the header parser and the chunk state machine.
//!
//! Kept separate from `headers`/`body` the same way the teacher crate keeps
//! `parse_content_length`/`parse_chunked_length` in their own `parsers` module rather than
//! inline in the state machines that call them.

use nom::character::complete::{digit1, hex_digit1};
use nom::combinator::all_consuming;
use nom::IResult;

/// Parses a `Content-Length` value: a non-negative decimal integer and nothing else.
/// `None` on anything else, including a leading `-` (which `digit1` simply never matches).
pub fn parse_content_length(value: &[u8]) -> Option<u64> {
    let (_, digits): (&[u8], &[u8]) = all_consuming(digit1::<&[u8], nom::error::Error<&[u8]>>)(value)
        .ok()
        .map(|(rest, digits)| (rest, digits))?;
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Parses a chunk-size token: one or more hex digits.
pub fn parse_chunked_length(value: &[u8]) -> Option<u64> {
    let parsed: IResult<&[u8], &[u8]> =
        all_consuming(hex_digit1::<&[u8], nom::error::Error<&[u8]>>)(value);
    let (_, digits) = parsed.ok()?;
    u64::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn content_length_accepts_digits_only() {
        assert_eq!(parse_content_length(b"42"), Some(42));
        assert_eq!(parse_content_length(b"0"), Some(0));
        assert_eq!(parse_content_length(b"-1"), None);
        assert_eq!(parse_content_length(b"4a"), None);
        assert_eq!(parse_content_length(b""), None);
    }

    #[test]
    fn chunked_length_parses_hex() {
        assert_eq!(parse_chunked_length(b"5"), Some(5));
        assert_eq!(parse_chunked_length(b"ff"), Some(255));
        assert_eq!(parse_chunked_length(b"FF"), Some(255));
        assert_eq!(parse_chunked_length(b""), None);
        assert_eq!(parse_chunked_length(b"zz"), None);
    }

    #[rstest]
    #[case::zero(b"0", Some(0))]
    #[case::max_u64_in_hex(b"ffffffffffffffff", Some(u64::MAX))]
    #[case::leading_zeroes(b"007", Some(7))]
    #[case::embedded_space_rejected(b"1 2", None)]
    #[case::trailing_garbage_rejected(b"1x", None)]
    #[case::empty_rejected(b"", None)]
    fn chunked_length_table(#[case] input: &[u8], #[case] expected: Option<u64>) {
        assert_eq!(parse_chunked_length(input), expected);
    }

    #[rstest]
    #[case::zero(b"0", Some(0))]
    #[case::large(b"18446744073709551615", Some(u64::MAX))]
    #[case::overflow_rejected(b"99999999999999999999", None)]
    #[case::plus_sign_rejected(b"+1", None)]
    #[case::whitespace_rejected(b" 1", None)]
    fn content_length_table(#[case] input: &[u8], #[case] expected: Option<u64>) {
        assert_eq!(parse_content_length(input), expected);
    }
}
