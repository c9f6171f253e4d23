#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate htp_stream;

use htp_stream::{Config, HttpParser, ParserSink};
use std::io::Cursor;

struct NullSink;

impl ParserSink for NullSink {
    fn header_complete(&mut self, _name: &[u8], _value: &[u8]) -> bool {
        false
    }
    fn may_have_body(&mut self) -> bool {
        true
    }
}

/// Feeds `data` to a fresh parser in arbitrary-sized slices, the same way a real transport
/// hands over whatever happened to arrive on the wire. Only ever checks that the parser
/// doesn't panic and that it never claims to have consumed more than it was given --
/// malformed input is expected to come back as an error, not a crash.
fn drive(data: &[u8], chunk_size: usize) {
    let chunk_size = chunk_size.max(1);
    let mut parser = HttpParser::new(Config::default());
    let mut sink = NullSink;
    let mut offset = 0;

    loop {
        let end = (offset + chunk_size).min(data.len());
        let slice = &data[offset..end];
        let mut input: Cursor<&[u8]> = Cursor::new(slice);

        if !parser.headers_complete() {
            match parser.parse_headers(&mut input, &mut sink) {
                Ok(_) => {}
                Err(_) => return,
            }
        } else if !parser.content_complete() {
            match parser.parse_content(&mut input) {
                Ok(_) => {}
                Err(_) => return,
            }
        } else {
            return;
        }

        let consumed = input.position() as usize;
        assert!(consumed <= slice.len());
        offset += consumed;

        if offset >= data.len() {
            if parser.headers_complete() && !parser.content_complete() {
                // No more bytes will ever arrive; give EOF-terminated framing a chance to
                // settle so we don't spin forever on an `Unknown` body.
                let _ = parser.force_eof_terminated();
                parser.shutdown();
            }
            return;
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let chunk_size = data[0] as usize + 1;
    drive(&data[1..], chunk_size);
});
