use alloc::{vec, vec::Vec};
use core::{convert::Infallible, fmt};

use rstest::rstest;

use super::utils::{decode_bulk, decode_single, decode_strict, utf16};
use crate::{
    ByteSource, ChunkedSource, DecodeError, DecoderOptions, TruncatedInputMode, Utf8Decoder,
};

fn malformed(offset: u64, byte: u8) -> DecodeError<Infallible> {
    DecodeError::MalformedUtf8 { offset, byte }
}

/// Collects units up to the first error, reading `chunk` units at a time, or
/// one at a time when `chunk` is zero.
fn units_before_error(
    input: &[u8],
    chunk: usize,
    unit_buffer_size: usize,
) -> (Vec<u16>, DecodeError<Infallible>) {
    let options = DecoderOptions {
        unit_buffer_size,
        ..Default::default()
    };
    let mut decoder = Utf8Decoder::with_options(input, options);
    let mut units = Vec::new();
    let mut dst = vec![0u16; chunk.max(1)];
    loop {
        let read = if chunk == 0 {
            decoder.read_unit().map(|u| u.map(|u| units.push(u)))
        } else {
            decoder
                .read_units(&mut dst)
                .map(|n| n.map(|n| units.extend_from_slice(&dst[..n])))
        };
        match read {
            Ok(Some(())) => {}
            Ok(None) => panic!("input was accepted"),
            Err(err) => return (units, err),
        }
    }
}

#[rstest]
#[case::ff(b"\xFF", 0, 0xFF)]
#[case::ff_after_text(b"ok\xFF", 2, 0xFF)]
#[case::overlong_nul(b"\xC0\x80", 0, 0xC0)]
#[case::overlong_two_max(b"\xC1\xBF", 0, 0xC1)]
#[case::overlong_three_min(b"\xE0\x80\x80", 1, 0x80)]
#[case::overlong_three_max(b"\xE0\x9F\xBF", 1, 0x9F)]
#[case::overlong_four_min(b"\xF0\x80\x80\x80", 1, 0x80)]
#[case::overlong_four_max(b"\xF0\x8F\xBF\xBF", 1, 0x8F)]
#[case::surrogate_d800(b"\xED\xA0\x80", 1, 0xA0)]
#[case::surrogate_db7f(b"\xED\xAD\xBF", 1, 0xAD)]
#[case::surrogate_dc00(b"\xED\xB0\x80", 1, 0xB0)]
#[case::surrogate_dfff(b"\xED\xBF\xBF", 1, 0xBF)]
#[case::beyond_max(b"\xF4\x90\x90\x90", 1, 0x90)]
#[case::five_byte_starter(b"\xF8\x88\x80\x80\x80", 0, 0xF8)]
#[case::six_byte_starter(b"\xFC\x84\x80\x80\x80\x80", 0, 0xFC)]
#[case::fe(b"\xFE\x80", 0, 0xFE)]
#[case::lone_continuation(b"\x80", 0, 0x80)]
#[case::too_many_continuations(b"\xC2\x80\x80", 2, 0x80)]
#[case::starter_then_space(b"\xE2\x82 ", 2, 0x20)]
fn rejects(#[case] input: &[u8], #[case] offset: u64, #[case] byte: u8) {
    assert_eq!(decode_single(input), Err(malformed(offset, byte)));
    assert_eq!(decode_bulk(input, 1), Err(malformed(offset, byte)));
    assert_eq!(decode_bulk(input, 64), Err(malformed(offset, byte)));
    assert_eq!(decode_strict(input), Err(malformed(offset, byte)));

    // Whatever the read sizes, the valid prefix comes out before the error.
    let valid = core::str::from_utf8(input).unwrap_err().valid_up_to();
    let prefix = utf16(core::str::from_utf8(&input[..valid]).unwrap());
    for (chunk, cache) in [(0, 2), (0, 3), (0, 8192), (1, 2), (2, 2), (64, 8192)] {
        assert_eq!(
            units_before_error(input, chunk, cache),
            (prefix.clone(), malformed(offset, byte)),
            "chunk {chunk}, cache {cache}"
        );
    }
}

#[test]
fn every_invalid_starter_is_rejected_immediately() {
    for b in (0xF5..=0xFF).chain([0xC0, 0xC1]) {
        let input = [b, 0x20];
        assert_eq!(decode_single(&input), Err(malformed(0, b)), "starter {b:02X}");
    }
}

#[test]
fn every_lone_continuation_is_rejected() {
    for b in 0x80..0xC0 {
        let input = [b'a', b];
        assert_eq!(decode_single(&input), Err(malformed(1, b)), "byte {b:02X}");
    }
}

#[test]
fn incomplete_sequences_followed_by_space() {
    for lead in 0xE0u8..0xF5 {
        let cont = if lead == 0xE0 || lead == 0xF0 { 0xA0 } else { 0x80 };
        let input = [lead, cont, 0x20];
        assert_eq!(decode_single(&input), Err(malformed(2, 0x20)), "lead {lead:02X}");
    }
    for lead in 0xF0u8..0xF5 {
        let cont = if lead == 0xF0 { 0xA0 } else { 0x80 };
        let input = [lead, cont, 0x80, 0x20];
        assert_eq!(decode_single(&input), Err(malformed(3, 0x20)), "lead {lead:02X}");
    }
}

#[test]
fn malformed_is_sticky() {
    let mut decoder = Utf8Decoder::new(&b"\xC0\x80 and then valid text"[..]);
    let expected = Err(malformed(0, 0xC0));
    assert_eq!(decoder.read_unit(), expected);
    assert_eq!(decoder.read_unit(), expected);
    assert_eq!(decoder.read_units(&mut [0u16; 8]), Err(malformed(0, 0xC0)));
    assert_eq!(decoder.read_char(), Err(malformed(0, 0xC0)));
}

#[test]
fn units_iterator_stops_after_error() {
    let mut decoder = Utf8Decoder::new(&b"\xFF"[..]);
    let items: Vec<_> = decoder.units().collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0], Err(malformed(0, 0xFF)));
}

#[test]
fn cached_units_are_returned_before_the_error() {
    // The first single read caches "abc"; the bulk read drains "bc", decodes
    // "d" and then runs into the bad byte.
    let source = ChunkedSource::new(b"abcd\xFF", vec![4]);
    let options = DecoderOptions {
        unit_buffer_size: 4,
        ..Default::default()
    };
    let mut decoder = Utf8Decoder::with_options(source, options);
    assert_eq!(decoder.read_unit(), Ok(Some(u16::from(b'a'))));
    let mut dst = [0u16; 8];
    assert_eq!(decoder.read_units(&mut dst), Ok(Some(3)));
    assert_eq!(&dst[..3], [0x62, 0x63, 0x64]);
    assert_eq!(decoder.read_units(&mut dst), Err(malformed(4, 0xFF)));
    assert_eq!(decoder.read_unit(), Err(malformed(4, 0xFF)));
}

#[test]
fn text_before_the_error_does_not_depend_on_the_cache() {
    for unit_buffer_size in [2, 3, 8192] {
        let options = DecoderOptions {
            unit_buffer_size,
            ..Default::default()
        };
        let mut decoder = Utf8Decoder::with_options(&b"ok\xFF"[..], options);
        assert_eq!(decoder.read_unit(), Ok(Some(u16::from(b'o'))));
        assert_eq!(decoder.read_unit(), Ok(Some(u16::from(b'k'))));
        assert_eq!(decoder.read_unit(), Err(malformed(2, 0xFF)));
    }
}

#[rstest]
#[case::two(b"\xE2\x82", 2)]
#[case::after_text(b"abc\xF0\x9F\x9A", 6)]
fn strict_mode_reports_truncation(#[case] input: &[u8], #[case] offset: u64) {
    assert_eq!(decode_strict(input), Err(DecodeError::TruncatedInput { offset }));

    let options = DecoderOptions {
        truncated_input: TruncatedInputMode::Fail,
        ..Default::default()
    };
    let result = crate::decode_utf8_with_options(input, options);
    assert_eq!(result, Err(DecodeError::TruncatedInput { offset }));
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Broken;

impl fmt::Display for Broken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("broken pipe")
    }
}

impl core::error::Error for Broken {}

/// Serves `data`, fails once, then reports the end of the stream.
struct FailsOnce<'a> {
    data: &'a [u8],
    failed: bool,
}

impl ByteSource for FailsOnce<'_> {
    type Error = Broken;

    fn read(&mut self, dst: &mut [u8]) -> Result<usize, Broken> {
        if !self.data.is_empty() {
            let n = self.data.len().min(dst.len());
            dst[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        } else if self.failed {
            Ok(0)
        } else {
            self.failed = true;
            Err(Broken)
        }
    }
}

#[test]
fn source_error_follows_decoded_text() {
    let mut decoder = Utf8Decoder::new(FailsOnce {
        data: b"ab",
        failed: false,
    });
    let mut dst = [0u16; 8];
    assert_eq!(decoder.read_units(&mut dst), Ok(Some(2)));
    let err = decoder.read_units(&mut dst).unwrap_err();
    assert_eq!(err, DecodeError::Io(Broken));
    assert!(!err.is_fatal());
    assert_eq!(decoder.read_units(&mut dst), Ok(None));
}

#[test]
fn source_error_through_single_reads() {
    let mut decoder = Utf8Decoder::new(FailsOnce {
        data: "\u{e9}".as_bytes(),
        failed: false,
    });
    assert_eq!(decoder.read_unit(), Ok(Some(0x00E9)));
    assert_eq!(decoder.read_unit(), Err(DecodeError::Io(Broken)));
    assert_eq!(decoder.read_unit(), Ok(None));
}

#[test]
fn source_error_on_first_read_is_immediate() {
    let mut decoder = Utf8Decoder::new(FailsOnce {
        data: b"",
        failed: false,
    });
    assert_eq!(decoder.read_char(), Err(DecodeError::Io(Broken)));
    assert_eq!(decoder.byte_offset(), 0);
}
