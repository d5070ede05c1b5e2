use alloc::vec::Vec;
use core::convert::Infallible;

use crate::{ByteSource, DecodeError, DecoderOptions, Utf8Decoder};

pub type Decoded = Result<Vec<u16>, DecodeError<Infallible>>;

/// Drains `decoder` one unit at a time.
pub fn drain_single<S: ByteSource>(
    decoder: &mut Utf8Decoder<S>,
) -> Result<Vec<u16>, DecodeError<S::Error>> {
    let mut out = Vec::new();
    while let Some(unit) = decoder.read_unit()? {
        out.push(unit);
    }
    Ok(out)
}

/// Drains `decoder` through bulk reads of `chunk` units.
pub fn drain_bulk<S: ByteSource>(
    decoder: &mut Utf8Decoder<S>,
    chunk: usize,
) -> Result<Vec<u16>, DecodeError<S::Error>> {
    assert!(chunk > 0);
    let mut buf = alloc::vec![0u16; chunk];
    let mut out = Vec::new();
    while let Some(n) = decoder.read_units(&mut buf)? {
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

pub fn decode_single(bytes: &[u8]) -> Decoded {
    drain_single(&mut Utf8Decoder::new(bytes))
}

pub fn decode_bulk(bytes: &[u8], chunk: usize) -> Decoded {
    drain_bulk(&mut Utf8Decoder::new(bytes), chunk)
}

pub fn decode_strict(bytes: &[u8]) -> Decoded {
    let options = DecoderOptions {
        truncated_input: crate::TruncatedInputMode::Fail,
        ..Default::default()
    };
    drain_single(&mut Utf8Decoder::with_options(bytes, options))
}

pub fn utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Number of cases each property runs.
pub fn quickcheck_tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if cfg!(feature = "test-fast") {
        100
    } else if is_ci::cached() {
        10_000
    } else {
        1_000
    };
    #[cfg(miri)]
    let tests = 10;
    tests
}
