#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use utf8stream::{ChunkedSource, DecodeError, DecoderOptions, TruncatedInputMode, Utf8Decoder};

#[derive(Arbitrary, Debug)]
struct Input {
    strict: bool,
    byte_buffer: u8,
    unit_buffer: u8,
    // Zero picks a single-unit read, anything else a bulk read of that size.
    reads: Vec<u8>,
    splits: Vec<u8>,
    bytes: Vec<u8>,
}

fn decoder(input: Input) {
    let options = DecoderOptions {
        byte_buffer_size: 1 + usize::from(input.byte_buffer),
        unit_buffer_size: 2 + usize::from(input.unit_buffer),
        truncated_input: if input.strict {
            TruncatedInputMode::Fail
        } else {
            TruncatedInputMode::Discard
        },
    };
    let sizes = input.splits.iter().map(|&s| usize::from(s)).collect();
    let mut decoder = Utf8Decoder::with_options(ChunkedSource::new(&input.bytes, sizes), options);

    let mut units = Vec::new();
    let mut dst = [0u16; 256];
    let mut plan = input.reads.iter().copied().cycle();
    let result = loop {
        let step = usize::from(plan.next().unwrap_or(0));
        let read = if step == 0 {
            decoder.read_unit().map(|u| u.map(|u| units.push(u)))
        } else {
            decoder
                .read_units(&mut dst[..step])
                .map(|n| n.map(|n| units.extend_from_slice(&dst[..n])))
        };
        match read {
            Ok(Some(())) => {}
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };

    match (core::str::from_utf8(&input.bytes), result) {
        (Ok(text), Ok(())) => assert!(units.iter().copied().eq(text.encode_utf16())),
        (Ok(_), Err(err)) => panic!("valid input rejected: {err}"),
        (Err(err), Ok(())) => {
            assert!(!input.strict && err.error_len().is_none(), "invalid input accepted");
            let prefix = core::str::from_utf8(&input.bytes[..err.valid_up_to()]).unwrap();
            assert!(units.iter().copied().eq(prefix.encode_utf16()));
        }
        (Err(err), Err(DecodeError::MalformedUtf8 { offset, byte })) => {
            assert!(err.error_len().is_some());
            let prefix = core::str::from_utf8(&input.bytes[..err.valid_up_to()]).unwrap();
            assert!(units.iter().copied().eq(prefix.encode_utf16()));
            let offset = usize::try_from(offset).unwrap();
            assert!(offset >= err.valid_up_to());
            assert_eq!(input.bytes[offset], byte);
        }
        (Err(err), Err(DecodeError::TruncatedInput { offset })) => {
            assert!(input.strict && err.error_len().is_none());
            assert_eq!(usize::try_from(offset).unwrap(), input.bytes.len());
        }
        (Err(_), Err(DecodeError::Io(never))) => match never {},
    }
}

fuzz_target!(|input: Input| decoder(input));
