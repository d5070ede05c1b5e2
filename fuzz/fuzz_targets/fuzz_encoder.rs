#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use utf8stream::{EncoderOptions, Utf8Decoder, Utf8Encoder};

#[derive(Arbitrary, Debug)]
struct Input {
    buffer: u8,
    splits: Vec<u8>,
    units: Vec<u16>,
}

fn encoder(input: Input) {
    let options = EncoderOptions {
        buffer_size: 4 + usize::from(input.buffer),
        ..Default::default()
    };
    let mut encoder = Utf8Encoder::with_options(Vec::new(), options);
    let mut rest = &input.units[..];
    for &s in &input.splits {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + usize::from(s) % rest.len());
        encoder.write_units(head).unwrap();
        rest = tail;
    }
    encoder.write_units(rest).unwrap();
    let bytes = encoder.into_inner().unwrap();

    let expected: String = char::decode_utf16(input.units.iter().copied())
        .map(|c| c.unwrap_or('?'))
        .collect();
    assert_eq!(bytes, expected.as_bytes());

    // Whatever the encoder writes must decode cleanly.
    let mut decoder = Utf8Decoder::new(&bytes[..]);
    let mut text = String::new();
    decoder.read_to_string(&mut text).unwrap();
    assert_eq!(text, expected);
}

fuzz_target!(|input: Input| encoder(input));
