//! Buffered, streaming UTF-8 codecs over UTF-16 code units.
//!
//! [`Utf8Decoder`] pulls bytes from a [`ByteSource`] and hands out UTF-16 code
//! units, one at a time or in bulk. Validation and decoding happen in a single
//! pass over Bjoern Hoehrmann's UTF-8 automaton, so overlong forms, encoded
//! surrogates, out-of-range scalars and stray continuation bytes are all
//! rejected by the same table lookup that assembles the code point.
//!
//! [`Utf8Encoder`] is the mirror image: it accepts code units, pairs up
//! surrogates and writes UTF-8 to a [`ByteSink`] through a fixed-size buffer.
//!
//! ```rust
//! use utf8stream::{Utf8Decoder, Utf8Encoder};
//!
//! let units: Vec<u16> = "Greek: ΩΣ; 日本語; 🚀".encode_utf16().collect();
//!
//! let mut encoder = Utf8Encoder::new(Vec::new());
//! encoder.write_units(&units).unwrap();
//! let bytes = encoder.into_inner().unwrap();
//! assert_eq!(bytes, "Greek: ΩΣ; 日本語; 🚀".as_bytes());
//!
//! let mut decoder = Utf8Decoder::new(&bytes[..]);
//! let mut decoded = Vec::new();
//! let mut buf = [0u16; 7];
//! while let Some(n) = decoder.read_units(&mut buf).unwrap() {
//!     decoded.extend_from_slice(&buf[..n]);
//! }
//! assert_eq!(decoded, units);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod chunked;
mod decoder;
mod dfa;
mod encoder;
mod error;
mod options;
mod stream;
mod utf16;

#[cfg(test)]
mod tests;

pub use chunked::{ChunkedSource, produce_chunks};
pub use decoder::{Units, Utf8Decoder, decode_utf8, decode_utf8_with_options};
pub use encoder::{Utf8Encoder, encode_utf16, encode_utf16_with_options};
pub use error::{DecodeError, EncodeError};
pub use options::{DecoderOptions, EncoderOptions, LoneSurrogateMode, TruncatedInputMode};
#[cfg(feature = "std")]
pub use stream::{IoSink, IoSource};
pub use stream::{ByteSink, ByteSource};

/// Default size of every internal buffer, in elements.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;
