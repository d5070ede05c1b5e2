use bstr::BStr;
use thiserror::Error;

/// Failure while decoding UTF-8.
///
/// `E` is the error type of the wrapped [`ByteSource`](crate::ByteSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError<E> {
    /// The automaton rejected `byte` at absolute stream position `offset`.
    ///
    /// The decoder is unusable afterwards; every later read reports the same
    /// error.
    #[error("malformed UTF-8: unexpected byte {:?} at offset {offset}", byte_str(.byte))]
    MalformedUtf8 {
        /// Position of `byte` counted from the start of the stream.
        offset: u64,
        /// The byte that drove the automaton into its error state.
        byte: u8,
    },
    /// The source ended in the middle of a multi-byte sequence. Only reported
    /// with [`TruncatedInputMode::Fail`](crate::TruncatedInputMode::Fail).
    #[error("truncated UTF-8 sequence at end of input (offset {offset})")]
    TruncatedInput {
        /// Stream length, where the incomplete sequence was cut off.
        offset: u64,
    },
    /// The byte source failed.
    #[error("byte source error: {0}")]
    Io(E),
}

/// Failure while encoding UTF-16 code units.
///
/// `E` is the error type of the wrapped [`ByteSink`](crate::ByteSink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError<E> {
    /// An unpaired surrogate was written. Only reported with
    /// [`LoneSurrogateMode::Fail`](crate::LoneSurrogateMode::Fail).
    #[error("unpaired surrogate U+{unit:04X}")]
    LoneSurrogate {
        /// The offending code unit.
        unit: u16,
    },
    /// The byte sink failed.
    #[error("byte sink error: {0}")]
    Io(E),
}

impl<E> DecodeError<E> {
    /// Whether the decoder that produced this error can no longer make
    /// progress.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

fn byte_str(byte: &u8) -> &BStr {
    BStr::new(core::slice::from_ref(byte))
}
