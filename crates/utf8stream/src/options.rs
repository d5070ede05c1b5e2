use crate::DEFAULT_BUFFER_SIZE;

/// What the decoder does when the source ends inside a multi-byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TruncatedInputMode {
    /// Silently drop the incomplete tail; the stream simply ends.
    #[default]
    Discard,
    /// Report [`DecodeError::TruncatedInput`](crate::DecodeError::TruncatedInput)
    /// once every complete code unit has been handed out.
    Fail,
}

/// What the encoder does with an unpaired surrogate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LoneSurrogateMode {
    /// Write a single `?` (`0x3F`) in its place.
    #[default]
    Replace,
    /// Report [`EncodeError::LoneSurrogate`](crate::EncodeError::LoneSurrogate).
    Fail,
}

/// Configuration for [`Utf8Decoder`](crate::Utf8Decoder).
///
/// # Examples
///
/// ```rust
/// use utf8stream::{DecoderOptions, TruncatedInputMode, Utf8Decoder};
///
/// let options = DecoderOptions {
///     truncated_input: TruncatedInputMode::Fail,
///     ..Default::default()
/// };
/// let mut decoder = Utf8Decoder::with_options(&b"\xE2\x82"[..], options);
/// assert!(decoder.read_unit().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderOptions {
    /// Size of the read-ahead byte buffer. Must be at least 1.
    ///
    /// # Default
    ///
    /// `8192`
    pub byte_buffer_size: usize,

    /// Size of the decoded code unit cache that backs single-unit reads. Must
    /// be at least 2 so a surrogate pair always fits.
    ///
    /// # Default
    ///
    /// `8192`
    pub unit_buffer_size: usize,

    /// Handling of a multi-byte sequence cut off by the end of the source.
    ///
    /// # Default
    ///
    /// [`TruncatedInputMode::Discard`]
    pub truncated_input: TruncatedInputMode,
}

impl DecoderOptions {
    pub(crate) const MIN_BYTE_BUFFER_SIZE: usize = 1;
    pub(crate) const MIN_UNIT_BUFFER_SIZE: usize = 2;
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            byte_buffer_size: DEFAULT_BUFFER_SIZE,
            unit_buffer_size: DEFAULT_BUFFER_SIZE,
            truncated_input: TruncatedInputMode::default(),
        }
    }
}

/// Configuration for [`Utf8Encoder`](crate::Utf8Encoder).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncoderOptions {
    /// Size of the output byte buffer. Must be at least 4, the longest UTF-8
    /// sequence.
    ///
    /// # Default
    ///
    /// `8192`
    pub buffer_size: usize,

    /// Handling of unpaired surrogates.
    ///
    /// # Default
    ///
    /// [`LoneSurrogateMode::Replace`]
    pub lone_surrogate: LoneSurrogateMode,
}

impl EncoderOptions {
    pub(crate) const MIN_BUFFER_SIZE: usize = 4;
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            lone_surrogate: LoneSurrogateMode::default(),
        }
    }
}
