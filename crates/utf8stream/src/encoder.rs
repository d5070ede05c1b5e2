//! Buffered UTF-16 to UTF-8 encoder.

use alloc::{boxed::Box, vec, vec::Vec};
use core::{convert::Infallible, fmt};

use tracing::{debug, trace};

use crate::{
    ByteSink, EncodeError, EncoderOptions, LoneSurrogateMode,
    utf16::{combine_surrogates, is_high_surrogate, is_low_surrogate, is_surrogate},
};

const REPLACEMENT: u8 = b'?';
/// Longest UTF-8 sequence; the buffer always has this much room before a unit
/// is encoded.
const MAX_SEQUENCE: usize = 4;

/// Writes UTF-16 code units to a [`ByteSink`] as UTF-8.
///
/// A high surrogate is held back until the next unit shows whether it is
/// half of a pair, so a pair may be split across calls freely. Bytes are
/// collected in a fixed buffer and reach the sink when it fills, on
/// [`flush`](Self::flush), [`close`](Self::close) or
/// [`into_inner`](Self::into_inner). Dropping the encoder discards whatever
/// is still buffered.
///
/// ```rust
/// use utf8stream::Utf8Encoder;
///
/// let mut encoder = Utf8Encoder::new(Vec::new());
/// encoder.write_unit(0xD83D).unwrap();
/// encoder.write_unit(0xDE80).unwrap();
/// encoder.write_units(&[0x20AC, 0x31]).unwrap();
/// assert_eq!(encoder.into_inner().unwrap(), b"\xF0\x9F\x9A\x80\xE2\x82\xAC1");
/// ```
pub struct Utf8Encoder<S: ByteSink> {
    sink: S,
    buf: Box<[u8]>,
    pos: usize,
    pending_high: Option<u16>,
    lone_surrogate: LoneSurrogateMode,
}

impl<S: ByteSink> Utf8Encoder<S> {
    /// Creates an encoder over `sink` with default options.
    pub fn new(sink: S) -> Self {
        Self::with_options(sink, EncoderOptions::default())
    }

    /// Creates an encoder over `sink`.
    ///
    /// # Panics
    ///
    /// Panics if `options.buffer_size` is less than four.
    pub fn with_options(sink: S, options: EncoderOptions) -> Self {
        assert!(
            options.buffer_size >= EncoderOptions::MIN_BUFFER_SIZE,
            "buffer must hold at least {} bytes",
            EncoderOptions::MIN_BUFFER_SIZE
        );
        Self {
            sink,
            buf: vec![0; options.buffer_size].into_boxed_slice(),
            pos: 0,
            pending_high: None,
            lone_surrogate: options.lone_surrogate,
        }
    }

    /// Writes a single code unit.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::LoneSurrogate`] with [`LoneSurrogateMode::Fail`] when
    ///   `unit` is a low surrogate without a preceding high one, or when a
    ///   held-back high surrogate is not followed by a low one. In the latter
    ///   case the error names the high surrogate and `unit` itself has still
    ///   been written.
    /// - [`EncodeError::Io`] when flushing a full buffer fails.
    pub fn write_unit(&mut self, unit: u16) -> Result<(), EncodeError<S::Error>> {
        self.reserve()?;
        if let Some(high) = self.pending_high.take() {
            if is_low_surrogate(unit) {
                self.put_supplementary(combine_surrogates(high, unit));
                return Ok(());
            }
            if let Err(err) = self.lone(high) {
                // `unit` is not a low surrogate, so it cannot be lone itself.
                self.write_unit(unit)?;
                return Err(err);
            }
            self.reserve()?;
        }
        if is_high_surrogate(unit) {
            self.pending_high = Some(unit);
            Ok(())
        } else if is_low_surrogate(unit) {
            self.lone(unit)
        } else {
            self.put_bmp(unit);
            Ok(())
        }
    }

    /// Writes every unit of `src`.
    ///
    /// Pairs inside `src` are joined directly. A high surrogate ending `src`
    /// is held back exactly as [`write_unit`](Self::write_unit) would.
    ///
    /// # Errors
    ///
    /// As for [`write_unit`](Self::write_unit). Units up to the failing one
    /// have been consumed, and nothing after it. When the failure is a lone
    /// high surrogate, the unit following it still counts as consumed and has
    /// been written.
    pub fn write_units(&mut self, src: &[u16]) -> Result<(), EncodeError<S::Error>> {
        let mut i = 0;
        while i < src.len() {
            let unit = src[i];
            i += 1;
            if self.pending_high.is_some() {
                self.write_unit(unit)?;
                continue;
            }

            self.reserve()?;
            if !is_surrogate(unit) {
                self.put_bmp(unit);
            } else if is_high_surrogate(unit) {
                match src.get(i) {
                    Some(&low) if is_low_surrogate(low) => {
                        self.put_supplementary(combine_surrogates(unit, low));
                        i += 1;
                    }
                    Some(&next) => {
                        if let Err(err) = self.lone(unit) {
                            self.write_unit(next)?;
                            return Err(err);
                        }
                    }
                    None => self.pending_high = Some(unit),
                }
            } else {
                self.lone(unit)?;
            }
        }
        Ok(())
    }

    /// Writes a Unicode scalar.
    ///
    /// # Errors
    ///
    /// As for [`write_unit`](Self::write_unit); a held-back high surrogate is
    /// resolved as lone first, and `c` is written even when that fails with
    /// [`EncodeError::LoneSurrogate`].
    pub fn write_char(&mut self, c: char) -> Result<(), EncodeError<S::Error>> {
        let resolved = self.resolve_pending();
        if matches!(resolved, Err(EncodeError::Io(_))) {
            return resolved;
        }
        self.reserve()?;
        let n = c.encode_utf8(&mut self.buf[self.pos..]).len();
        self.pos += n;
        resolved
    }

    /// Writes a string, which is already UTF-8 and passes through unchanged.
    ///
    /// # Errors
    ///
    /// As for [`write_char`](Self::write_char).
    pub fn write_str(&mut self, s: &str) -> Result<(), EncodeError<S::Error>> {
        let resolved = self.resolve_pending();
        if matches!(resolved, Err(EncodeError::Io(_))) {
            return resolved;
        }
        let mut rest = s.as_bytes();
        while !rest.is_empty() {
            if self.pos == self.buf.len() {
                self.flush_buffer()?;
            }
            let n = rest.len().min(self.buf.len() - self.pos);
            self.buf[self.pos..self.pos + n].copy_from_slice(&rest[..n]);
            self.pos += n;
            rest = &rest[n..];
        }
        resolved
    }

    /// The high surrogate waiting for its low half, if any.
    #[must_use]
    pub fn pending_surrogate(&self) -> Option<u16> {
        self.pending_high
    }

    /// Sends buffered bytes to the sink and flushes it. A held-back high
    /// surrogate stays pending.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Io`] when the sink fails.
    pub fn flush(&mut self) -> Result<(), EncodeError<S::Error>> {
        self.flush_buffer()?;
        self.sink.flush().map_err(EncodeError::Io)
    }

    /// Resolves a held-back high surrogate as lone, flushes and closes the
    /// sink.
    ///
    /// # Errors
    ///
    /// [`EncodeError::LoneSurrogate`] for a pending high surrogate with
    /// [`LoneSurrogateMode::Fail`], or [`EncodeError::Io`] when the sink
    /// fails. The sink is not closed after a failure.
    pub fn close(mut self) -> Result<(), EncodeError<S::Error>> {
        self.resolve_pending()?;
        self.flush_buffer()?;
        self.sink.close().map_err(EncodeError::Io)
    }

    /// Resolves a held-back high surrogate, writes out the buffer and returns
    /// the sink without flushing or closing it.
    ///
    /// # Errors
    ///
    /// As for [`close`](Self::close).
    pub fn into_inner(mut self) -> Result<S, EncodeError<S::Error>> {
        self.resolve_pending()?;
        self.flush_buffer()?;
        Ok(self.sink)
    }

    /// Borrows the underlying sink. Bytes still in the buffer are not visible
    /// there.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    fn resolve_pending(&mut self) -> Result<(), EncodeError<S::Error>> {
        if self.pending_high.is_some() {
            self.reserve()?;
        }
        match self.pending_high.take() {
            Some(high) => self.lone(high),
            None => Ok(()),
        }
    }

    #[inline]
    fn reserve(&mut self) -> Result<(), EncodeError<S::Error>> {
        if self.pos + MAX_SEQUENCE > self.buf.len() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<(), EncodeError<S::Error>> {
        if self.pos > 0 {
            trace!(bytes = self.pos, "flushing encoder buffer");
            self.sink
                .write_all(&self.buf[..self.pos])
                .map_err(EncodeError::Io)?;
            self.pos = 0;
        }
        Ok(())
    }

    fn lone(&mut self, unit: u16) -> Result<(), EncodeError<S::Error>> {
        match self.lone_surrogate {
            LoneSurrogateMode::Replace => {
                debug!(unit, "replacing unpaired surrogate");
                self.buf[self.pos] = REPLACEMENT;
                self.pos += 1;
                Ok(())
            }
            LoneSurrogateMode::Fail => {
                debug!(unit, "unpaired surrogate");
                Err(EncodeError::LoneSurrogate { unit })
            }
        }
    }

    /// Encodes a non-surrogate BMP unit in 1-3 bytes.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn put_bmp(&mut self, unit: u16) {
        let buf = &mut self.buf[self.pos..];
        if unit < 0x80 {
            buf[0] = unit as u8;
            self.pos += 1;
        } else if unit < 0x800 {
            buf[0] = 0xC0 | (unit >> 6) as u8;
            buf[1] = 0x80 | (unit & 0x3F) as u8;
            self.pos += 2;
        } else {
            buf[0] = 0xE0 | (unit >> 12) as u8;
            buf[1] = 0x80 | ((unit >> 6) & 0x3F) as u8;
            buf[2] = 0x80 | (unit & 0x3F) as u8;
            self.pos += 3;
        }
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn put_supplementary(&mut self, code_point: u32) {
        let buf = &mut self.buf[self.pos..];
        buf[0] = 0xF0 | (code_point >> 18) as u8;
        buf[1] = 0x80 | ((code_point >> 12) & 0x3F) as u8;
        buf[2] = 0x80 | ((code_point >> 6) & 0x3F) as u8;
        buf[3] = 0x80 | (code_point & 0x3F) as u8;
        self.pos += 4;
    }
}

impl<S: ByteSink + fmt::Debug> fmt::Debug for Utf8Encoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utf8Encoder")
            .field("sink", &self.sink)
            .field("buffered", &self.pos)
            .field("pending_high", &self.pending_high)
            .field("lone_surrogate", &self.lone_surrogate)
            .finish_non_exhaustive()
    }
}

/// Encodes a complete code unit sequence to UTF-8.
///
/// ```rust
/// let bytes = utf8stream::encode_utf16(&[0x48, 0x69, 0xDC00]).unwrap();
/// assert_eq!(bytes, b"Hi?");
/// ```
///
/// # Errors
///
/// Only with [`LoneSurrogateMode::Fail`], see [`encode_utf16_with_options`].
pub fn encode_utf16(src: &[u16]) -> Result<Vec<u8>, EncodeError<Infallible>> {
    encode_utf16_with_options(src, EncoderOptions::default())
}

/// [`encode_utf16`] with explicit options. The buffer size is capped to what
/// `src` needs.
///
/// # Errors
///
/// [`EncodeError::LoneSurrogate`] for an unpaired surrogate with
/// [`LoneSurrogateMode::Fail`]; a high surrogate ending `src` counts as
/// unpaired.
pub fn encode_utf16_with_options(
    src: &[u16],
    options: EncoderOptions,
) -> Result<Vec<u8>, EncodeError<Infallible>> {
    let needed = src.len().saturating_mul(3).max(EncoderOptions::MIN_BUFFER_SIZE);
    let options = EncoderOptions {
        buffer_size: options.buffer_size.min(needed),
        ..options
    };
    let mut encoder = Utf8Encoder::with_options(Vec::with_capacity(src.len()), options);
    encoder.write_units(src)?;
    encoder.into_inner()
}
