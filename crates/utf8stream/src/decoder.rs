//! Streaming UTF-8 to UTF-16 decoder.
//!
//! Overview
//! - Bytes are pulled from the [`ByteSource`] into a fixed read-ahead buffer
//!   and fed one at a time through the automaton in [`crate::dfa`]. Every time
//!   the automaton returns to its accept state a code point is complete and is
//!   emitted as one or two code units.
//! - There is exactly one decode loop, [`Utf8Decoder::decode_into`]. Single
//!   unit reads run it against the internal unit cache; bulk reads drain the
//!   cache and then run it straight against the caller's slice, so bulk reads
//!   never copy twice.
//!
//! Surrogate pairs
//! - A refill of the unit cache stops one slot short of its end. A pair that
//!   starts on the last permitted slot therefore always fits.
//! - A bulk read has no spare slot. When only the high surrogate fits, the low
//!   surrogate is parked in the (empty) unit cache and handed out first by the
//!   next read. Callers see both halves, in order, and nothing is lost.
//!
//! Failure
//! - Units completed before a malformed byte are handed out first, whatever
//!   the read sizes. The reject state is absorbing: from then on every read
//!   reports the same [`DecodeError::MalformedUtf8`].
//! - A source error is returned as soon as nothing decoded earlier in the same
//!   call would be lost; otherwise it is held back and returned by the next
//!   call.

use alloc::{boxed::Box, string::String, vec, vec::Vec};
use core::{convert::Infallible, fmt};

use tracing::{debug, trace};

use crate::{
    ByteSource, DecodeError, DecoderOptions, TruncatedInputMode,
    dfa::{self, ACCEPT, REJECT},
    utf16::{combine_surrogates, is_high_surrogate, is_low_surrogate, split_supplementary},
};

/// Reads UTF-16 code units out of a UTF-8 [`ByteSource`].
///
/// ```rust
/// use utf8stream::Utf8Decoder;
///
/// let mut decoder = Utf8Decoder::new(&b"\xF0\x9F\x9A\x80!"[..]);
/// assert_eq!(decoder.read_unit().unwrap(), Some(0xD83D));
/// assert_eq!(decoder.read_unit().unwrap(), Some(0xDE80));
/// assert_eq!(decoder.read_unit().unwrap(), Some(u16::from(b'!')));
/// assert_eq!(decoder.read_unit().unwrap(), None);
/// ```
pub struct Utf8Decoder<S: ByteSource> {
    source: S,

    // Read-ahead of raw bytes; `byte_pos <= byte_len <= bytes.len()`.
    bytes: Box<[u8]>,
    byte_pos: usize,
    byte_len: usize,
    // Stream position of `bytes[0]`.
    bytes_base: u64,
    eof: bool,

    // Decoded units not yet handed out; `unit_pos <= unit_len <= units.len()`.
    units: Box<[u16]>,
    unit_pos: usize,
    unit_len: usize,

    state: u8,
    code_point: u32,

    // Where and on what the automaton rejected, for repeated reports.
    reject_offset: u64,
    reject_byte: u8,
    deferred: Option<S::Error>,

    truncated_input: TruncatedInputMode,
}

impl<S: ByteSource> Utf8Decoder<S> {
    /// Creates a decoder over `source` with default options.
    pub fn new(source: S) -> Self {
        Self::with_options(source, DecoderOptions::default())
    }

    /// Creates a decoder over `source`.
    ///
    /// # Panics
    ///
    /// Panics if `options.byte_buffer_size` is zero or
    /// `options.unit_buffer_size` is less than two.
    pub fn with_options(source: S, options: DecoderOptions) -> Self {
        assert!(
            options.byte_buffer_size >= DecoderOptions::MIN_BYTE_BUFFER_SIZE,
            "byte buffer must hold at least {} byte",
            DecoderOptions::MIN_BYTE_BUFFER_SIZE
        );
        assert!(
            options.unit_buffer_size >= DecoderOptions::MIN_UNIT_BUFFER_SIZE,
            "unit buffer must hold at least {} code units",
            DecoderOptions::MIN_UNIT_BUFFER_SIZE
        );
        Self {
            source,
            bytes: vec![0; options.byte_buffer_size].into_boxed_slice(),
            byte_pos: 0,
            byte_len: 0,
            bytes_base: 0,
            eof: false,
            units: vec![0; options.unit_buffer_size].into_boxed_slice(),
            unit_pos: 0,
            unit_len: 0,
            state: ACCEPT,
            code_point: 0,
            reject_offset: 0,
            reject_byte: 0,
            deferred: None,
            truncated_input: options.truncated_input,
        }
    }

    /// Returns the next code unit, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::MalformedUtf8`] when the input is not UTF-8. The
    ///   decoder stays failed.
    /// - [`DecodeError::TruncatedInput`] at the end of a source cut off inside
    ///   a sequence, with [`TruncatedInputMode::Fail`].
    /// - [`DecodeError::Io`] when the source fails.
    pub fn read_unit(&mut self) -> Result<Option<u16>, DecodeError<S::Error>> {
        if self.unit_pos >= self.unit_len && !self.fill_units()? {
            return Ok(None);
        }
        let unit = self.units[self.unit_pos];
        self.unit_pos += 1;
        Ok(Some(unit))
    }

    /// Fills `dst` with code units.
    ///
    /// Returns `Some(n)` with the number of units written, or `None` when
    /// nothing was written because the source is exhausted. `n` is less than
    /// `dst.len()` only when the source ran out during this call. An empty
    /// `dst` returns `Some(0)` without touching the source.
    ///
    /// If the last unit written is a high surrogate, its low surrogate is the
    /// first unit of the next read.
    ///
    /// # Errors
    ///
    /// As for [`read_unit`](Self::read_unit). Every unit completed before a
    /// failure is returned before the failure is reported.
    pub fn read_units(&mut self, dst: &mut [u16]) -> Result<Option<usize>, DecodeError<S::Error>> {
        if dst.is_empty() {
            return Ok(Some(0));
        }

        let cached = self.unit_len - self.unit_pos;
        let copied = cached.min(dst.len());
        dst[..copied].copy_from_slice(&self.units[self.unit_pos..self.unit_pos + copied]);
        self.unit_pos += copied;
        if copied == dst.len() {
            return Ok(Some(copied));
        }

        let rest = &mut dst[copied..];
        let limit = rest.len();
        match self.decode_into(rest, limit) {
            Ok(Some(n)) => Ok(Some(copied + n)),
            Ok(None) => Ok((copied > 0).then_some(copied)),
            Err(err) if copied == 0 => Err(err),
            Err(DecodeError::Io(err)) => {
                self.deferred = Some(err);
                Ok(Some(copied))
            }
            // Fatal errors are sticky and will be reported again.
            Err(_) => Ok(Some(copied)),
        }
    }

    /// Reads one Unicode scalar, joining a surrogate pair.
    ///
    /// A bulk read that ended on a high surrogate leaves its low half as the
    /// next unit. That half cannot form a scalar on its own and is returned as
    /// [`char::REPLACEMENT_CHARACTER`].
    ///
    /// # Errors
    ///
    /// As for [`read_unit`](Self::read_unit).
    pub fn read_char(&mut self) -> Result<Option<char>, DecodeError<S::Error>> {
        let Some(unit) = self.read_unit()? else {
            return Ok(None);
        };
        let scalar = if is_high_surrogate(unit) {
            match self.read_unit()? {
                Some(low) if is_low_surrogate(low) => combine_surrogates(unit, low),
                _ => unreachable!("high surrogate emitted without its low half"),
            }
        } else {
            u32::from(unit)
        };
        Ok(Some(char::from_u32(scalar).unwrap_or(char::REPLACEMENT_CHARACTER)))
    }

    /// Appends everything left in the stream to `out`.
    ///
    /// Returns the number of code units consumed.
    ///
    /// # Errors
    ///
    /// As for [`read_unit`](Self::read_unit). Text decoded before the error
    /// remains in `out`.
    pub fn read_to_string(&mut self, out: &mut String) -> Result<usize, DecodeError<S::Error>> {
        const CHUNK: usize = 512;
        // One extra slot for the low half of a pair split by `read_units`.
        let mut chunk = [0u16; CHUNK + 1];
        let mut total = 0;
        while let Some(mut n) = self.read_units(&mut chunk[..CHUNK])? {
            if is_high_surrogate(chunk[n - 1]) {
                if let Some(low) = self.read_unit()? {
                    chunk[n] = low;
                    n += 1;
                }
            }
            out.extend(
                char::decode_utf16(chunk[..n].iter().copied())
                    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
            );
            total += n;
        }
        Ok(total)
    }

    /// Iterates over the remaining code units.
    ///
    /// The iterator ends after yielding the first error.
    pub fn units(&mut self) -> Units<'_, S> {
        Units {
            decoder: self,
            done: false,
        }
    }

    /// Number of bytes taken from the source and fed through the automaton,
    /// including those of a sequence still in progress.
    #[must_use]
    pub fn byte_offset(&self) -> u64 {
        self.bytes_base + self.byte_pos as u64
    }

    /// Borrows the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Returns the underlying source without closing it. Read-ahead bytes and
    /// cached units are lost.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Closes the underlying source. Unread units are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Io`] when closing the source fails.
    pub fn close(self) -> Result<(), DecodeError<S::Error>> {
        let mut source = self.source;
        source.close().map_err(DecodeError::Io)
    }

    /// Refills the unit cache. Returns `false` at the end of the stream.
    fn fill_units(&mut self) -> Result<bool, DecodeError<S::Error>> {
        self.unit_pos = 0;
        self.unit_len = 0;
        let mut units = core::mem::take(&mut self.units);
        let limit = units.len() - 1;
        let decoded = self.decode_into(&mut units, limit);
        self.units = units;
        match decoded? {
            Some(n) => {
                trace!(units = n, "refilled unit cache");
                self.unit_len = n;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Decodes into `dst` until at least `limit` units are written or the
    /// source is exhausted.
    ///
    /// A surrogate pair may start below `limit` and end above it, as long as
    /// it fits in `dst`. If it does not fit, the low surrogate goes to the
    /// unit cache, which the caller must have drained.
    ///
    /// Returns `None` when the source is exhausted before any unit is written.
    fn decode_into(
        &mut self,
        dst: &mut [u16],
        limit: usize,
    ) -> Result<Option<usize>, DecodeError<S::Error>> {
        debug_assert!(limit <= dst.len());
        if self.state == REJECT {
            return Err(self.malformed());
        }
        if let Some(err) = self.deferred.take() {
            return Err(DecodeError::Io(err));
        }

        let mut written = 0;
        while written < limit {
            if self.byte_pos >= self.byte_len {
                match self.refill_bytes() {
                    Ok(true) => {}
                    Ok(false) => return self.finish(written),
                    Err(err) if written == 0 => return Err(DecodeError::Io(err)),
                    Err(err) => {
                        self.deferred = Some(err);
                        return Ok(Some(written));
                    }
                }
            }

            let mut state = self.state;
            let mut code_point = self.code_point;
            let mut pos = self.byte_pos;
            while pos < self.byte_len && written < limit {
                let byte = self.bytes[pos];
                pos += 1;
                state = dfa::step(state, &mut code_point, byte);
                if state == ACCEPT {
                    if let Ok(unit) = u16::try_from(code_point) {
                        dst[written] = unit;
                        written += 1;
                    } else {
                        let (high, low) = split_supplementary(code_point);
                        dst[written] = high;
                        written += 1;
                        if written < dst.len() {
                            dst[written] = low;
                            written += 1;
                        } else {
                            self.stash(low);
                        }
                    }
                } else if state == REJECT {
                    self.state = REJECT;
                    self.byte_pos = pos;
                    self.reject_offset = self.byte_offset() - 1;
                    self.reject_byte = byte;
                    debug!(
                        offset = self.reject_offset,
                        byte, "rejected malformed UTF-8 sequence"
                    );
                    // Hand out what was decoded; the next call fails.
                    if written > 0 {
                        return Ok(Some(written));
                    }
                    return Err(self.malformed());
                }
            }
            self.state = state;
            self.code_point = code_point;
            self.byte_pos = pos;
        }
        Ok(Some(written))
    }

    /// Pulls the next block of bytes. Returns `false` at the end of the
    /// stream; the end is sticky and the source is not asked again.
    fn refill_bytes(&mut self) -> Result<bool, S::Error> {
        if self.eof {
            return Ok(false);
        }
        self.bytes_base += self.byte_len as u64;
        self.byte_pos = 0;
        self.byte_len = 0;
        let n = self.source.read(&mut self.bytes)?;
        if n == 0 {
            trace!(offset = self.bytes_base, "byte source exhausted");
            self.eof = true;
            return Ok(false);
        }
        debug_assert!(n <= self.bytes.len(), "source overfilled the buffer");
        self.byte_len = n.min(self.bytes.len());
        trace!(bytes = self.byte_len, "refilled byte buffer");
        Ok(true)
    }

    /// End of stream reached after writing `written` units.
    fn finish(&mut self, written: usize) -> Result<Option<usize>, DecodeError<S::Error>> {
        if self.state != ACCEPT {
            let offset = self.byte_offset();
            match self.truncated_input {
                TruncatedInputMode::Discard => {
                    debug!(offset, "discarding truncated UTF-8 sequence at end of input");
                    self.state = ACCEPT;
                    self.code_point = 0;
                }
                // Hand out what was decoded; the next call fails.
                TruncatedInputMode::Fail if written > 0 => {}
                TruncatedInputMode::Fail => {
                    debug!(offset, "truncated UTF-8 sequence at end of input");
                    return Err(DecodeError::TruncatedInput { offset });
                }
            }
        }
        Ok((written > 0).then_some(written))
    }

    fn stash(&mut self, low: u16) {
        debug_assert_eq!(self.unit_pos, self.unit_len, "unit cache not drained");
        debug_assert!(!self.units.is_empty(), "no cache to stash into");
        self.units[0] = low;
        self.unit_pos = 0;
        self.unit_len = 1;
    }

    fn malformed(&self) -> DecodeError<S::Error> {
        DecodeError::MalformedUtf8 {
            offset: self.reject_offset,
            byte: self.reject_byte,
        }
    }
}

impl<S: ByteSource + fmt::Debug> fmt::Debug for Utf8Decoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utf8Decoder")
            .field("source", &self.source)
            .field("byte_offset", &self.byte_offset())
            .field("buffered_bytes", &(self.byte_len - self.byte_pos))
            .field("cached_units", &(self.unit_len - self.unit_pos))
            .field("state", &self.state)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

/// Iterator over the code units of a [`Utf8Decoder`], created by
/// [`Utf8Decoder::units`].
pub struct Units<'a, S: ByteSource> {
    decoder: &'a mut Utf8Decoder<S>,
    done: bool,
}

impl<S: ByteSource> Iterator for Units<'_, S> {
    type Item = Result<u16, DecodeError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.decoder.read_unit().transpose();
        self.done = !matches!(item, Some(Ok(_)));
        item
    }
}

impl<S: ByteSource> core::iter::FusedIterator for Units<'_, S> {}

/// Decodes a complete UTF-8 buffer into code units.
///
/// ```rust
/// let units = utf8stream::decode_utf8(b"\xE2\x82\xAC1").unwrap();
/// assert_eq!(units, [0x20AC, 0x31]);
/// ```
///
/// # Errors
///
/// [`DecodeError::MalformedUtf8`] when `bytes` is not UTF-8.
pub fn decode_utf8(bytes: &[u8]) -> Result<Vec<u16>, DecodeError<Infallible>> {
    decode_utf8_with_options(bytes, DecoderOptions::default())
}

/// [`decode_utf8`] with explicit options. Buffer sizes are capped to what
/// `bytes` needs.
///
/// # Errors
///
/// [`DecodeError::MalformedUtf8`] when `bytes` is not UTF-8, and
/// [`DecodeError::TruncatedInput`] for a cut-off tail with
/// [`TruncatedInputMode::Fail`].
pub fn decode_utf8_with_options(
    bytes: &[u8],
    options: DecoderOptions,
) -> Result<Vec<u16>, DecodeError<Infallible>> {
    let options = DecoderOptions {
        byte_buffer_size: options.byte_buffer_size.min(bytes.len()).max(1),
        unit_buffer_size: DecoderOptions::MIN_UNIT_BUFFER_SIZE,
        ..options
    };
    // Never more units than bytes, so pairs always fit.
    let mut out = vec![0u16; bytes.len()];
    let mut len = 0;
    let mut decoder = Utf8Decoder::with_options(bytes, options);
    while len < out.len() {
        match decoder.read_units(&mut out[len..])? {
            Some(n) => len += n,
            None => break,
        }
    }
    out.truncate(len);
    Ok(out)
}
