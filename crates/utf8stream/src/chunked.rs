use alloc::vec::Vec;
use core::convert::Infallible;

use crate::ByteSource;

/// Split `payload` into approximately equal-sized chunks.
///
/// Unlike text chunking, boundaries fall anywhere, including inside a
/// multi-byte sequence; that is exactly what the decoder has to cope with.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// A [`ByteSource`] that hands out a byte slice in caller-chosen pieces.
///
/// Each `read` returns at most the next entry of `sizes` (cycled), and never
/// more than the destination holds. A size of zero is treated as one so the
/// source cannot report a premature end of stream.
///
/// ```rust
/// use utf8stream::{ChunkedSource, Utf8Decoder};
///
/// // Deliver "€" one byte at a time.
/// let source = ChunkedSource::new("€".as_bytes(), vec![1]);
/// let mut decoder = Utf8Decoder::new(source);
/// assert_eq!(decoder.read_unit().unwrap(), Some(0x20AC));
/// assert_eq!(decoder.read_unit().unwrap(), None);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkedSource<'a> {
    data: &'a [u8],
    sizes: Vec<usize>,
    next: usize,
}

impl<'a> ChunkedSource<'a> {
    /// Serves `data` in pieces of `sizes`. An empty `sizes` serves everything
    /// at once.
    #[must_use]
    pub fn new(data: &'a [u8], sizes: Vec<usize>) -> Self {
        Self {
            data,
            sizes,
            next: 0,
        }
    }

    /// Bytes not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    fn next_size(&mut self) -> usize {
        if self.sizes.is_empty() {
            return usize::MAX;
        }
        let size = self.sizes[self.next % self.sizes.len()];
        self.next = self.next.wrapping_add(1);
        size.max(1)
    }
}

impl ByteSource for ChunkedSource<'_> {
    type Error = Infallible;

    fn read(&mut self, dst: &mut [u8]) -> Result<usize, Infallible> {
        if dst.is_empty() {
            return Ok(0);
        }
        let limit = self.next_size().min(dst.len());
        let mut data = self.data;
        let n = data.read(&mut dst[..limit])?;
        self.data = data;
        Ok(n)
    }
}
