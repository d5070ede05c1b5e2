//! Byte sources and sinks the codecs sit on.
//!
//! The codecs never touch `std::io` directly. They pull from a [`ByteSource`]
//! and push into a [`ByteSink`], so the crate stays usable without `std`; the
//! `std` feature adds [`IoSource`] and [`IoSink`] adapters for
//! [`std::io::Read`] and [`std::io::Write`].

use alloc::vec::Vec;
use core::{convert::Infallible, error::Error};

/// A stream of bytes the decoder reads from.
pub trait ByteSource {
    /// Failure reported by [`read`](Self::read) and [`close`](Self::close).
    type Error: Error;

    /// Reads up to `dst.len()` bytes into the front of `dst`.
    ///
    /// Returns the number of bytes written. For a non-empty `dst`, `Ok(0)`
    /// signals the end of the stream.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the underlying stream reports.
    fn read(&mut self, dst: &mut [u8]) -> Result<usize, Self::Error>;

    /// Releases the stream. The default does nothing.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the underlying stream reports.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A destination for the bytes the encoder produces.
pub trait ByteSink {
    /// Failure reported by every operation.
    type Error: Error;

    /// Writes all of `src`.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the underlying stream reports.
    fn write_all(&mut self, src: &[u8]) -> Result<(), Self::Error>;

    /// Pushes anything the sink itself buffers downstream. The default does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the underlying stream reports.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Flushes and releases the stream. The default only flushes.
    ///
    /// # Errors
    ///
    /// Propagates whatever failure the underlying stream reports.
    fn close(&mut self) -> Result<(), Self::Error> {
        self.flush()
    }
}

impl ByteSource for &[u8] {
    type Error = Infallible;

    fn read(&mut self, dst: &mut [u8]) -> Result<usize, Self::Error> {
        let n = dst.len().min(self.len());
        let (head, tail) = self.split_at(n);
        dst[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    type Error = S::Error;

    fn read(&mut self, dst: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(dst)
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

impl ByteSink for Vec<u8> {
    type Error = Infallible;

    fn write_all(&mut self, src: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(src);
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    type Error = S::Error;

    fn write_all(&mut self, src: &[u8]) -> Result<(), Self::Error> {
        (**self).write_all(src)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}

#[cfg(feature = "std")]
pub use self::io::{IoSink, IoSource};

#[cfg(feature = "std")]
mod io {
    use std::io::{self, ErrorKind, Read, Write};

    use super::{ByteSink, ByteSource};

    /// [`ByteSource`] over any [`std::io::Read`].
    ///
    /// Interrupted reads are retried. The reader is closed by dropping it, so
    /// [`ByteSource::close`] is a no-op.
    #[derive(Debug)]
    pub struct IoSource<R> {
        inner: R,
    }

    impl<R: Read> IoSource<R> {
        /// Wraps `inner`.
        pub fn new(inner: R) -> Self {
            Self { inner }
        }

        /// Returns the wrapped reader.
        pub fn into_inner(self) -> R {
            self.inner
        }
    }

    impl<R: Read> ByteSource for IoSource<R> {
        type Error = io::Error;

        fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
            loop {
                match self.inner.read(dst) {
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    result => return result,
                }
            }
        }
    }

    /// [`ByteSink`] over any [`std::io::Write`].
    ///
    /// [`ByteSink::close`] flushes; the writer itself is closed when the sink
    /// is dropped.
    #[derive(Debug)]
    pub struct IoSink<W> {
        inner: W,
    }

    impl<W: Write> IoSink<W> {
        /// Wraps `inner`.
        pub fn new(inner: W) -> Self {
            Self { inner }
        }

        /// Returns the wrapped writer.
        pub fn into_inner(self) -> W {
            self.inner
        }

        /// Borrows the wrapped writer.
        pub fn get_ref(&self) -> &W {
            &self.inner
        }
    }

    impl<W: Write> ByteSink for IoSink<W> {
        type Error = io::Error;

        fn write_all(&mut self, src: &[u8]) -> io::Result<()> {
            // `Write::write_all` already retries `Interrupted`.
            self.inner.write_all(src)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }
}
