//! Call-scoped streaming capabilities: byte sources and byte sinks.
//!
//! Upload payloads reach the engine through a [`ByteSource`] and downloads
//! leave through a [`ByteSink`], chunk by chunk, so neither side ever
//! materializes the full payload. Both traits are capability objects with a
//! documented contract:
//!
//! - **Call-scoped lifetime.** A source or sink is valid only for the single
//!   operation call that received it. The engine never retains one past that
//!   call's return, and no background thread may hold on to it.
//! - **Sequential invocation.** Within one operation, calls against the same
//!   source/sink are strictly sequential; implementations need no internal
//!   locking against themselves.
//! - **Errors abort.** Any error from a source or sink is a hard failure of
//!   the surrounding operation; the engine does not retry.

use crate::error::BridgeError;
use std::io::SeekFrom;

/// A readable, optionally seekable byte source supplied by the caller.
pub trait ByteSource {
    /// Fill `buf` with up to `buf.len()` bytes, returning how many were
    /// placed. A return of 0 means end of stream (transient-empty signals are
    /// not part of this contract). A zero-length `buf` is a no-op returning 0.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError>;

    /// Reposition the source, returning the resulting absolute offset.
    /// Sources that cannot seek must return [`BridgeError::SourceNotSeekable`]
    /// rather than silently succeeding at the wrong position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BridgeError>;
}

/// A writable byte sink supplied by the caller.
pub trait ByteSink {
    /// Consume the entire buffer or fail. Implementations backed by partial
    /// writers (sockets, pipes) must loop internally; the engine-facing
    /// contract is fully-written-or-failed.
    fn write(&mut self, buf: &[u8]) -> Result<(), BridgeError>;
}

/// Compute the remaining length of a seekable source using the
/// seek-to-end, record, seek-back convention, restoring the current position.
pub fn source_len(source: &mut dyn ByteSource) -> Result<u64, BridgeError> {
    let here = source.seek(SeekFrom::Current(0))?;
    let end = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(here))?;
    Ok(end.saturating_sub(here))
}

/// Adapter exposing any `std::io::Read + Seek` value as a [`ByteSource`].
/// Used by the filesystem convenience operations and by Rust-side embedders.
pub struct IoSource<R> {
    inner: R,
}

impl<R: std::io::Read + std::io::Seek> IoSource<R> {
    pub fn new(inner: R) -> Self {
        IoSource { inner }
    }
}

impl<R: std::io::Read + std::io::Seek> ByteSource for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.inner.read(buf).map_err(BridgeError::backend)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BridgeError> {
        self.inner.seek(pos).map_err(BridgeError::backend)
    }
}

/// Adapter exposing any `std::io::Write` value as a [`ByteSink`].
pub struct IoSink<W> {
    inner: W,
}

impl<W: std::io::Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        IoSink { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: std::io::Write> ByteSink for IoSink<W> {
    fn write(&mut self, buf: &[u8]) -> Result<(), BridgeError> {
        self.inner.write_all(buf).map_err(BridgeError::backend)
    }
}

/// In-memory source over a borrowed byte slice, seekable in all three
/// whence modes. Backs the blob upload path.
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = &self.data[self.pos.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BridgeError> {
        let len = self.data.len() as i64;
        let target = match pos {
            SeekFrom::Start(off) => off as i64,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
            SeekFrom::End(delta) => len + delta,
        };
        if target < 0 {
            return Err(BridgeError::SourceSeek(target));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }
}

/// In-memory sink collecting everything written. Backs the blob download path.
#[derive(Default)]
pub struct VecSink {
    data: Vec<u8>,
}

impl VecSink {
    pub fn new() -> Self {
        VecSink::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl ByteSink for VecSink {
    fn write(&mut self, buf: &[u8]) -> Result<(), BridgeError> {
        self.data.extend_from_slice(buf);
        Ok(())
    }
}
