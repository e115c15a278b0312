//! C-compatible streaming bridges.
//!
//! A [`CReader`] or [`CWriter`] is a caller-built struct of an opaque context
//! pointer plus function pointers, mirroring a capability object passed
//! across languages. The adapters below wrap them as [`ByteSource`] /
//! [`ByteSink`] for the engine. Negative returns from the callbacks are the
//! error sentinel and abort the surrounding operation.
//!
//! Bridges are strictly call-scoped: the adapters borrow the C struct and
//! nothing here retains the pointers past the boundary call that supplied
//! them.

use crate::error::BridgeError;
use crate::stream::{ByteSink, ByteSource};
use std::io::SeekFrom;
use std::os::raw::{c_int, c_void};

/// `read(ctx, buf, len)` — fill up to `len` bytes, return the count placed,
/// 0 at end of stream, negative on error.
pub type ReadFn = unsafe extern "C" fn(ctx: *mut c_void, buf: *mut c_void, len: c_int) -> c_int;

/// `seek(ctx, offset, whence)` — reposition (whence 0=start, 1=current,
/// 2=end), return the new absolute offset, negative on error or when the
/// source cannot seek.
pub type SeekFn = unsafe extern "C" fn(ctx: *mut c_void, offset: i64, whence: c_int) -> i64;

/// `write(ctx, buf, len)` — consume up to `len` bytes, return the count
/// consumed, negative on error.
pub type WriteFn = unsafe extern "C" fn(ctx: *mut c_void, buf: *const c_void, len: c_int) -> c_int;

const WHENCE_SET: c_int = 0;
const WHENCE_CUR: c_int = 1;
const WHENCE_END: c_int = 2;

/// Caller-supplied byte source for upload operations.
///
/// Valid only for the duration of the single call it is passed to; the
/// engine never stores it.
#[repr(C)]
pub struct CReader {
    /// Opaque caller-owned context, passed back to every callback
    pub ctx: *mut c_void,
    pub read: Option<ReadFn>,
    pub seek: Option<SeekFn>,
}

/// Caller-supplied byte sink for download operations. Same per-call lifetime
/// scoping as [`CReader`].
#[repr(C)]
pub struct CWriter {
    /// Opaque caller-owned context, passed back to every callback
    pub ctx: *mut c_void,
    pub write: Option<WriteFn>,
}

/// Adapter presenting a [`CReader`] as a [`ByteSource`]. The read pointer is
/// unwrapped once at construction so a bridge without one is rejected before
/// any engine work happens.
pub(crate) struct CallbackSource<'a> {
    reader: &'a CReader,
    read: ReadFn,
}

impl<'a> CallbackSource<'a> {
    pub(crate) fn new(reader: &'a CReader) -> Result<Self, BridgeError> {
        let read = reader
            .read
            .ok_or(BridgeError::NullArgument("reader.read"))?;
        Ok(CallbackSource { reader, read })
    }
}

impl ByteSource for CallbackSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len().min(c_int::MAX as usize) as c_int;
        // SAFETY: buf is valid for len bytes; the callback contract is that
        // it writes at most len bytes into it
        let status = unsafe { (self.read)(self.reader.ctx, buf.as_mut_ptr() as *mut c_void, len) };
        if status < 0 {
            return Err(BridgeError::SourceRead(status as i64));
        }
        if status > len {
            // Misbehaving bridge claiming more than the buffer holds
            return Err(BridgeError::SourceRead(status as i64));
        }
        Ok(status as usize)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, BridgeError> {
        let seek = self.reader.seek.ok_or(BridgeError::SourceNotSeekable)?;
        let (offset, whence) = match pos {
            SeekFrom::Start(off) => (off as i64, WHENCE_SET),
            SeekFrom::Current(delta) => (delta, WHENCE_CUR),
            SeekFrom::End(delta) => (delta, WHENCE_END),
        };
        // SAFETY: ctx is the caller's opaque pointer, passed back untouched
        let status = unsafe { seek(self.reader.ctx, offset, whence) };
        if status < 0 {
            return Err(BridgeError::SourceSeek(status));
        }
        Ok(status as u64)
    }
}

/// Adapter presenting a [`CWriter`] as a [`ByteSink`].
///
/// Partial writes by the sink are looped here, so the engine-facing contract
/// stays fully-written-or-failed.
pub(crate) struct CallbackSink<'a> {
    writer: &'a CWriter,
    write: WriteFn,
}

impl<'a> CallbackSink<'a> {
    pub(crate) fn new(writer: &'a CWriter) -> Result<Self, BridgeError> {
        let write = writer
            .write
            .ok_or(BridgeError::NullArgument("writer.write"))?;
        Ok(CallbackSink { writer, write })
    }
}

impl ByteSink for CallbackSink<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<(), BridgeError> {
        let mut done = 0usize;
        while done < buf.len() {
            let remaining = &buf[done..];
            let len = remaining.len().min(c_int::MAX as usize) as c_int;
            // SAFETY: remaining is valid for len bytes and outlives the call
            let status =
                unsafe { (self.write)(self.writer.ctx, remaining.as_ptr() as *const c_void, len) };
            if status <= 0 {
                // Zero progress would loop forever; treat it as failure too
                return Err(BridgeError::SinkWrite(status as i64));
            }
            done += (status as usize).min(remaining.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SourceState {
        data: Vec<u8>,
        pos: usize,
    }

    unsafe extern "C" fn src_read(ctx: *mut c_void, buf: *mut c_void, len: c_int) -> c_int {
        let state = unsafe { &mut *(ctx as *mut SourceState) };
        let remaining = &state.data[state.pos..];
        let n = remaining.len().min(len as usize);
        unsafe { std::ptr::copy_nonoverlapping(remaining.as_ptr(), buf as *mut u8, n) };
        state.pos += n;
        n as c_int
    }

    unsafe extern "C" fn src_seek(ctx: *mut c_void, offset: i64, whence: c_int) -> i64 {
        let state = unsafe { &mut *(ctx as *mut SourceState) };
        let base = match whence {
            0 => 0,
            1 => state.pos as i64,
            2 => state.data.len() as i64,
            _ => return -1,
        };
        let target = base + offset;
        if target < 0 {
            return -1;
        }
        state.pos = target as usize;
        state.pos as i64
    }

    unsafe extern "C" fn failing_read(_: *mut c_void, _: *mut c_void, _: c_int) -> c_int {
        -5
    }

    struct SinkState {
        data: Vec<u8>,
        max_chunk: usize,
    }

    unsafe extern "C" fn sink_write_partial(
        ctx: *mut c_void,
        buf: *const c_void,
        len: c_int,
    ) -> c_int {
        let state = unsafe { &mut *(ctx as *mut SinkState) };
        let n = (len as usize).min(state.max_chunk);
        let slice = unsafe { std::slice::from_raw_parts(buf as *const u8, n) };
        state.data.extend_from_slice(slice);
        n as c_int
    }

    unsafe extern "C" fn sink_write_fail(_: *mut c_void, _: *const c_void, _: c_int) -> c_int {
        -9
    }

    #[test]
    fn test_callback_source_reads_and_seeks() {
        let mut state = SourceState {
            data: b"bridge payload".to_vec(),
            pos: 0,
        };
        let reader = CReader {
            ctx: &mut state as *mut SourceState as *mut c_void,
            read: Some(src_read),
            seek: Some(src_seek),
        };
        let mut source = CallbackSource::new(&reader).unwrap();

        let mut buf = [0u8; 6];
        assert_eq!(source.read(&mut buf).unwrap(), 6);
        assert_eq!(&buf, b"bridge");

        assert_eq!(source.seek(SeekFrom::End(0)).unwrap(), 14);
        assert_eq!(source.seek(SeekFrom::Start(7)).unwrap(), 7);
        let mut rest = [0u8; 7];
        assert_eq!(source.read(&mut rest).unwrap(), 7);
        assert_eq!(&rest, b"payload");
    }

    #[test]
    fn test_callback_source_zero_len_read_skips_callback() {
        // A zero-size read request must be a no-op returning zero, without
        // ever reaching the C callback (failing_read would return an error).
        let reader = CReader {
            ctx: std::ptr::null_mut(),
            read: Some(failing_read),
            seek: None,
        };
        let mut source = CallbackSource::new(&reader).unwrap();
        let mut empty = [0u8; 0];
        assert_eq!(source.read(&mut empty).unwrap(), 0);
    }

    #[test]
    fn test_callback_source_negative_sentinel_is_error() {
        let reader = CReader {
            ctx: std::ptr::null_mut(),
            read: Some(failing_read),
            seek: None,
        };
        let mut source = CallbackSource::new(&reader).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf).unwrap_err(), BridgeError::SourceRead(-5));
    }

    #[test]
    fn test_callback_source_without_seek_is_not_seekable() {
        let reader = CReader {
            ctx: std::ptr::null_mut(),
            read: Some(failing_read),
            seek: None,
        };
        let mut source = CallbackSource::new(&reader).unwrap();
        assert_eq!(
            source.seek(SeekFrom::Start(0)).unwrap_err(),
            BridgeError::SourceNotSeekable
        );
    }

    #[test]
    fn test_missing_read_fn_rejected_up_front() {
        let reader = CReader {
            ctx: std::ptr::null_mut(),
            read: None,
            seek: None,
        };
        assert!(matches!(
            CallbackSource::new(&reader),
            Err(BridgeError::NullArgument(_))
        ));
    }

    #[test]
    fn test_callback_sink_loops_partial_writes() {
        let mut state = SinkState {
            data: Vec::new(),
            max_chunk: 3,
        };
        let writer = CWriter {
            ctx: &mut state as *mut SinkState as *mut c_void,
            write: Some(sink_write_partial),
        };
        let mut sink = CallbackSink::new(&writer).unwrap();
        sink.write(b"fully written or failed").unwrap();
        assert_eq!(state.data, b"fully written or failed");
    }

    #[test]
    fn test_callback_sink_failure_aborts() {
        let writer = CWriter {
            ctx: std::ptr::null_mut(),
            write: Some(sink_write_fail),
        };
        let mut sink = CallbackSink::new(&writer).unwrap();
        assert_eq!(
            sink.write(b"data").unwrap_err(),
            BridgeError::SinkWrite(-9)
        );
    }
}
