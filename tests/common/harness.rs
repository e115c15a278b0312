//! Scriptable C bridges and envelope helpers.
//!
//! `SourceState` and `SinkState` are the contexts behind the extern "C"
//! callbacks. They can be configured to deliver data in small chunks, to fail
//! after a set number of calls, or to refuse seeking, so tests can drive the
//! boundary through both its happy and unhappy paths.

#![allow(dead_code)]

use safebridge::ffi::{
    safebridge_open, safebridge_result_free, CReader, CWriter, SafeResult, SeekFn,
};
use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};

/// Context for a scripted reader bridge.
pub struct SourceState {
    pub data: Vec<u8>,
    pub pos: usize,
    /// Deliver at most this many bytes per read call
    pub max_chunk: usize,
    /// Return the error sentinel once this many read calls have happened
    pub fail_after: Option<usize>,
    /// Read calls observed so far
    pub calls: usize,
}

impl SourceState {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        SourceState {
            data: data.into(),
            pos: 0,
            max_chunk: usize::MAX,
            fail_after: None,
            calls: 0,
        }
    }

    pub fn chunked(data: impl Into<Vec<u8>>, max_chunk: usize) -> Self {
        SourceState {
            max_chunk,
            ..Self::new(data)
        }
    }
}

pub unsafe extern "C" fn source_read(ctx: *mut c_void, buf: *mut c_void, len: c_int) -> c_int {
    let state = unsafe { &mut *(ctx as *mut SourceState) };
    state.calls += 1;
    if let Some(limit) = state.fail_after {
        if state.calls > limit {
            return -1;
        }
    }
    let remaining = &state.data[state.pos.min(state.data.len())..];
    let n = remaining.len().min(len as usize).min(state.max_chunk);
    unsafe { std::ptr::copy_nonoverlapping(remaining.as_ptr(), buf as *mut u8, n) };
    state.pos += n;
    n as c_int
}

pub unsafe extern "C" fn source_seek(ctx: *mut c_void, offset: i64, whence: c_int) -> i64 {
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

/// Build a reader bridge over `state`. A non-seekable reader simply leaves
/// the seek slot empty, matching hosts that wrap pipes or sockets.
pub fn reader_for(state: &mut SourceState, seekable: bool) -> CReader {
    CReader {
        ctx: state as *mut SourceState as *mut c_void,
        read: Some(source_read),
        seek: seekable.then_some(source_seek as SeekFn),
    }
}

/// Context for a scripted writer bridge.
pub struct SinkState {
    pub data: Vec<u8>,
    /// Accept at most this many bytes per write call (forces partial writes)
    pub max_chunk: usize,
    /// Return the error sentinel once this many write calls have happened
    pub fail_after: Option<usize>,
    /// Write calls observed so far
    pub calls: usize,
}

impl SinkState {
    pub fn new() -> Self {
        SinkState {
            data: Vec::new(),
            max_chunk: usize::MAX,
            fail_after: None,
            calls: 0,
        }
    }
}

pub unsafe extern "C" fn sink_write(ctx: *mut c_void, buf: *const c_void, len: c_int) -> c_int {
    let state = unsafe { &mut *(ctx as *mut SinkState) };
    state.calls += 1;
    if let Some(limit) = state.fail_after {
        if state.calls > limit {
            return -1;
        }
    }
    let n = (len as usize).min(state.max_chunk);
    let slice = unsafe { std::slice::from_raw_parts(buf as *const u8, n) };
    state.data.extend_from_slice(slice);
    n as c_int
}

pub fn writer_for(state: &mut SinkState) -> CWriter {
    CWriter {
        ctx: state as *mut SinkState as *mut c_void,
        write: Some(sink_write),
    }
}

pub fn cstr(s: &str) -> CString {
    CString::new(s).expect("test string without nul")
}

pub fn payload_str(result: &SafeResult) -> Option<String> {
    if result.payload.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(result.payload) }
            .to_string_lossy()
            .into_owned(),
    )
}

pub fn error_str(result: &SafeResult) -> Option<String> {
    if result.error.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(result.error) }
            .to_string_lossy()
            .into_owned(),
    )
}

/// Free the envelope, returning its payload on success or its error text on
/// failure.
pub fn consume(result: SafeResult) -> Result<Option<String>, String> {
    let outcome = match error_str(&result) {
        Some(err) => Err(err),
        None => Ok(payload_str(&result)),
    };
    unsafe { safebridge_result_free(result) };
    outcome
}

/// Unwrap a success payload as parsed JSON, panicking on an error envelope.
pub fn consume_json(result: SafeResult) -> serde_json::Value {
    let payload = consume(result)
        .expect("operation should succeed")
        .expect("operation should carry a payload");
    serde_json::from_str(&payload).expect("payload should be valid JSON")
}

/// Open a fresh in-memory safe and return its handle.
pub fn open_mem(name: &str) -> i64 {
    let params = cstr(&format!(
        r#"{{"name":"{name}","url":"mem://","creator":"alice"}}"#
    ));
    let value = consume_json(unsafe { safebridge_open(params.as_ptr()) });
    value["handle"].as_i64().expect("open payload has a handle")
}
