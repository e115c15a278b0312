//! The result envelope every boundary call returns.
//!
//! A [`SafeResult`] carries either a JSON payload or an error string, both as
//! C strings allocated on this side of the boundary. Ownership transfers to
//! the caller exactly once per call: the caller must release the envelope
//! with [`safebridge_result_free`] after use. Releasing twice is undefined
//! behavior; releasing an envelope whose fields are null is a safe no-op.

use crate::error::BridgeError;
use serde::Serialize;
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of a boundary call: a JSON `payload` on success (null for void
/// operations) or a human-readable `error`, never both.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SafeResult {
    /// JSON-serialized success payload, or null
    pub payload: *mut c_char,
    /// Error description, or null
    pub error: *mut c_char,
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s)
        .unwrap_or_else(|_| CString::new("(text contained null byte)").unwrap_or_default())
        .into_raw()
}

impl SafeResult {
    /// Success with no payload.
    pub(crate) fn void() -> Self {
        SafeResult {
            payload: std::ptr::null_mut(),
            error: std::ptr::null_mut(),
        }
    }

    /// Success carrying a JSON-serialized payload.
    pub(crate) fn ok<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => SafeResult {
                payload: into_c_string(json),
                error: std::ptr::null_mut(),
            },
            Err(e) => Self::failure(&BridgeError::Serialization(e.to_string())),
        }
    }

    /// Failure carrying the error's description verbatim.
    pub(crate) fn failure(err: &BridgeError) -> Self {
        SafeResult {
            payload: std::ptr::null_mut(),
            error: into_c_string(err.to_string()),
        }
    }

    pub(crate) fn is_error(&self) -> bool {
        !self.error.is_null()
    }
}

/// Release both text buffers owned by this envelope, consuming it.
pub(crate) fn release(result: SafeResult) {
    if !result.payload.is_null() {
        // SAFETY: payload was produced by CString::into_raw in into_c_string
        drop(unsafe { CString::from_raw(result.payload) });
    }
    if !result.error.is_null() {
        // SAFETY: error was produced by CString::into_raw in into_c_string
        drop(unsafe { CString::from_raw(result.error) });
    }
}

/// Run a boundary operation, converting any panic into a generic error
/// envelope. No call may return without a [`SafeResult`], even on internal
/// failure; unwinding across the C boundary is never allowed.
pub(crate) fn guarded<F>(op: &'static str, f: F) -> SafeResult
where
    F: FnOnce() -> SafeResult,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        tracing::error!(op, "panic caught at boundary");
        SafeResult::failure(&BridgeError::Internal(op))
    })
}

/// Free a result previously returned by any boundary operation.
///
/// Must be called exactly once per returned result. Safe to call on a result
/// whose fields are null (void success); freeing the same result twice is
/// undefined behavior.
///
/// # Safety
///
/// `result` must be exactly as returned by a boundary call, unmodified and
/// not previously freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_result_free(result: SafeResult) {
    let _ = catch_unwind(AssertUnwindSafe(|| release(result)));
}
