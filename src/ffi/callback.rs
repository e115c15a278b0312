//! Completion callback dispatch.
//!
//! Long-running operations can take a completion callback instead of blocking
//! the caller. The contract is exactly-once delivery: the callback fires once
//! with the final outcome, never zero times and never twice, and the result
//! envelope handed to it is released by this side immediately after the
//! callback returns. Callbacks must therefore copy out anything they need
//! before returning and must never free the envelope themselves.

use crate::ffi::result::{self, SafeResult};

/// Completion callback invoked with the operation outcome.
pub type SafeCallback = unsafe extern "C" fn(result: SafeResult);

/// Deliver `result` to `cb`, then release the envelope. The envelope's
/// buffers are valid only for the duration of the callback invocation.
pub(crate) fn dispatch(cb: SafeCallback, result: SafeResult) {
    // SAFETY: cb was supplied by the caller for exactly this purpose; the
    // envelope stays alive until the call returns
    unsafe { cb(result) };
    result::release(result);
}
