#![no_main]

use libfuzzer_sys::fuzz_target;
use safebridge::ffi::{safebridge_close, safebridge_open, safebridge_result_free};
use std::ffi::CString;

// Arbitrary bytes as the open parameter string: malformed JSON, wrong types,
// huge numbers, non-UTF-8 escapes. The boundary must return an envelope for
// every input, never crash or leak a handle it did not report.
fuzz_target!(|data: &[u8]| {
    let Ok(params) = CString::new(data) else {
        return; // interior nul cannot cross the C boundary
    };

    let result = unsafe { safebridge_open(params.as_ptr()) };
    assert!(result.payload.is_null() || result.error.is_null());

    if result.error.is_null() && !result.payload.is_null() {
        // Successful opens must yield a closable handle
        let payload = unsafe { std::ffi::CStr::from_ptr(result.payload) }
            .to_str()
            .expect("payload is JSON text");
        let value: serde_json::Value = serde_json::from_str(payload).expect("payload parses");
        let handle = value["handle"].as_i64().expect("payload has handle");
        let closed = unsafe { safebridge_close(handle) };
        assert!(closed.error.is_null());
        unsafe { safebridge_result_free(closed) };
    }
    unsafe { safebridge_result_free(result) };
});
