//! C FFI layer for safebridge
//!
//! Provides the C-compatible boundary surface: the result envelope, the
//! session handle exports, streaming reader/writer bridges, and completion
//! callbacks. All functions use #[repr(C)] types and panic-safe wrappers.

pub mod bridge;
pub mod callback;
pub mod result;
pub mod session;
pub mod transfer;

pub use bridge::{CReader, CWriter, ReadFn, SeekFn, WriteFn};
pub use callback::SafeCallback;
pub use result::SafeResult;

// Re-export FFI functions for C clients
pub use result::safebridge_result_free;
pub use session::{
    safebridge_close, safebridge_create_zone, safebridge_get_logs, safebridge_get_users,
    safebridge_list_files, safebridge_list_zones, safebridge_open, safebridge_set_log_level,
    safebridge_set_users, safebridge_stats, safebridge_sync,
};
pub use transfer::{
    safebridge_get, safebridge_get_blob, safebridge_get_file, safebridge_put,
    safebridge_put_blob, safebridge_put_file,
};
