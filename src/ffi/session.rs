//! Session lifecycle and management exports.
//!
//! Every function here follows the same shape: validate raw arguments, decode
//! JSON parameters, resolve the handle to a live session, forward to the
//! engine, and wrap the outcome in a result envelope. All of it runs inside
//! [`guarded`] so panics surface as error envelopes instead of unwinding into
//! the host.

use crate::engine::{self, OpenParams, SafeSession, SetUsersOptions, SyncOptions, UserSet};
use crate::error::BridgeError;
use crate::ffi::callback::{self, SafeCallback};
use crate::ffi::result::{guarded, SafeResult};
use crate::handle::HandleTable;
use crate::logging;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::LazyLock;
use tracing::{debug, info};

/// One live session: the engine object plus the identity it was opened with.
pub(crate) struct SessionEntry {
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) session: Box<dyn SafeSession>,
}

pub(crate) static SESSIONS: LazyLock<HandleTable<SessionEntry>> =
    LazyLock::new(HandleTable::new);

/// Payload returned by a successful open.
#[derive(Serialize)]
struct SessionInfo<'a> {
    handle: i64,
    name: &'a str,
    url: &'a str,
}

/// Borrow a required C string argument as UTF-8.
///
/// # Safety
///
/// `ptr`, when non-null, must point to a nul-terminated string valid for the
/// duration of the call.
pub(crate) unsafe fn required_str<'a>(
    ptr: *const c_char,
    name: &'static str,
) -> Result<&'a str, BridgeError> {
    if ptr.is_null() {
        return Err(BridgeError::NullArgument(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| BridgeError::InvalidUtf8(name))
}

/// Decode a required JSON argument.
///
/// # Safety
///
/// Same pointer contract as [`required_str`].
pub(crate) unsafe fn decode_json<T: DeserializeOwned>(
    ptr: *const c_char,
    name: &'static str,
) -> Result<T, BridgeError> {
    let text = unsafe { required_str(ptr, name) }?;
    serde_json::from_str(text).map_err(|e| BridgeError::InvalidOptions(format!("{name}: {e}")))
}

/// Decode an optional JSON options argument. Null and empty both mean
/// "all defaults", so hosts without options to pass can skip building JSON.
///
/// # Safety
///
/// Same pointer contract as [`required_str`].
pub(crate) unsafe fn decode_options<T: DeserializeOwned + Default>(
    ptr: *const c_char,
    name: &'static str,
) -> Result<T, BridgeError> {
    if ptr.is_null() {
        return Ok(T::default());
    }
    let text = unsafe { required_str(ptr, name) }?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(text).map_err(|e| BridgeError::InvalidOptions(format!("{name}: {e}")))
}

pub(crate) fn envelope<T: Serialize>(outcome: Result<T, BridgeError>) -> SafeResult {
    match outcome {
        Ok(value) => SafeResult::ok(&value),
        Err(err) => SafeResult::failure(&err),
    }
}

pub(crate) fn envelope_void(outcome: Result<(), BridgeError>) -> SafeResult {
    match outcome {
        Ok(()) => SafeResult::void(),
        Err(err) => SafeResult::failure(&err),
    }
}

/// Open a session on a safe and return its handle.
///
/// `params_json` decodes to open parameters: `name`, `url`, and optionally
/// `creator`. On success the payload is `{"handle": .., "name": .., "url": ..}`.
///
/// # Safety
///
/// `params_json` must be null or a valid nul-terminated string for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_open(params_json: *const c_char) -> SafeResult {
    guarded("open", || {
        let outcome = (|| {
            let params: OpenParams = unsafe { decode_json(params_json, "params") }?;
            let session = engine::connect(&params)?;
            let handle = SESSIONS.insert(SessionEntry {
                name: params.name.clone(),
                url: params.url.clone(),
                session,
            });
            info!(handle, name = %params.name, "session opened");
            Ok((handle, params))
        })();
        match outcome {
            Ok((handle, params)) => SafeResult::ok(&SessionInfo {
                handle,
                name: &params.name,
                url: &params.url,
            }),
            Err(e) => SafeResult::failure(&e),
        }
    })
}

/// Close a session, retiring its handle.
///
/// The handle is invalid from this call on; operations already running
/// against it complete independently. Closing an unknown or already-closed
/// handle is an error.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_close(handle: i64) -> SafeResult {
    guarded("close", || {
        envelope_void(SESSIONS.remove(handle).and_then(|entry| {
            info!(handle, name = %entry.name, "session closed");
            entry.session.close()
        }))
    })
}

/// List file headers in a zone. `options_json` (optional) supports `prefix`
/// and `limit`.
///
/// # Safety
///
/// String arguments must be null or valid nul-terminated strings for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_list_files(
    handle: i64,
    zone: *const c_char,
    options_json: *const c_char,
) -> SafeResult {
    guarded("list_files", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let options = unsafe { decode_options(options_json, "options") }?;
            let entry = SESSIONS.resolve(handle)?;
            entry.session.list_files(zone, &options)
        })())
    })
}

/// List the zones of the safe.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_list_zones(handle: i64) -> SafeResult {
    guarded("list_zones", || {
        envelope(SESSIONS.resolve(handle).and_then(|e| e.session.list_zones()))
    })
}

/// Create a new zone. Fails if the zone already exists.
///
/// # Safety
///
/// `zone` must be a valid nul-terminated string for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_create_zone(
    handle: i64,
    zone: *const c_char,
) -> SafeResult {
    guarded("create_zone", || {
        envelope_void((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let entry = SESSIONS.resolve(handle)?;
            entry.session.create_zone(zone)?;
            debug!(handle, zone, "zone created");
            Ok(())
        })())
    })
}

/// Synchronize the safe with its store.
///
/// With a null `callback` the call blocks and returns the sync report as its
/// payload. With a callback the call returns a void envelope immediately and
/// the report (or error) is delivered to the callback exactly once from a
/// worker thread; the envelope passed to the callback is freed after it
/// returns.
///
/// # Safety
///
/// `options_json` must be null or a valid nul-terminated string for the
/// duration of the call. A non-null `callback` must remain callable until it
/// has been invoked.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_sync(
    handle: i64,
    options_json: *const c_char,
    callback: Option<SafeCallback>,
) -> SafeResult {
    guarded("sync", || {
        let options: SyncOptions = match unsafe { decode_options(options_json, "options") } {
            Ok(o) => o,
            Err(e) => return SafeResult::failure(&e),
        };

        let Some(cb) = callback else {
            return envelope(SESSIONS.resolve(handle).and_then(|e| e.session.sync(&options)));
        };

        // Resolve before spawning so a stale handle is still reported through
        // the callback, but without racing a concurrent close.
        let spawned = std::thread::Builder::new()
            .name("safebridge-sync".to_string())
            .spawn(move || {
                let outcome = SESSIONS.resolve(handle).and_then(|e| e.session.sync(&options));
                callback::dispatch(cb, envelope(outcome));
            });
        match spawned {
            Ok(_) => SafeResult::void(),
            Err(e) => SafeResult::failure(&BridgeError::backend(e)),
        }
    })
}

/// Update the safe's user set. `users_json` is a map of user id to
/// permission; `options_json` (optional) supports `replace`.
///
/// # Safety
///
/// String arguments must be null or valid nul-terminated strings for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_set_users(
    handle: i64,
    users_json: *const c_char,
    options_json: *const c_char,
) -> SafeResult {
    guarded("set_users", || {
        envelope_void((|| {
            let users: UserSet = unsafe { decode_json(users_json, "users") }?;
            let options: SetUsersOptions = unsafe { decode_options(options_json, "options") }?;
            let entry = SESSIONS.resolve(handle)?;
            entry.session.set_users(&users, &options)
        })())
    })
}

/// Return the safe's user set as a JSON map of user id to permission.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_get_users(handle: i64) -> SafeResult {
    guarded("get_users", || {
        envelope(SESSIONS.resolve(handle).and_then(|e| e.session.get_users()))
    })
}

/// Return transfer metrics for the most recent streaming operation on the
/// session.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_stats(handle: i64) -> SafeResult {
    guarded("stats", || {
        envelope(SESSIONS.resolve(handle).map(|e| e.session.last_metrics()))
    })
}

/// Return the most recent log lines as a JSON array of strings, oldest
/// first. The buffer starts filling once logging has been enabled through
/// `safebridge_set_log_level`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_get_logs() -> SafeResult {
    guarded("get_logs", || SafeResult::ok(&logging::recent_logs()))
}

/// Set the library's log filter, e.g. `"info"` or `"safebridge=debug"`.
///
/// # Safety
///
/// `spec` must be a valid nul-terminated string for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_set_log_level(spec: *const c_char) -> SafeResult {
    guarded("set_log_level", || {
        envelope_void((|| {
            let spec = unsafe { required_str(spec, "spec") }?;
            logging::set_log_level(spec)
        })())
    })
}
