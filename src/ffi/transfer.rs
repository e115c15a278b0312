//! Streaming transfer exports: uploads, downloads, and the blob and
//! filesystem convenience paths.
//!
//! The core pair is `safebridge_put` / `safebridge_get`, which move bytes
//! through caller-supplied bridges chunk by chunk. The blob variants trade
//! streaming for a one-shot base64 payload, and the file variants stream
//! directly against the host filesystem so small embedders need no bridge
//! code at all.

use crate::engine::{FileHeader, GetOptions, PutOptions};
use crate::error::BridgeError;
use crate::ffi::bridge::{CReader, CWriter, CallbackSink, CallbackSource};
use crate::ffi::result::{guarded, SafeResult};
use crate::ffi::session::{decode_options, envelope, required_str, SESSIONS};
use crate::stream::{IoSink, IoSource, SliceSource, VecSink};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use std::fs::File;
use std::os::raw::c_char;
use std::path::Path;
use tracing::debug;

/// Payload of a blob download: the file header plus its base64 content.
#[derive(Serialize)]
struct BlobPayload {
    header: FileHeader,
    data: String,
}

/// Upload a file by streaming from a caller-supplied reader bridge.
///
/// `reader` is borrowed for this call only. `options_json` (optional)
/// supports `source_offset`, which requires the reader to be seekable.
/// On success the payload is the stored file's header.
///
/// # Safety
///
/// `zone` and `name` must be valid nul-terminated strings and `reader` must
/// point to a valid reader bridge, all for the duration of the call. The
/// bridge's function pointers must honor the read/seek contract.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_put(
    handle: i64,
    zone: *const c_char,
    name: *const c_char,
    reader: *const CReader,
    options_json: *const c_char,
) -> SafeResult {
    guarded("put", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let name = unsafe { required_str(name, "name") }?;
            if reader.is_null() {
                return Err(BridgeError::NullArgument("reader"));
            }
            let options: PutOptions = unsafe { decode_options(options_json, "options") }?;
            let entry = SESSIONS.resolve(handle)?;
            // SAFETY: non-null, caller guarantees validity for this call
            let mut source = CallbackSource::new(unsafe { &*reader })?;
            let header = entry.session.put(zone, name, &mut source, &options)?;
            debug!(handle, zone, name, size = header.size, "put complete");
            Ok(header)
        })())
    })
}

/// Download a file by streaming into a caller-supplied writer bridge.
///
/// `writer` is borrowed for this call only. `options_json` (optional)
/// supports `offset` and `limit` for range downloads. On success the payload
/// is the file's header; the bytes have already been delivered to the writer.
///
/// # Safety
///
/// `zone` and `name` must be valid nul-terminated strings and `writer` must
/// point to a valid writer bridge, all for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_get(
    handle: i64,
    zone: *const c_char,
    name: *const c_char,
    writer: *const CWriter,
    options_json: *const c_char,
) -> SafeResult {
    guarded("get", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let name = unsafe { required_str(name, "name") }?;
            if writer.is_null() {
                return Err(BridgeError::NullArgument("writer"));
            }
            let options: GetOptions = unsafe { decode_options(options_json, "options") }?;
            let entry = SESSIONS.resolve(handle)?;
            // SAFETY: non-null, caller guarantees validity for this call
            let mut sink = CallbackSink::new(unsafe { &*writer })?;
            let header = entry.session.get(zone, name, &mut sink, &options)?;
            debug!(handle, zone, name, size = header.size, "get complete");
            Ok(header)
        })())
    })
}

/// Upload a small payload passed inline as base64 text.
///
/// # Safety
///
/// All string arguments must be valid nul-terminated strings for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_put_blob(
    handle: i64,
    zone: *const c_char,
    name: *const c_char,
    data_base64: *const c_char,
    options_json: *const c_char,
) -> SafeResult {
    guarded("put_blob", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let name = unsafe { required_str(name, "name") }?;
            let encoded = unsafe { required_str(data_base64, "data") }?;
            let options: PutOptions = unsafe { decode_options(options_json, "options") }?;
            let data = STANDARD
                .decode(encoded)
                .map_err(|e| BridgeError::InvalidOptions(format!("data: {e}")))?;
            let entry = SESSIONS.resolve(handle)?;
            let mut source = SliceSource::new(&data);
            entry.session.put(zone, name, &mut source, &options)
        })())
    })
}

/// Download a small file, returning `{"header": .., "data": "<base64>"}`.
///
/// # Safety
///
/// `zone` and `name` must be valid nul-terminated strings for the duration
/// of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_get_blob(
    handle: i64,
    zone: *const c_char,
    name: *const c_char,
    options_json: *const c_char,
) -> SafeResult {
    guarded("get_blob", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let name = unsafe { required_str(name, "name") }?;
            let options: GetOptions = unsafe { decode_options(options_json, "options") }?;
            let entry = SESSIONS.resolve(handle)?;
            let mut sink = VecSink::new();
            let header = entry.session.get(zone, name, &mut sink, &options)?;
            Ok(BlobPayload {
                header,
                data: STANDARD.encode(sink.into_bytes()),
            })
        })())
    })
}

/// Upload a file from the host filesystem, streaming its contents.
///
/// # Safety
///
/// All string arguments must be valid nul-terminated strings for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_put_file(
    handle: i64,
    zone: *const c_char,
    name: *const c_char,
    path: *const c_char,
    options_json: *const c_char,
) -> SafeResult {
    guarded("put_file", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let name = unsafe { required_str(name, "name") }?;
            let path = unsafe { required_str(path, "path") }?;
            let options: PutOptions = unsafe { decode_options(options_json, "options") }?;
            let file = File::open(path).map_err(BridgeError::backend)?;
            let entry = SESSIONS.resolve(handle)?;
            let mut source = IoSource::new(file);
            entry.session.put(zone, name, &mut source, &options)
        })())
    })
}

/// Download a file to the host filesystem, streaming its contents. Parent
/// directories of `path` are created as needed.
///
/// # Safety
///
/// All string arguments must be valid nul-terminated strings for the
/// duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safebridge_get_file(
    handle: i64,
    zone: *const c_char,
    name: *const c_char,
    path: *const c_char,
    options_json: *const c_char,
) -> SafeResult {
    guarded("get_file", || {
        envelope((|| {
            let zone = unsafe { required_str(zone, "zone") }?;
            let name = unsafe { required_str(name, "name") }?;
            let path = unsafe { required_str(path, "path") }?;
            let options: GetOptions = unsafe { decode_options(options_json, "options") }?;
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(BridgeError::backend)?;
                }
            }
            let file = File::create(path).map_err(BridgeError::backend)?;
            let entry = SESSIONS.resolve(handle)?;
            let mut sink = IoSink::new(file);
            entry.session.get(zone, name, &mut sink, &options)
        })())
    })
}
