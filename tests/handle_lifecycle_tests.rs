//! Session lifecycle through the C surface: open, close, and the handle
//! guarantees around stale and reused handles.

mod common;

use common::harness::*;
use safebridge::ffi::{
    safebridge_close, safebridge_list_zones, safebridge_open, safebridge_stats,
};

#[test]
fn test_open_returns_handle_and_identity() {
    let params = cstr(r#"{"name":"family","url":"mem://","creator":"alice"}"#);
    let value = consume_json(unsafe { safebridge_open(params.as_ptr()) });

    assert!(value["handle"].as_i64().unwrap() > 0);
    assert_eq!(value["name"], "family");
    assert_eq!(value["url"], "mem://");
}

#[test]
fn test_open_rejects_bad_arguments() {
    // Null params
    let err = consume(unsafe { safebridge_open(std::ptr::null()) }).unwrap_err();
    assert!(err.contains("null pointer"));

    // Malformed JSON
    let params = cstr("{not json");
    let err = consume(unsafe { safebridge_open(params.as_ptr()) }).unwrap_err();
    assert!(err.contains("malformed option payload"));

    // Unknown store scheme
    let params = cstr(r#"{"name":"x","url":"s3://bucket"}"#);
    let err = consume(unsafe { safebridge_open(params.as_ptr()) }).unwrap_err();
    assert!(err.contains("unsupported store url"));
}

#[test]
fn test_closed_handle_is_invalid_everywhere() {
    let handle = open_mem("lifecycle");
    consume(unsafe { safebridge_close(handle) }).unwrap();

    let err = consume(unsafe { safebridge_list_zones(handle) }).unwrap_err();
    assert!(err.contains("invalid session handle"));
    let err = consume(unsafe { safebridge_stats(handle) }).unwrap_err();
    assert!(err.contains("invalid session handle"));
}

#[test]
fn test_double_close_is_an_error_not_a_crash() {
    let handle = open_mem("double");
    consume(unsafe { safebridge_close(handle) }).unwrap();
    let err = consume(unsafe { safebridge_close(handle) }).unwrap_err();
    assert!(err.contains("invalid session handle"));
}

#[test]
fn test_never_issued_handles_rejected() {
    for bogus in [0i64, -1, 12_345_678] {
        let err = consume(unsafe { safebridge_list_zones(bogus) }).unwrap_err();
        assert!(err.contains("invalid session handle"));
    }
}

#[test]
fn test_stale_handle_does_not_alias_reused_slot() {
    // Close a session, then open more until its slot is reused. The stale
    // handle must keep failing rather than reaching the new session.
    let stale = open_mem("victim");
    consume(unsafe { safebridge_close(stale) }).unwrap();

    let fresh: Vec<i64> = (0..4).map(|i| open_mem(&format!("fresh-{i}"))).collect();
    assert!(fresh.iter().all(|h| *h != stale));

    let err = consume(unsafe { safebridge_list_zones(stale) }).unwrap_err();
    assert!(err.contains("invalid session handle"));

    for handle in fresh {
        consume(unsafe { safebridge_list_zones(handle) }).unwrap();
        consume(unsafe { safebridge_close(handle) }).unwrap();
    }
}

#[test]
fn test_closing_one_session_leaves_others_usable() {
    let a = open_mem("keep-a");
    let b = open_mem("drop-b");
    let c = open_mem("keep-c");

    consume(unsafe { safebridge_close(b) }).unwrap();

    consume(unsafe { safebridge_list_zones(a) }).unwrap();
    consume(unsafe { safebridge_list_zones(c) }).unwrap();

    consume(unsafe { safebridge_close(a) }).unwrap();
    consume(unsafe { safebridge_close(c) }).unwrap();
}

#[test]
fn test_concurrent_opens_and_closes() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let barrier = Arc::new(Barrier::new(16));
    let mut joins = vec![];
    for i in 0..16 {
        let barrier = Arc::clone(&barrier);
        joins.push(thread::spawn(move || {
            barrier.wait();
            let handle = open_mem(&format!("concurrent-{i}"));
            consume(unsafe { safebridge_list_zones(handle) }).unwrap();
            consume(unsafe { safebridge_close(handle) }).unwrap();
            handle
        }));
    }

    let handles: std::collections::HashSet<i64> = joins
        .into_iter()
        .map(|j| j.join().expect("thread should complete"))
        .collect();
    assert_eq!(handles.len(), 16);
}
