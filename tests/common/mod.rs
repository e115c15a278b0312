//! Common test utilities for the safebridge test suite.
//!
//! Provides a C-side harness: scriptable reader and writer bridges plus
//! helpers for building arguments and unwrapping result envelopes, shared by
//! the integration and property-based tests.

pub mod harness;
