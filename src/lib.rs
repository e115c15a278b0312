//! # safebridge
//!
//! C-ABI boundary layer for an encrypted multi-user file safe — handles in,
//! JSON envelopes out, payload bytes streamed through caller-supplied
//! bridges.
//!
//! Hosts open a *safe* (a named, access-controlled store of *zones*, each
//! holding files) and receive a small integer handle. Every subsequent call
//! takes that handle, returns a [`ffi::SafeResult`] envelope carrying either
//! a JSON payload or an error string, and never lets payload bytes ride in
//! the envelope itself: uploads pull from a reader bridge, downloads push
//! into a writer bridge, chunk by chunk.
//!
//! ## Features
//!
//! | Feature | Description | Default |
//! |:--------|:------------|:-------:|
//! | `ffi` | C exports + header generation | Yes |
//!
//! ## Quick Start (Rust embedders)
//!
//! ```rust
//! use safebridge::engine::{self, OpenParams, PutOptions, GetOptions};
//! use safebridge::stream::{SliceSource, VecSink};
//!
//! let session = engine::connect(&OpenParams {
//!     name: "family".into(),
//!     url: "mem://".into(),
//!     creator: Some("alice".into()),
//! }).unwrap();
//!
//! let mut source = SliceSource::new(b"hello");
//! session.put("docs", "greeting.txt", &mut source, &PutOptions::default()).unwrap();
//!
//! let mut sink = VecSink::new();
//! session.get("docs", "greeting.txt", &mut sink, &GetOptions::default()).unwrap();
//! assert_eq!(sink.into_bytes(), b"hello");
//! ```
//!
//! C hosts use the generated `include/safebridge.h` instead; every exported
//! function is documented on its Rust definition under [`ffi`].

// Error taxonomy shared by every layer
pub mod error;
pub use error::BridgeError;

// Generation-checked handle table
pub mod handle;
pub use handle::HandleTable;

// Streaming capability traits and adapters
pub mod stream;
pub use stream::{ByteSink, ByteSource};

// Transfer observability
pub mod metrics;
pub use metrics::TransferMetrics;

// Boundary-controlled logging
pub mod logging;

// Engine seam and the built-in in-memory engine
pub mod engine;
pub use engine::{FileHeader, OpenParams, SafeSession, SyncReport};

// C boundary surface
#[cfg(feature = "ffi")]
pub mod ffi;
