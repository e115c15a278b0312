//! Engine seam: session trait, open parameters, and per-operation options.
//!
//! The boundary layer never implements storage or sync semantics itself; it
//! resolves a handle to a [`SafeSession`] and forwards decoded parameters.
//! Real engines (encrypted remote stores) live outside this crate and plug in
//! through [`connect`]. The built-in `mem://` engine exists so the boundary
//! can be exercised end to end without external infrastructure.

pub mod memory;

use crate::error::BridgeError;
use crate::metrics::TransferMetrics;
use crate::stream::{ByteSink, ByteSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters for opening a safe session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenParams {
    /// Name of the safe
    pub name: String,
    /// Store URL, scheme selects the engine (`mem://` built in)
    pub url: String,
    /// Identity of the opening user; semantics belong to the engine
    #[serde(default)]
    pub creator: Option<String>,
}

/// Options for upload operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PutOptions {
    /// Byte offset within the source to start reading from. Non-zero values
    /// require a seekable source; the operation fails cleanly otherwise.
    pub source_offset: u64,
}

/// Options for download operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetOptions {
    /// Byte offset within the stored file to start from (range download)
    pub offset: u64,
    /// Maximum number of bytes to deliver; absent means to end of file
    pub limit: Option<u64>,
}

/// Options for file listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// Only list files whose name starts with this prefix
    pub prefix: Option<String>,
    /// Cap the number of returned headers
    pub limit: Option<usize>,
}

/// Options for synchronization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Restrict the sync to these zones; absent means all zones
    pub zones: Option<Vec<String>>,
}

/// Options for updating the user set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetUsersOptions {
    /// Replace the whole user set instead of merging into it
    pub replace: bool,
}

/// Metadata header describing one stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHeader {
    pub zone: String,
    pub name: String,
    pub size: u64,
    /// Last modification, seconds since the Unix epoch
    pub modified: u64,
}

/// Outcome of a synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub files: usize,
    pub users: usize,
}

/// Map of user id to permission string; identity semantics stay external
pub type UserSet = BTreeMap<String, String>;

/// A live engine session. One open handle owns exactly one of these.
///
/// Streaming contract: `put` and `get` receive their source/sink for the
/// duration of the call only and must not retain them afterwards; all
/// invocations against one source/sink are sequential within the call.
pub trait SafeSession: Send + Sync {
    /// Stream an upload from `source` into `zone/name`.
    fn put(
        &self,
        zone: &str,
        name: &str,
        source: &mut dyn ByteSource,
        options: &PutOptions,
    ) -> Result<FileHeader, BridgeError>;

    /// Stream the stored file `zone/name` into `sink`.
    fn get(
        &self,
        zone: &str,
        name: &str,
        sink: &mut dyn ByteSink,
        options: &GetOptions,
    ) -> Result<FileHeader, BridgeError>;

    fn list_files(&self, zone: &str, options: &ListOptions)
        -> Result<Vec<FileHeader>, BridgeError>;

    fn list_zones(&self) -> Result<Vec<String>, BridgeError>;

    fn create_zone(&self, zone: &str) -> Result<(), BridgeError>;

    fn sync(&self, options: &SyncOptions) -> Result<SyncReport, BridgeError>;

    fn set_users(&self, users: &UserSet, options: &SetUsersOptions) -> Result<(), BridgeError>;

    fn get_users(&self) -> Result<UserSet, BridgeError>;

    /// Metrics snapshot of the most recent streaming operation.
    fn last_metrics(&self) -> TransferMetrics;

    /// Release the session's resources. Called exactly once, by close.
    fn close(&self) -> Result<(), BridgeError>;
}

/// Construct a session for the given parameters, dispatching on the store
/// URL scheme. This is the constructor seam external engines plug into.
pub fn connect(params: &OpenParams) -> Result<Box<dyn SafeSession>, BridgeError> {
    if params.name.is_empty() {
        return Err(BridgeError::InvalidOptions(
            "safe name must not be empty".to_string(),
        ));
    }
    match params.url.split_once("://") {
        Some(("mem", _)) => Ok(Box::new(memory::MemorySafe::open(params))),
        _ => Err(BridgeError::UnsupportedStore(params.url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_unknown_scheme() {
        let params = OpenParams {
            name: "family".into(),
            url: "s3://bucket/safe".into(),
            creator: None,
        };
        assert!(matches!(
            connect(&params),
            Err(BridgeError::UnsupportedStore(_))
        ));
    }

    #[test]
    fn test_connect_rejects_empty_name() {
        let params = OpenParams {
            name: String::new(),
            url: "mem://".into(),
            creator: None,
        };
        assert!(matches!(
            connect(&params),
            Err(BridgeError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_options_default_from_empty_json() {
        let opts: PutOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.source_offset, 0);

        let opts: GetOptions = serde_json::from_str(r#"{"offset":5}"#).unwrap();
        assert_eq!(opts.offset, 5);
        assert_eq!(opts.limit, None);
    }
}
