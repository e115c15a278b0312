//! In-memory reference engine (`mem://` store URL).
//!
//! Zones are maps of named byte blobs. Uploads are pulled from the caller's
//! source and downloads pushed to the caller's sink in fixed-size chunks, so
//! bridge implementations see the same multi-call traffic a real engine
//! produces. Used by the test suite and by hosts that want a scratch safe.

use crate::engine::{
    FileHeader, GetOptions, ListOptions, OpenParams, PutOptions, SafeSession, SetUsersOptions,
    SyncOptions, SyncReport, UserSet,
};
use crate::error::BridgeError;
use crate::metrics::TransferMetrics;
use crate::stream::{ByteSink, ByteSource};
use std::collections::BTreeMap;
use std::io::SeekFrom;
use std::sync::{Mutex, RwLock};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Chunk size for pulling uploads and pushing downloads
const STREAM_CHUNK: usize = 64 * 1024;

/// Upload cap; a source that keeps producing past this is refused
const MAX_PAYLOAD: usize = 512 * 1024 * 1024;

struct StoredFile {
    data: Vec<u8>,
    header: FileHeader,
}

/// A safe held entirely in process memory.
pub struct MemorySafe {
    name: String,
    zones: RwLock<BTreeMap<String, BTreeMap<String, StoredFile>>>,
    users: RwLock<UserSet>,
    last_metrics: Mutex<TransferMetrics>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl MemorySafe {
    pub fn open(params: &OpenParams) -> Self {
        tracing::debug!(safe = %params.name, url = %params.url, "opening in-memory safe");
        let mut users = UserSet::new();
        if let Some(creator) = &params.creator {
            users.insert(creator.clone(), "admin".to_string());
        }
        MemorySafe {
            name: params.name.clone(),
            zones: RwLock::new(BTreeMap::new()),
            users: RwLock::new(users),
            last_metrics: Mutex::new(TransferMetrics::new()),
        }
    }

    fn record_metrics(&self, metrics: TransferMetrics) {
        if let Ok(mut last) = self.last_metrics.lock() {
            *last = metrics;
        }
    }
}

impl SafeSession for MemorySafe {
    fn put(
        &self,
        zone: &str,
        name: &str,
        source: &mut dyn ByteSource,
        options: &PutOptions,
    ) -> Result<FileHeader, BridgeError> {
        let started = Instant::now();

        // A non-zero starting offset needs a seekable source; a source that
        // cannot seek must fail the operation cleanly, not corrupt the upload.
        if options.source_offset > 0 {
            source.seek(SeekFrom::Start(options.source_offset))?;
        }

        let mut data = Vec::new();
        let mut buf = vec![0u8; STREAM_CHUNK];
        let mut chunks = 0u64;
        loop {
            let n = source.read(&mut buf)?;
            if n == 0 {
                break; // end of stream
            }
            chunks += 1;
            if data.len() + n > MAX_PAYLOAD {
                return Err(BridgeError::PayloadTooLarge);
            }
            data.extend_from_slice(&buf[..n]);
        }

        let header = FileHeader {
            zone: zone.to_string(),
            name: name.to_string(),
            size: data.len() as u64,
            modified: now_secs(),
        };

        let mut zones = self.zones.write().unwrap_or_else(|e| e.into_inner());
        zones.entry(zone.to_string()).or_default().insert(
            name.to_string(),
            StoredFile {
                data,
                header: header.clone(),
            },
        );
        drop(zones);

        let elapsed = started.elapsed().as_micros() as u64;
        self.record_metrics(TransferMetrics::put(header.size, chunks, elapsed));
        tracing::debug!(safe = %self.name, zone, name, size = header.size, "put complete");
        Ok(header)
    }

    fn get(
        &self,
        zone: &str,
        name: &str,
        sink: &mut dyn ByteSink,
        options: &GetOptions,
    ) -> Result<FileHeader, BridgeError> {
        let started = Instant::now();

        let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
        let files = zones
            .get(zone)
            .ok_or_else(|| BridgeError::ZoneNotFound(zone.to_string()))?;
        let stored = files
            .get(name)
            .ok_or_else(|| BridgeError::FileNotFound(format!("{zone}/{name}")))?;

        let start = (options.offset as usize).min(stored.data.len());
        // A limit reaching past the end of the file clamps to it, so u64::MAX
        // is a legal "to end of file" request rather than an overflow.
        let end = match options.limit {
            Some(limit) => start.saturating_add(limit as usize).min(stored.data.len()),
            None => stored.data.len(),
        };

        let mut chunks = 0u64;
        for chunk in stored.data[start..end].chunks(STREAM_CHUNK) {
            sink.write(chunk)?;
            chunks += 1;
        }
        let header = stored.header.clone();
        drop(zones);

        let elapsed = started.elapsed().as_micros() as u64;
        self.record_metrics(TransferMetrics::get((end - start) as u64, chunks, elapsed));
        tracing::debug!(safe = %self.name, zone, name, bytes = end - start, "get complete");
        Ok(header)
    }

    fn list_files(
        &self,
        zone: &str,
        options: &ListOptions,
    ) -> Result<Vec<FileHeader>, BridgeError> {
        let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
        let files = zones
            .get(zone)
            .ok_or_else(|| BridgeError::ZoneNotFound(zone.to_string()))?;

        let headers = files
            .values()
            .map(|f| &f.header)
            .filter(|h| match &options.prefix {
                Some(prefix) => h.name.starts_with(prefix.as_str()),
                None => true,
            })
            .take(options.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(headers)
    }

    fn list_zones(&self) -> Result<Vec<String>, BridgeError> {
        let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
        Ok(zones.keys().cloned().collect())
    }

    fn create_zone(&self, zone: &str) -> Result<(), BridgeError> {
        let mut zones = self.zones.write().unwrap_or_else(|e| e.into_inner());
        if zones.contains_key(zone) {
            return Err(BridgeError::ZoneExists(zone.to_string()));
        }
        zones.insert(zone.to_string(), BTreeMap::new());
        Ok(())
    }

    fn sync(&self, options: &SyncOptions) -> Result<SyncReport, BridgeError> {
        let zones = self.zones.read().unwrap_or_else(|e| e.into_inner());
        let files = zones
            .iter()
            .filter(|(name, _)| match &options.zones {
                Some(wanted) => wanted.iter().any(|z| z == *name),
                None => true,
            })
            .map(|(_, files)| files.len())
            .sum();
        let users = self.users.read().unwrap_or_else(|e| e.into_inner()).len();
        tracing::debug!(safe = %self.name, files, users, "sync complete");
        Ok(SyncReport { files, users })
    }

    fn set_users(&self, users: &UserSet, options: &SetUsersOptions) -> Result<(), BridgeError> {
        let mut current = self.users.write().unwrap_or_else(|e| e.into_inner());
        if options.replace {
            *current = users.clone();
        } else {
            for (id, permission) in users {
                current.insert(id.clone(), permission.clone());
            }
        }
        Ok(())
    }

    fn get_users(&self) -> Result<UserSet, BridgeError> {
        Ok(self.users.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn last_metrics(&self) -> TransferMetrics {
        self.last_metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn close(&self) -> Result<(), BridgeError> {
        tracing::debug!(safe = %self.name, "closing in-memory safe");
        Ok(())
    }
}
