//! Generation-checked session handle table.
//!
//! Callers hold sessions as small opaque integers rather than raw pointers.
//! Each handle packs a slot index and a slot generation; the generation is
//! bumped on every close, so a stale handle fails resolution with
//! [`BridgeError::InvalidHandle`] instead of silently aliasing a session
//! that reused the slot.
//!
//! # Concurrency
//!
//! The table holds an `Arc` per live session. `resolve` clones the `Arc`
//! under a read lock and releases the lock before returning, so operations
//! against different handles run concurrently; only open/close take the
//! write lock, and only for the map update itself.

use crate::error::BridgeError;
use std::sync::{Arc, RwLock};

/// Handles are i64 on the wire: low 32 bits are `slot index + 1` (so zero is
/// never a valid handle), upper bits are the slot generation at issue time.
/// Generations wrap at 31 bits, keeping every packed handle positive.
const INDEX_MASK: i64 = 0xffff_ffff;
const GENERATION_MASK: u32 = 0x7fff_ffff;

fn pack(index: usize, generation: u32) -> i64 {
    ((generation as i64) << 32) | (index as i64 + 1)
}

fn unpack(handle: i64) -> Option<(usize, u32)> {
    let low = handle & INDEX_MASK;
    if low == 0 || handle < 0 {
        return None;
    }
    Some(((low - 1) as usize, (handle >> 32) as u32))
}

struct Slot<T> {
    generation: u32,
    value: Option<Arc<T>>,
}

struct Slots<T> {
    entries: Vec<Slot<T>>,
    free: Vec<usize>,
}

/// Table mapping integer handles to live session objects.
pub struct HandleTable<T> {
    slots: RwLock<Slots<T>>,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        HandleTable {
            slots: RwLock::new(Slots {
                entries: Vec::new(),
                free: Vec::new(),
            }),
        }
    }

    /// Insert a value and issue a handle for it. Freed slots are reused with
    /// a bumped generation, so reuse never aliases a still-open handle.
    pub fn insert(&self, value: T) -> i64 {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let value = Arc::new(value);
        match slots.free.pop() {
            Some(index) => {
                let slot = &mut slots.entries[index];
                slot.value = Some(value);
                pack(index, slot.generation)
            }
            None => {
                let index = slots.entries.len();
                slots.entries.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                pack(index, 0)
            }
        }
    }

    /// Resolve a handle to its live session. Unknown, closed, or stale
    /// handles yield a distinct invalid-handle error, never a silent no-op.
    pub fn resolve(&self, handle: i64) -> Result<Arc<T>, BridgeError> {
        let (index, generation) =
            unpack(handle).ok_or(BridgeError::InvalidHandle(handle))?;
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        let slot = slots
            .entries
            .get(index)
            .ok_or(BridgeError::InvalidHandle(handle))?;
        if slot.generation != generation {
            return Err(BridgeError::InvalidHandle(handle));
        }
        slot.value
            .as_ref()
            .cloned()
            .ok_or(BridgeError::InvalidHandle(handle))
    }

    /// Retire a handle, returning the owned session so the caller can release
    /// its resources. Closing an already-closed or never-issued handle is an
    /// error so callers can detect double-close bugs.
    pub fn remove(&self, handle: i64) -> Result<Arc<T>, BridgeError> {
        let (index, generation) =
            unpack(handle).ok_or(BridgeError::InvalidHandle(handle))?;
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let slot = slots
            .entries
            .get_mut(index)
            .ok_or(BridgeError::InvalidHandle(handle))?;
        if slot.generation != generation {
            return Err(BridgeError::InvalidHandle(handle));
        }
        let value = slot
            .value
            .take()
            .ok_or(BridgeError::InvalidHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1) & GENERATION_MASK;
        slots.free.push(index);
        Ok(value)
    }

    /// Number of currently live sessions.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.entries.iter().filter(|s| s.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
