//! In-memory implementations of the store traits.
//!
//! Records live in memory for the lifetime of the process. Both stores can
//! export a CBOR snapshot and be rebuilt from one, which is how hosts keep
//! history and cooldowns across restarts.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use kitmaster_core::{Attribute, Kit, PrincipalId};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, StoreError};
use crate::traits::{HistoryStore, TimeoutStatus, TimestampStore};

// ─────────────────────────────────────────────────────────────────────────────
// History
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory kit history. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    inner: RwLock<HashMap<PrincipalId, Vec<Kit>>>,
}

#[derive(Serialize, Deserialize)]
struct HistorySnapshot {
    entries: Vec<(PrincipalId, Vec<Kit>)>,
}

impl MemoryHistoryStore {
    /// Create an empty history store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode every principal's history as CBOR.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = inner
            .iter()
            .map(|(principal, kits)| (principal.clone(), kits.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        encode(&HistorySnapshot { entries })
    }

    /// Rebuild a store from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: HistorySnapshot = decode(bytes)?;
        Ok(Self {
            inner: RwLock::new(snapshot.entries.into_iter().collect()),
        })
    }

    /// Write a snapshot to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Load a snapshot from `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No history snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let store = Self::from_bytes(&fs::read(path)?)?;
        debug!(
            principals = store.tracked_principals().len(),
            "loaded history snapshot from {}",
            path.display()
        );
        Ok(store)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn add_to_history(&self, principal: &PrincipalId, kit: &Kit) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.entry(principal.clone()).or_default().push(kit.clone());
    }

    fn history(&self, principal: &PrincipalId) -> Vec<Kit> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(principal).cloned().unwrap_or_default()
    }

    fn reset_history(&self, principal: &PrincipalId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.remove(principal);
    }

    fn tracked_principals(&self) -> BTreeSet<PrincipalId> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.keys().cloned().collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Timestamps
// ─────────────────────────────────────────────────────────────────────────────

/// Stamp key: `None` for global stamps.
type StampKey = (Option<PrincipalId>, String);

/// In-memory cooldown store. Thread-safe via RwLock.
pub struct MemoryTimestampStore {
    clock: Arc<dyn Clock>,
    inner: RwLock<HashMap<StampKey, i64>>,
}

#[derive(Serialize, Deserialize)]
struct TimestampSnapshot {
    entries: Vec<(Option<PrincipalId>, String, i64)>,
}

impl MemoryTimestampStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Encode every stamp as CBOR.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = inner
            .iter()
            .map(|((principal, kit), at)| (principal.clone(), kit.clone(), *at))
            .collect();
        entries.sort();
        encode(&TimestampSnapshot { entries })
    }

    /// Rebuild a store from [`to_bytes`](Self::to_bytes) output.
    pub fn from_bytes(bytes: &[u8], clock: Arc<dyn Clock>) -> Result<Self> {
        let snapshot: TimestampSnapshot = decode(bytes)?;
        let stamps = snapshot
            .entries
            .into_iter()
            .map(|(principal, kit, at)| ((principal, kit), at))
            .collect();
        Ok(Self {
            clock,
            inner: RwLock::new(stamps),
        })
    }

    /// Write a snapshot to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Load a snapshot from `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No cooldown snapshot at {}, starting empty", path.display());
            return Ok(Self::with_clock(clock));
        }
        let store = Self::from_bytes(&fs::read(path)?, clock)?;
        debug!("loaded cooldown snapshot from {}", path.display());
        Ok(store)
    }

    fn key(principal: &PrincipalId, kit: &Kit) -> StampKey {
        if kit.flag(Attribute::GlobalTimeout) {
            (None, kit.name.clone())
        } else {
            (Some(principal.clone()), kit.name.clone())
        }
    }

    /// Milliseconds since the stamp that governs `principal` and `kit`.
    fn elapsed(&self, principal: &PrincipalId, kit: &Kit) -> Option<i64> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .get(&Self::key(principal, kit))
            .map(|at| self.clock.now_millis().saturating_sub(*at))
    }
}

impl Default for MemoryTimestampStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampStore for MemoryTimestampStore {
    fn set_timestamp(&self, principal: Option<&PrincipalId>, kit: &Kit) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(
            (principal.cloned(), kit.name.clone()),
            self.clock.now_millis(),
        );
    }

    fn timeout_check(&self, principal: &PrincipalId, kit: &Kit) -> TimeoutStatus {
        let timeout = kit.timeout();
        if timeout == 0 {
            return TimeoutStatus::Ok;
        }
        let Some(elapsed) = self.elapsed(principal, kit) else {
            return TimeoutStatus::Ok;
        };

        if timeout < 0 {
            TimeoutStatus::SingleUseExhausted
        } else if elapsed < timeout.saturating_mul(1000) {
            TimeoutStatus::StillCooling
        } else {
            TimeoutStatus::Ok
        }
    }

    fn seconds_remaining(&self, principal: &PrincipalId, kit: &Kit) -> i64 {
        let timeout = kit.timeout();
        if timeout <= 0 {
            return 0;
        }
        match self.elapsed(principal, kit) {
            Some(elapsed) => timeout.saturating_sub(elapsed / 1000).max(0),
            None => 0,
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::Encoding(e.to_string()))?;
    Ok(buf)
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Decoding(e.to_string()))
}
