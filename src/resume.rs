//! Resume snapshot persistence.
//!
//! A batch run persists a [`ResumeSnapshot`] after every item and on
//! each lifecycle transition, keyed by the canonical page address. A
//! later session on the same page loads the snapshot, rebuilds its
//! counters, and continues from `current_index`. Snapshots embed the
//! full plan, so resuming never re-scans the panel.
//!
//! Loading is deliberately forgiving: undecodable payloads, version
//! mismatches, and snapshots keyed for another page all read as "no
//! snapshot" rather than an error, since stale state must never block
//! a fresh run.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::batch::{BatchProgress, BatchStatus};
use crate::error::Result;
use crate::plan::{BatchPlan, unix_millis};
use crate::surface::KeyValueStore;

// ============================================================================
// Constants
// ============================================================================

/// Snapshot format version; bump on breaking layout changes.
const SNAPSHOT_VERSION: u32 = 1;

/// Storage key namespace.
const KEY_PREFIX: &str = "ccapture:batch:";

// ============================================================================
// Address Canonicalization
// ============================================================================

/// Canonicalizes a page address for keying: the fragment is dropped,
/// since viewers routinely rewrite it while the page stays the same.
fn canonical_address(address: &str) -> String {
    match Url::parse(address) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        // Not a URL; strip a fragment by hand and keep the rest.
        Err(_) => address.split('#').next().unwrap_or(address).to_string(),
    }
}

/// Storage key for a page address.
pub(crate) fn storage_key(address: &str) -> String {
    format!("{KEY_PREFIX}{}", canonical_address(address))
}

// ============================================================================
// Resume Snapshot
// ============================================================================

/// Everything needed to continue an interrupted batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    /// Snapshot format version.
    pub version: u32,
    /// Save timestamp, milliseconds since the Unix epoch.
    pub saved_at_ms: u64,
    /// Lifecycle state at save time.
    pub status: BatchStatus,
    /// Run counters at save time.
    pub progress: BatchProgress,
    /// The frozen plan, including the page address it belongs to.
    pub plan: BatchPlan,
}

impl ResumeSnapshot {
    /// Captures the current run state.
    #[must_use]
    pub fn new(plan: &BatchPlan, status: BatchStatus, progress: &BatchProgress) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at_ms: unix_millis(),
            status,
            progress: progress.clone(),
            plan: plan.clone(),
        }
    }

    /// The page address this snapshot belongs to.
    #[must_use]
    pub fn source_address(&self) -> &str {
        &self.plan.source_address
    }
}

// ============================================================================
// Resume Store
// ============================================================================

/// Reads and writes [`ResumeSnapshot`]s through a [`KeyValueStore`].
pub struct ResumeStore {
    store: Arc<dyn KeyValueStore>,
}

impl ResumeStore {
    /// Creates a resume store over a key-value backend.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persists a snapshot under its page's key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Store`] when the backend write fails.
    pub async fn save(&self, snapshot: &ResumeSnapshot) -> Result<()> {
        let key = storage_key(snapshot.source_address());
        let value = serde_json::to_value(snapshot)?;
        self.store.set(&key, Some(value)).await?;
        debug!(
            key = %key,
            index = snapshot.progress.current_index,
            "Saved resume snapshot"
        );
        Ok(())
    }

    /// Loads the snapshot for a page address.
    ///
    /// Returns `Ok(None)` when there is nothing usable: no stored
    /// value, an undecodable payload, a version mismatch, or a snapshot
    /// that belongs to a different page.
    pub async fn load(&self, address: &str) -> Result<Option<ResumeSnapshot>> {
        let key = storage_key(address);
        let Some(value) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let snapshot: ResumeSnapshot = match serde_json::from_value(value) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(key = %key, error = %err, "Discarding undecodable resume snapshot");
                return Ok(None);
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                found = snapshot.version,
                expected = SNAPSHOT_VERSION,
                "Discarding resume snapshot with unknown version"
            );
            return Ok(None);
        }
        if storage_key(snapshot.source_address()) != key {
            warn!(key = %key, "Discarding resume snapshot saved for a different page");
            return Ok(None);
        }

        Ok(Some(snapshot))
    }

    /// Deletes the snapshot for a page address, if any.
    pub async fn clear(&self, address: &str) -> Result<()> {
        self.store.set(&storage_key(address), None).await
    }
}

// ============================================================================
// Tests
// ============================================================================
