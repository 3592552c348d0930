//! Bounded, most-recent-first history of document snapshots.
//!
//! Snapshots are immutable once captured. The list is persisted under its own
//! key after every change; persistence failures are logged and never undo the
//! in-memory capture.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::document::heal::decode_document;
use crate::document::store::DocumentStore;
use crate::ids::new_id;
use crate::models::now_millis;
use crate::models::version::{VersionSnapshot, VersionSummary};
use crate::persistence::kv::KvStore;

pub const VERSIONS_KEY: &str = "resume-versions";
pub const MAX_VERSIONS: usize = 20;

#[derive(Clone)]
pub struct VersionHistory {
    versions: Arc<Mutex<Vec<VersionSnapshot>>>,
    kv: Arc<dyn KvStore>,
    persist_lock: Arc<tokio::sync::Mutex<()>>,
}

impl VersionHistory {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_versions(kv, Vec::new())
    }

    fn with_versions(kv: Arc<dyn KvStore>, versions: Vec<VersionSnapshot>) -> Self {
        Self {
            versions: Arc::new(Mutex::new(versions)),
            kv,
            persist_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Loads the persisted list. Unreadable entries are dropped; a missing
    /// or malformed list starts an empty history.
    pub async fn load(kv: Arc<dyn KvStore>) -> Self {
        let versions = match kv.get(VERSIONS_KEY).await {
            Ok(Some(text)) => decode_versions(&text),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("Failed to read version history: {e}");
                Vec::new()
            }
        };
        info!("Loaded {} saved versions", versions.len());
        Self::with_versions(kv, versions)
    }

    fn versions(&self) -> MutexGuard<'_, Vec<VersionSnapshot>> {
        self.versions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Full snapshots, most recent first.
    #[cfg(test)]
    pub fn list(&self) -> Vec<VersionSnapshot> {
        self.versions().clone()
    }

    pub fn summaries(&self) -> Vec<VersionSummary> {
        self.versions().iter().map(VersionSummary::from).collect()
    }

    pub fn get(&self, version_id: &str) -> Option<VersionSnapshot> {
        self.versions().iter().find(|v| v.id == version_id).cloned()
    }

    /// Captures the document as it is at the moment of the call.
    pub async fn capture(
        &self,
        store: &DocumentStore,
        description: Option<&str>,
    ) -> VersionSnapshot {
        let data = store.get();
        let snapshot = {
            let mut versions = self.versions();
            let description = description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Version {}", versions.len() + 1));
            let snapshot = VersionSnapshot {
                id: new_id(),
                timestamp: now_millis(),
                description,
                data,
            };
            versions.insert(0, snapshot.clone());
            versions.truncate(MAX_VERSIONS);
            snapshot
        };
        info!(
            "Captured version {} ('{}')",
            snapshot.id, snapshot.description
        );
        self.persist().await;
        snapshot
    }

    /// Overwrites the document with a copy of the snapshot. Unknown ids are a
    /// no-op and return `false`.
    pub fn restore(&self, store: &DocumentStore, version_id: &str) -> bool {
        match self.get(version_id) {
            Some(snapshot) => {
                store.replace(snapshot.data);
                info!("Restored version {version_id}");
                true
            }
            None => {
                warn!("Version {version_id} not found, nothing restored");
                false
            }
        }
    }

    pub async fn clear(&self) {
        self.versions().clear();
        info!("Cleared version history");
        self.persist().await;
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let json = match serde_json::to_string(&*self.versions()) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize version history: {e}");
                return;
            }
        };
        if let Err(e) = self.kv.put(VERSIONS_KEY, &json).await {
            error!("Failed to persist version history: {e}");
        }
    }
}

/// On-disk shape of a snapshot before its document is healed.
#[derive(Deserialize)]
struct RawSnapshot {
    id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    data: Value,
}

fn decode_versions(text: &str) -> Vec<VersionSnapshot> {
    let entries = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("Stored version history is not a list, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!("Stored version history is not valid JSON ({e}), starting empty");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RawSnapshot>(entry) {
            Ok(raw) => Some(VersionSnapshot {
                id: raw.id,
                timestamp: raw.timestamp,
                description: raw.description,
                data: decode_document(raw.data),
            }),
            Err(e) => {
                warn!("Dropping unreadable version: {e}");
                None
            }
        })
        .take(MAX_VERSIONS)
        .collect()
}
