//! crates/dashboard_core/src/persist.rs
//!
//! Declarative persistence of the store. A `PersistSchema` names the
//! `slice.field` paths that survive a restart; the generic routine below turns
//! the state into a versioned JSON snapshot and back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::store::DashboardState;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct PersistSchema {
    pub version: u32,
    /// Allow-list of `slice.field` paths.
    pub fields: &'static [&'static str],
}

/// In-flight, error and busy flags are deliberately absent.
pub const PERSIST_SCHEMA: PersistSchema = PersistSchema {
    version: SNAPSHOT_VERSION,
    fields: &[
        "air_quality.reading",
        "air_quality.timestamp",
        "facts.fact",
        "facts.pool",
        "facts.offset",
        "facts.is_initialized",
        "layout.is_extra_column",
        "light.data",
        "light.timestamp",
        "light.is_initialized",
        "news.news_data_articles",
        "news.news_data_next_page",
        "news.hacker_news_articles",
        "notes.favorite_notes",
        "notes.folder_id",
        "notes.folders",
        "notes.folder_notes",
        "player.loop_mode",
        "player.volume",
        "player.track_duration",
        "player.track_id",
        "player.track_length",
        "player.browsing_playlist_id",
        "player.is_playlist_open",
        "player.is_auto_play",
    ],
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub values: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Snapshot version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn pointer(path: &str) -> String {
    format!("/{}", path.replace('.', "/"))
}

impl PersistSchema {
    /// Projects the allow-listed fields of `state` into a snapshot.
    pub fn capture(&self, state: &DashboardState) -> Result<Snapshot, PersistError> {
        let tree = serde_json::to_value(state)?;
        let mut values = Map::new();
        for path in self.fields {
            if let Some(value) = tree.pointer(&pointer(path)) {
                values.insert((*path).to_string(), value.clone());
            }
        }
        Ok(Snapshot {
            version: self.version,
            values,
        })
    }

    /// Builds a state from defaults overlaid with the snapshot's allow-listed
    /// values. Unknown paths are ignored and a value that no longer fits its
    /// field is dropped, leaving the default in place.
    pub fn restore(&self, snapshot: Snapshot) -> Result<DashboardState, PersistError> {
        if snapshot.version > self.version {
            return Err(PersistError::UnsupportedVersion {
                found: snapshot.version,
                supported: self.version,
            });
        }
        let snapshot = migrate(snapshot, self.version);

        let mut tree = serde_json::to_value(DashboardState::default())?;
        for path in self.fields {
            let Some(value) = snapshot.values.get(*path) else {
                continue;
            };
            let mut candidate = tree.clone();
            let Some(slot) = candidate.pointer_mut(&pointer(path)) else {
                continue;
            };
            *slot = value.clone();
            match DashboardState::deserialize(&candidate) {
                Ok(_) => tree = candidate,
                Err(e) => warn!("Dropping persisted field '{}': {}", path, e),
            }
        }

        for key in snapshot.values.keys() {
            if !self.fields.contains(&key.as_str()) {
                debug!("Ignoring unknown persisted field '{}'", key);
            }
        }

        Ok(DashboardState::deserialize(&tree)?)
    }
}

/// Upgrades an older snapshot to `target`. Version 0 snapshots predate the
/// version tag and share the version 1 field layout.
pub fn migrate(mut snapshot: Snapshot, target: u32) -> Snapshot {
    while snapshot.version < target {
        match snapshot.version {
            0 => snapshot.version = 1,
            other => {
                debug!("No migration registered from snapshot version {}", other);
                snapshot.version = target;
            }
        }
    }
    snapshot
}
