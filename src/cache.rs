//! Persistent travel-time cache keyed by origin address.
//!
//! The on-disk schema (origin -> destination -> seconds, JSON) is the one
//! externally visible artifact the engine both reads and writes; it must
//! stay stable across runs for the cache to be useful.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Directed travel durations in seconds.
///
/// Append-only within a run: `insert` never overwrites an existing entry,
/// so a duration observed once stays stable until an explicit `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceCache {
    entries: HashMap<String, HashMap<String, u32>>,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache from disk. A missing or unreadable file yields an
    /// empty cache rather than failing the batch.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(cache) => cache,
                Err(err) => {
                    warn!(path = %path.display(), ?err, "distance cache unreadable, starting empty");
                    Self::new()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => Self::new(),
            Err(err) => {
                warn!(path = %path.display(), ?err, "distance cache unreadable, starting empty");
                Self::new()
            }
        }
    }

    pub fn persist(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string(self)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(path, text)
    }

    pub fn get(&self, origin: &str, destination: &str) -> Option<u32> {
        self.entries.get(origin)?.get(destination).copied()
    }

    pub fn insert(&mut self, origin: &str, destination: &str, seconds: u32) {
        self.entries
            .entry(origin.to_string())
            .or_default()
            .entry(destination.to_string())
            .or_insert(seconds);
    }

    /// True when every ordered pair of distinct addresses has an entry, so
    /// a matrix can be built without any lookup.
    pub fn covers(&self, addresses: &[String]) -> bool {
        addresses.iter().enumerate().all(|(i, origin)| {
            addresses
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .all(|(_, destination)| self.get(origin, destination).is_some())
        })
    }

    /// Explicit refresh: drops all entries so the next batch re-queries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
