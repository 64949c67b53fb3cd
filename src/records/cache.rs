//! Caller-owned cache of joined datasets, keyed by the content of both sources.

use crate::records::dataset::JoinedDataset;
use crate::records::error::LoadError;
use crate::records::loader::RecordLoader;
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// SHA-256 over both source paths, both source contents and the loader settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Digests the current state of both sources.
    ///
    /// An absent source hashes to a fixed marker, so creating it later changes
    /// the key.
    pub fn compute(
        loader: &RecordLoader,
        records: &Path,
        coordinates: &Path,
    ) -> Result<Self, LoadError> {
        let mut hasher = Sha256::new();

        let loader_json = serde_json::to_string(loader).unwrap_or_default();
        hasher.update(loader_json.as_bytes());

        for path in [records, coordinates] {
            hasher.update(path.to_string_lossy().as_bytes());
            match std::fs::read(path) {
                Ok(bytes) => {
                    hasher.update(b"present");
                    hasher.update((bytes.len() as u64).to_le_bytes());
                    hasher.update(&bytes);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => hasher.update(b"missing"),
                Err(e) => return Err(LoadError::SourceRead(path.to_path_buf(), e)),
            }
        }

        Ok(CacheKey(format!("{:x}", hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Holds at most one dataset per (records, coordinates) path pair.
///
/// A lookup re-digests both files; when either changed, the stale entry is
/// replaced by a fresh load. Nothing is shared between cache instances.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<(PathBuf, PathBuf), (CacheKey, JoinedDataset)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the cached dataset for these sources, loading it when absent or stale.
    /// Failed loads are not cached.
    pub fn get_or_load(
        &mut self,
        loader: &RecordLoader,
        records: &Path,
        coordinates: &Path,
    ) -> Result<JoinedDataset, LoadError> {
        let key = CacheKey::compute(loader, records, coordinates)?;
        let slot = (records.to_path_buf(), coordinates.to_path_buf());

        match self.entries.entry(slot) {
            Entry::Occupied(mut entry) => {
                if entry.get().0 == key {
                    debug!("Dataset cache hit for {:?} + {:?}", records, coordinates);
                    return Ok(entry.get().1.clone());
                }
                info!(
                    "Source content changed for {:?} + {:?}, reloading",
                    records, coordinates
                );
                match loader.load(records, coordinates) {
                    Ok(dataset) => {
                        entry.insert((key, dataset.clone()));
                        Ok(dataset)
                    }
                    Err(e) => {
                        entry.remove();
                        Err(e)
                    }
                }
            }
            Entry::Vacant(entry) => {
                debug!("Dataset cache miss for {:?} + {:?}", records, coordinates);
                let dataset = loader.load(records, coordinates)?;
                entry.insert((key, dataset.clone()));
                Ok(dataset)
            }
        }
    }
}
