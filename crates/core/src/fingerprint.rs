//! Content digests of the resume directory, used to detect a stale cache.

use crate::error::Result;
use crate::scanner::{self, IgnoreSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name → blake3 digest. Compared by exact equality.
pub type FingerprintSet = BTreeMap<String, String>;

pub fn compute(path: &Path) -> Result<String> {
    scanner::full_hash(path)
}

/// Digest recorded for a file whose content cannot be hashed.
const UNREADABLE_PREFIX: &str = "unreadable:";

/// One digest per file the corpus loader would consider, supported or not.
///
/// Files that cannot be hashed get an `unreadable:<reason>` digest, so they
/// still take part in staleness checks without aborting the snapshot.
pub fn snapshot(dir: &Path, ignore: &IgnoreSet) -> Result<FingerprintSet> {
    let listing = scanner::list_entries(dir, ignore)?;
    let mut set = FingerprintSet::new();
    for entry in listing.entries {
        let digest = compute(&entry.path).unwrap_or_else(|err| {
            warn!("Cannot hash {}: {}", entry.identifier, err);
            format!("{UNREADABLE_PREFIX}{err}")
        });
        debug!("fingerprint {} = {}", entry.identifier, digest);
        set.insert(entry.identifier, digest);
    }
    for skipped in listing.skipped {
        set.insert(skipped.identifier, format!("{UNREADABLE_PREFIX}{}", skipped.message));
    }
    Ok(set)
}

/// Persisted fingerprints, tagged with the bundle generation they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintSnapshot {
    pub generation: String,
    pub files: FingerprintSet,
}

#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<Option<FingerprintSnapshot>> {
        if !self.exists() {
            return Ok(None);
        }
        let raw = fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    pub fn save(&self, snapshot: &FingerprintSnapshot) -> Result<()> {
        write_atomic(&self.path, &serde_json::to_vec(snapshot)?)
    }
}

/// Writes to a temp file next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
