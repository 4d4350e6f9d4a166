//! The persisted cache bundle and its Absent / Stale / Fresh lifecycle.
//!
//! A bundle is three JSON artifacts under the cache directory: the fitted
//! model, the corpus matrix and the fingerprint snapshot. All three carry the
//! same `generation`; artifacts from different fits never load together.
//! The matrix artifact also records the files skipped by the fit, so a cached
//! run reports them as well.
//! Writes go model, matrix, fingerprints, each through an atomic rename.

use crate::error::{MatchError, Result};
use crate::fingerprint::{write_atomic, FingerprintSet, FingerprintSnapshot, FingerprintStore};
use crate::models::{CorpusLoad, Diagnostic};
use crate::vectorspace::{CorpusMatrix, VectorSpaceModel};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

const MODEL_FILE: &str = "model.json";
const MATRIX_FILE: &str = "matrix.json";
const FINGERPRINT_FILE: &str = "fingerprints.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Absent,
    Stale,
    Fresh,
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CacheState::Absent => "absent",
            CacheState::Stale => "stale",
            CacheState::Fresh => "fresh",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheBundle {
    pub generation: String,
    pub built_at: DateTime<Utc>,
    pub fingerprints: FingerprintSet,
    pub model: VectorSpaceModel,
    pub matrix: CorpusMatrix,
    /// Files left out of the fit, in file-name order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CacheBundle {
    /// Fits a fresh vector space over `corpus`.
    pub fn build(corpus: &CorpusLoad, fingerprints: FingerprintSet) -> Result<Self> {
        let (model, rows) = VectorSpaceModel::fit(&corpus.texts())?;
        let matrix = CorpusMatrix::new(&model, corpus.identifiers(), rows)?;
        let built_at = Utc::now();

        let mut hasher = blake3::Hasher::new();
        hasher.update(built_at.to_rfc3339().as_bytes());
        for (name, digest) in &fingerprints {
            hasher.update(name.as_bytes());
            hasher.update(b"\0");
            hasher.update(digest.as_bytes());
        }
        let generation = hasher.finalize().to_hex().to_string();

        Ok(Self {
            generation,
            built_at,
            fingerprints,
            model,
            matrix,
            diagnostics: corpus.diagnostics.clone(),
        })
    }

    fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.matrix.validate(&self.model)?;
        if let Some(id) = self
            .matrix
            .identifiers()
            .iter()
            .find(|id| !self.fingerprints.contains_key(*id))
        {
            return Err(MatchError::CacheCorruption(format!(
                "document {id} has no fingerprint"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Artifact<T> {
    generation: String,
    built_at: DateTime<Utc>,
    payload: T,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixPayload {
    matrix: CorpusMatrix,
    #[serde(default)]
    diagnostics: Vec<Diagnostic>,
}

impl MatrixPayload {
    fn of(bundle: &CacheBundle) -> Self {
        Self {
            matrix: bundle.matrix.clone(),
            diagnostics: bundle.diagnostics.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BundleStore {
    dir: PathBuf,
    fingerprints: FingerprintStore,
}

impl BundleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let fingerprints = FingerprintStore::new(dir.join(FINGERPRINT_FILE));
        Self { dir, fingerprints }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_paths(&self) -> [PathBuf; 3] {
        [
            self.dir.join(MODEL_FILE),
            self.dir.join(MATRIX_FILE),
            self.fingerprints.path().to_path_buf(),
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.artifact_paths().iter().all(|p| p.is_file())
    }

    /// Reads the bundle; `Ok(None)` when any artifact is missing.
    pub fn load(&self) -> Result<Option<CacheBundle>> {
        if !self.is_complete() {
            return Ok(None);
        }
        let model: Artifact<VectorSpaceModel> = read_artifact(&self.dir.join(MODEL_FILE))?;
        let matrix: Artifact<MatrixPayload> = read_artifact(&self.dir.join(MATRIX_FILE))?;
        let snapshot = self
            .fingerprints
            .load()
            .map_err(|e| MatchError::CacheCorruption(format!("{FINGERPRINT_FILE}: {e}")))?
            .ok_or_else(|| MatchError::CacheCorruption(format!("{FINGERPRINT_FILE} vanished")))?;

        if model.generation != matrix.generation || matrix.generation != snapshot.generation {
            return Err(MatchError::CacheCorruption(format!(
                "generation mismatch: model {}, matrix {}, fingerprints {}",
                model.generation, matrix.generation, snapshot.generation
            )));
        }

        let bundle = CacheBundle {
            generation: snapshot.generation,
            built_at: model.built_at,
            fingerprints: snapshot.files,
            model: model.payload,
            matrix: matrix.payload.matrix,
            diagnostics: matrix.payload.diagnostics,
        };
        bundle.validate()?;
        Ok(Some(bundle))
    }

    /// Compares the persisted bundle with the current directory fingerprints.
    /// A bundle is only returned when it is fresh.
    pub fn assess(&self, current: &FingerprintSet) -> Result<(CacheState, Option<CacheBundle>)> {
        let bundle = match self.load() {
            Ok(Some(bundle)) => bundle,
            Ok(None) => return Ok((CacheState::Absent, None)),
            Err(MatchError::CacheCorruption(reason)) => {
                warn!("Discarding cache bundle in {:?}: {}", self.dir, reason);
                return Ok((CacheState::Stale, None));
            }
            Err(err) => return Err(err),
        };
        if &bundle.fingerprints != current {
            debug!("fingerprints changed since {}", bundle.built_at);
            return Ok((CacheState::Stale, None));
        }
        Ok((CacheState::Fresh, Some(bundle)))
    }

    /// Replaces the persisted bundle. Fingerprints are written last.
    pub fn save(&self, bundle: &CacheBundle) -> Result<()> {
        bundle.validate()?;
        fs::create_dir_all(&self.dir)?;
        write_artifact(&self.dir.join(MODEL_FILE), bundle, &bundle.model)?;
        write_artifact(&self.dir.join(MATRIX_FILE), bundle, &MatrixPayload::of(bundle))?;
        self.fingerprints.save(&FingerprintSnapshot {
            generation: bundle.generation.clone(),
            files: bundle.fingerprints.clone(),
        })?;
        info!(
            "Persisted cache bundle {} ({} documents, {} terms)",
            &bundle.generation[..12.min(bundle.generation.len())],
            bundle.matrix.len(),
            bundle.model.dims()
        );
        Ok(())
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<Artifact<T>> {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let raw = fs::read(path).map_err(|e| MatchError::CacheCorruption(format!("{name}: {e}")))?;
    serde_json::from_slice(&raw).map_err(|e| MatchError::CacheCorruption(format!("{name}: {e}")))
}

fn write_artifact<T: Serialize>(path: &Path, bundle: &CacheBundle, payload: &T) -> Result<()> {
    let artifact = Artifact {
        generation: bundle.generation.clone(),
        built_at: bundle.built_at,
        payload,
    };
    write_atomic(path, &serde_json::to_vec(&artifact)?)
}

/// Read-mostly handle for embedding the matcher in a long-lived process.
///
/// Readers keep the `Arc` they got from `snapshot` for the whole request; a
/// rebuild swaps in a new bundle without blocking on them.
#[derive(Debug)]
pub struct SharedBundle {
    current: RwLock<Arc<CacheBundle>>,
}

impl SharedBundle {
    pub fn new(bundle: CacheBundle) -> Self {
        Self {
            current: RwLock::new(Arc::new(bundle)),
        }
    }

    pub fn snapshot(&self) -> Arc<CacheBundle> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swaps in `bundle` and returns the previous one.
    pub fn replace(&self, bundle: CacheBundle) -> Arc<CacheBundle> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(bundle))
    }
}
