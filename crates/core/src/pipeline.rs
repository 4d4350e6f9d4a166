//! End-to-end matching: keep the cache bundle current, then rank and explain.

use crate::cache::{BundleStore, CacheBundle, CacheState};
use crate::config::AppConfig;
use crate::corpus;
use crate::error::{MatchError, Result};
use crate::explain::{explain_vectors, Explanation};
use crate::extractor::ReaderRegistry;
use crate::fingerprint;
use crate::models::{Diagnostic, RankedDocument};
use crate::query::JobDescription;
use crate::scanner::IgnoreSet;
use crate::similarity::{rank_vector, Ranking};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of bringing the cache bundle up to date.
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    /// State found on disk before any rebuild.
    pub state: CacheState,
    pub rebuilt: bool,
    pub bundle: CacheBundle,
    /// Files left out of the bundle, whether it was rebuilt or reused.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub best: RankedDocument,
    pub ranking: Ranking,
    pub explanation: Explanation,
    pub cache_state: CacheState,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Pipeline {
    resumes_dir: PathBuf,
    store: BundleStore,
    registry: ReaderRegistry,
    ignore: IgnoreSet,
    top_terms: usize,
}

impl Pipeline {
    pub fn new(resumes_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            resumes_dir: resumes_dir.into(),
            store: BundleStore::new(cache_dir),
            registry: ReaderRegistry::with_defaults(),
            ignore: IgnoreSet::default(),
            top_terms: 10,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut pipeline = Self::new(cfg.resumes_dir(), cfg.cache_dir());
        pipeline.ignore = IgnoreSet::new(&cfg.corpus.ignore)?;
        pipeline.top_terms = cfg.explain.top_terms;
        Ok(pipeline)
    }

    pub fn with_registry(mut self, registry: ReaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_top_terms(mut self, top_terms: usize) -> Self {
        self.top_terms = top_terms;
        self
    }

    pub fn resumes_dir(&self) -> &Path {
        &self.resumes_dir
    }

    pub fn store(&self) -> &BundleStore {
        &self.store
    }

    /// Cache state without rebuilding; the bundle is returned only when fresh.
    pub fn status(&self) -> Result<(CacheState, Option<CacheBundle>)> {
        let current = fingerprint::snapshot(&self.resumes_dir, &self.ignore)?;
        self.store.assess(&current)
    }

    /// Reuses a fresh bundle, otherwise refits the whole corpus and persists it.
    pub fn load_or_build(&self, force_rebuild: bool) -> Result<BundleOutcome> {
        let current = fingerprint::snapshot(&self.resumes_dir, &self.ignore)?;
        let (state, cached) = self.store.assess(&current)?;
        match cached {
            Some(bundle) if state == CacheState::Fresh && !force_rebuild => {
                info!("Using cached vector space ({} documents)", bundle.matrix.len());
                let diagnostics = bundle.diagnostics.clone();
                return Ok(BundleOutcome {
                    state,
                    rebuilt: false,
                    bundle,
                    diagnostics,
                });
            }
            _ if force_rebuild => info!("Forced rebuild requested; cache is {}", state),
            _ => info!("Cache is {}; fitting vector space", state),
        }

        let load = corpus::load_corpus(&self.resumes_dir, &self.registry, &self.ignore)?;
        let bundle = CacheBundle::build(&load, current)?;
        self.store.save(&bundle)?;
        Ok(BundleOutcome {
            state,
            rebuilt: true,
            bundle,
            diagnostics: load.diagnostics,
        })
    }

    pub fn find_best_match(&self, jd: &JobDescription) -> Result<MatchReport> {
        let outcome = self.load_or_build(false)?;
        match_against(&outcome, &jd.query_text(), self.top_terms)
    }
}

/// Ranks `query_text` against an up-to-date bundle and explains the winner.
pub fn match_against(outcome: &BundleOutcome, query_text: &str, top_terms: usize) -> Result<MatchReport> {
    let bundle = &outcome.bundle;
    let query = bundle.model.project(query_text);
    let ranking = rank_vector(&query, &bundle.matrix)?;
    let best = ranking.best().cloned().ok_or(MatchError::EmptyCorpus)?;
    let row = bundle.matrix.row(best.index).ok_or_else(|| {
        MatchError::CacheCorruption(format!("no row for document {}", best.identifier))
    })?;
    let explanation = explain_vectors(&bundle.model, row, &query, top_terms);
    info!("Best match: {} ({:.4})", best.identifier, best.score);
    Ok(MatchReport {
        best,
        ranking,
        explanation,
        cache_state: outcome.state,
        diagnostics: outcome.diagnostics.clone(),
    })
}

pub fn find_best_match(cfg: &AppConfig, jd_path: &Path) -> Result<MatchReport> {
    let jd = JobDescription::from_path(jd_path)?;
    Pipeline::from_config(cfg)?.find_best_match(&jd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn empty_resume_directory_is_empty_corpus() {
        let temp = tempfile::tempdir().unwrap();
        let resumes = temp.path().join("resumes");
        fs::create_dir(&resumes).unwrap();
        fs::write(resumes.join("notes.rtf"), "rtf").unwrap();

        let pipeline = Pipeline::new(&resumes, temp.path().join("cache"));
        assert!(matches!(pipeline.load_or_build(false), Err(MatchError::EmptyCorpus)));
        assert!(!pipeline.store().is_complete());
    }

    #[test]
    fn forced_rebuild_refits_even_when_fresh() {
        let temp = tempfile::tempdir().unwrap();
        let resumes = temp.path().join("resumes");
        fs::create_dir(&resumes).unwrap();
        fs::write(resumes.join("a.txt"), "python backend").unwrap();

        let pipeline = Pipeline::new(&resumes, temp.path().join("cache"));
        let first = pipeline.load_or_build(false).unwrap();
        assert_eq!(first.state, CacheState::Absent);
        assert!(first.rebuilt);

        let forced = pipeline.load_or_build(true).unwrap();
        assert!(forced.rebuilt);
        assert_eq!(forced.state, CacheState::Fresh);
        assert_eq!(forced.bundle.matrix.identifiers(), first.bundle.matrix.identifiers());
    }

    #[test]
    fn forced_rebuild_on_empty_cache_reports_absent() {
        let temp = tempfile::tempdir().unwrap();
        let resumes = temp.path().join("resumes");
        fs::create_dir(&resumes).unwrap();
        fs::write(resumes.join("a.txt"), "python backend").unwrap();

        let pipeline = Pipeline::new(&resumes, temp.path().join("cache"));
        let forced = pipeline.load_or_build(true).unwrap();
        assert!(forced.rebuilt);
        assert_eq!(forced.state, CacheState::Absent);
        assert_eq!(pipeline.load_or_build(false).unwrap().state, CacheState::Fresh);
    }

    #[test]
    fn invalid_ignore_glob_is_a_config_error() {
        let mut cfg = AppConfig::default();
        cfg.corpus.ignore = vec!["[unclosed".into()];
        assert!(matches!(Pipeline::from_config(&cfg), Err(MatchError::InvalidConfig(_))));
    }

    #[test]
    fn report_explains_the_top_document() {
        let temp = tempfile::tempdir().unwrap();
        let resumes = temp.path().join("resumes");
        fs::create_dir(&resumes).unwrap();
        fs::write(resumes.join("a.txt"), "python backend developer api").unwrap();
        fs::write(resumes.join("b.txt"), "painter oil canvas exhibition").unwrap();

        let pipeline = Pipeline::new(&resumes, temp.path().join("cache")).with_top_terms(1);
        let jd = JobDescription {
            title: "Backend engineer".into(),
            description: "seeking python".into(),
            requirements: "".into(),
        };
        let report = pipeline.find_best_match(&jd).unwrap();
        assert_eq!(report.best.identifier, "a.txt");
        assert_eq!(report.explanation.len(), 1);
        assert!(["python", "backend"].contains(&report.explanation[0].term.as_str()));
    }
}
