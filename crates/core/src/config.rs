//! Layered configuration: optional file, then `COMPASS__*` environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub corpus: CorpusConfig,
    pub explain: ExplainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub resumes_dir: String,
    pub cache_dir: String,
    pub job_descriptions_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            resumes_dir: "resumes".to_string(),
            cache_dir: ".cache".to_string(),
            job_descriptions_dir: "job_descriptions".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Extra glob patterns for files that are never part of the corpus.
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub top_terms: usize,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self { top_terms: 10 }
    }
}

impl AppConfig {
    pub fn resumes_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.resumes_dir)
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.cache_dir)
    }

    /// Resolves a job description argument: an existing path is used as is,
    /// otherwise it is looked up in `job_descriptions_dir` (adding `.json`
    /// when the name has no extension).
    pub fn resolve_job_description(&self, name: &str) -> PathBuf {
        let direct = PathBuf::from(name);
        if direct.exists() {
            return direct;
        }
        let mut candidate = PathBuf::from(&self.paths.job_descriptions_dir).join(name);
        if candidate.extension().is_none() {
            candidate.set_extension("json");
        }
        candidate
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("COMPASS").separator("__"));
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
