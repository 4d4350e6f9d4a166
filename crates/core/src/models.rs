//! Plain data passed between the loader, the ranker and the reports.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub identifier: String,
    pub text: String,
}

/// A file left out of the corpus, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub identifier: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct CorpusLoad {
    pub documents: Vec<Document>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CorpusLoad {
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.identifier.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub index: usize,
    pub identifier: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f32,
}
