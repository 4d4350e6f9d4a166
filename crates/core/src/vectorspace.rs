//! TF-IDF vector space: fitted vocabulary, IDF weights and the corpus matrix.
//!
//! A term's weight in a document is `count * ln((N + 1) / df)`, and every
//! vector is L2-normalised. The vocabulary is sorted, so a term's dimension is
//! its position and never depends on document order.

use crate::error::{MatchError, Result};
use crate::text::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sparse vector with strictly increasing indices and positive values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn get(&self, index: u32) -> f32 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j, mut acc) = (0, 0, 0.0f32);
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }

    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for v in self.values.iter_mut() {
                *v /= norm;
            }
        }
    }

    fn is_well_formed(&self, dims: usize) -> bool {
        self.indices.len() == self.values.len()
            && self.indices.windows(2).all(|w| w[0] < w[1])
            && self.indices.last().map_or(true, |&i| (i as usize) < dims)
            && self.values.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSpaceModel {
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    doc_count: usize,
}

impl VectorSpaceModel {
    /// Fits the model over `texts` and returns it with one row per text.
    pub fn fit(texts: &[&str]) -> Result<(Self, Vec<SparseVector>)> {
        if texts.is_empty() {
            return Err(MatchError::EmptyCorpus);
        }
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();

        let vocabulary: Vec<String> = tokenized
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if vocabulary.is_empty() {
            return Err(MatchError::EmptyCorpus);
        }

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                if let Ok(idx) = vocabulary.binary_search_by(|v| v.as_str().cmp(term)) {
                    doc_freq[idx] += 1;
                }
            }
        }

        let n = texts.len() as f32;
        let idf = doc_freq
            .iter()
            .map(|&df| ((n + 1.0) / df.max(1) as f32).ln())
            .collect();

        let model = Self {
            vocabulary,
            idf,
            doc_count: texts.len(),
        };
        debug!(
            "fitted {} terms over {} documents",
            model.dims(),
            model.doc_count
        );
        let rows = tokenized.iter().map(|t| model.vectorize(t)).collect();
        Ok((model, rows))
    }

    pub fn dims(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn term(&self, index: u32) -> Option<&str> {
        self.vocabulary.get(index as usize).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<u32> {
        self.vocabulary
            .binary_search_by(|v| v.as_str().cmp(term))
            .ok()
            .map(|i| i as u32)
    }

    /// Projects text into the fitted space. Unknown terms are dropped.
    pub fn project(&self, text: &str) -> SparseVector {
        self.vectorize(&tokenize(text))
    }

    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for token in tokens {
            if let Some(idx) = self.index_of(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        let mut vector = SparseVector::default();
        for (idx, count) in counts {
            let weight = count * self.idf[idx as usize];
            if weight > 0.0 {
                vector.indices.push(idx);
                vector.values.push(weight);
            }
        }
        vector.normalize();
        vector
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.idf.len() != self.vocabulary.len() {
            return Err(MatchError::CacheCorruption(format!(
                "idf has {} entries for {} terms",
                self.idf.len(),
                self.vocabulary.len()
            )));
        }
        if !self.vocabulary.windows(2).all(|w| w[0] < w[1]) {
            return Err(MatchError::CacheCorruption(
                "vocabulary is not sorted".to_string(),
            ));
        }
        Ok(())
    }
}

/// One normalised row per document, in corpus order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusMatrix {
    dims: usize,
    identifiers: Vec<String>,
    rows: Vec<SparseVector>,
}

impl CorpusMatrix {
    pub fn new(
        model: &VectorSpaceModel,
        identifiers: Vec<String>,
        rows: Vec<SparseVector>,
    ) -> Result<Self> {
        let matrix = Self {
            dims: model.dims(),
            identifiers,
            rows,
        };
        matrix.validate(model)?;
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &SparseVector)> + '_ {
        self.identifiers.iter().map(String::as_str).zip(self.rows.iter())
    }

    pub(crate) fn validate(&self, model: &VectorSpaceModel) -> Result<()> {
        if self.rows.len() != self.identifiers.len() {
            return Err(MatchError::CacheCorruption(format!(
                "{} rows for {} documents",
                self.rows.len(),
                self.identifiers.len()
            )));
        }
        if self.dims != model.dims() {
            return Err(MatchError::CacheCorruption(format!(
                "matrix has {} columns, model has {} terms",
                self.dims,
                model.dims()
            )));
        }
        if self.rows.len() != model.doc_count() {
            return Err(MatchError::CacheCorruption(format!(
                "matrix has {} rows, model was fitted on {} documents",
                self.rows.len(),
                model.doc_count()
            )));
        }
        if let Some(pos) = self.rows.iter().position(|r| !r.is_well_formed(self.dims)) {
            return Err(MatchError::CacheCorruption(format!("row {pos} is malformed")));
        }
        Ok(())
    }
}
