//! Cosine ranking of corpus rows against a projected query.

use crate::error::{MatchError, Result};
use crate::models::RankedDocument;
use crate::vectorspace::{CorpusMatrix, SparseVector, VectorSpaceModel};
use serde::{Deserialize, Serialize};

/// Corpus documents ordered by descending similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankedDocument>,
}

impl Ranking {
    pub fn best(&self) -> Option<&RankedDocument> {
        self.entries.first()
    }

    pub fn top(&self, n: usize) -> &[RankedDocument] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn cosine(a: &SparseVector, b: &SparseVector) -> f32 {
    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}

pub fn rank(query_text: &str, model: &VectorSpaceModel, matrix: &CorpusMatrix) -> Result<Ranking> {
    rank_vector(&model.project(query_text), matrix)
}

/// Ranks an already projected query. Equal scores keep corpus order.
pub fn rank_vector(query: &SparseVector, matrix: &CorpusMatrix) -> Result<Ranking> {
    if query.is_zero() {
        return Err(MatchError::EmptyQuery);
    }
    let mut entries: Vec<RankedDocument> = matrix
        .rows()
        .enumerate()
        .map(|(index, (identifier, row))| RankedDocument {
            index,
            identifier: identifier.to_string(),
            score: cosine(query, row),
        })
        .collect();
    // sort_by is stable
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(Ranking { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(docs: &[(&str, &str)]) -> (VectorSpaceModel, CorpusMatrix) {
        let texts: Vec<&str> = docs.iter().map(|(_, t)| *t).collect();
        let (model, rows) = VectorSpaceModel::fit(&texts).unwrap();
        let ids = docs.iter().map(|(id, _)| id.to_string()).collect();
        let matrix = CorpusMatrix::new(&model, ids, rows).unwrap();
        (model, matrix)
    }

    #[test]
    fn python_backend_beats_painter() {
        let (model, matrix) = corpus(&[
            ("A", "python backend developer api"),
            ("B", "painter oil canvas exhibition"),
        ]);
        let ranking = rank("seeking python backend engineer", &model, &matrix).unwrap();
        assert_eq!(ranking.best().unwrap().identifier, "A");
        assert!(ranking.entries[0].score > ranking.entries[1].score);
        assert_eq!(ranking.entries[1].score, 0.0);
    }

    #[test]
    fn one_bounded_score_per_document_in_order() {
        let (model, matrix) = corpus(&[
            ("a", "rust systems programming tokio"),
            ("b", "python data science pandas"),
            ("c", "rust python polyglot engineer"),
            ("d", "empty"),
        ]);
        let ranking = rank("rust engineer python", &model, &matrix).unwrap();
        assert_eq!(ranking.len(), 4);
        assert!(ranking.entries.iter().all(|e| (0.0..=1.0).contains(&e.score)));
        assert!(ranking.entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranking.best().unwrap().identifier, "c");
    }

    #[test]
    fn ties_keep_corpus_order() {
        let (model, matrix) = corpus(&[
            ("first", "rust developer"),
            ("second", "rust developer"),
            ("third", "gardener"),
        ]);
        let ranking = rank("rust", &model, &matrix).unwrap();
        let order: Vec<_> = ranking.entries.iter().map(|e| e.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(ranking.entries[0].score, ranking.entries[1].score);
    }

    #[test]
    fn degenerate_queries_fail() {
        let (model, matrix) = corpus(&[("a", "rust developer")]);
        for q in ["", "   ", "the and of", "quantum blockchain"] {
            assert!(matches!(rank(q, &model, &matrix), Err(MatchError::EmptyQuery)), "{q:?}");
        }
    }

    #[test]
    fn identical_text_scores_one() {
        let (model, matrix) = corpus(&[("a", "rust developer"), ("b", "chef")]);
        let ranking = rank("rust developer", &model, &matrix).unwrap();
        assert!((ranking.entries[0].score - 1.0).abs() < 1e-5);
    }
}
