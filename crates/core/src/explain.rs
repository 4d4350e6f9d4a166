//! Shared high-weight terms behind a match.

use crate::models::TermWeight;
use crate::vectorspace::{SparseVector, VectorSpaceModel};

pub type Explanation = Vec<TermWeight>;

pub fn explain(
    model: &VectorSpaceModel,
    document_text: &str,
    query_text: &str,
    top_n: usize,
) -> Explanation {
    explain_vectors(model, &model.project(document_text), &model.project(query_text), top_n)
}

/// Terms positive in both vectors, scored by the mean of the two weights.
pub fn explain_vectors(
    model: &VectorSpaceModel,
    document: &SparseVector,
    query: &SparseVector,
    top_n: usize,
) -> Explanation {
    let mut shared: Vec<(u32, f32)> = query
        .iter()
        .filter_map(|(idx, q)| {
            let d = document.get(idx);
            (q > 0.0 && d > 0.0).then_some((idx, (q + d) / 2.0))
        })
        .collect();
    shared.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    shared
        .into_iter()
        .take(top_n)
        .filter_map(|(idx, weight)| {
            model.term(idx).map(|term| TermWeight {
                term: term.to_string(),
                weight,
            })
        })
        .collect()
}
