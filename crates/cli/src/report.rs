//! Text and JSON rendering of match, rebuild and status results.

use compass_core::cache::{CacheBundle, CacheState};
use compass_core::models::Diagnostic;
use compass_core::pipeline::{BundleOutcome, MatchReport};
use std::fmt::Write;

/// Plain-text report: best match, key terms, runner-ups and skipped files.
pub fn render_match(report: &MatchReport, show: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Best match: {}", report.best.identifier);
    let _ = writeln!(out, "Similarity: {:.4}", report.best.score);

    let _ = writeln!(out, "\nKey matching terms in '{}':", report.best.identifier);
    if report.explanation.is_empty() {
        let _ = writeln!(out, "  (no shared terms)");
    }
    for term in &report.explanation {
        let _ = writeln!(out, "- {}: {:.4}", term.term, term.weight);
    }

    if show > 1 {
        let _ = writeln!(out, "\nTop {} candidates:", show.min(report.ranking.len()));
        for (pos, entry) in report.ranking.top(show).iter().enumerate() {
            let _ = writeln!(out, "{:>3}. {:<40} {:.4}", pos + 1, entry.identifier, entry.score);
        }
    }

    push_diagnostics(&mut out, &report.diagnostics);
    out
}

pub fn render_match_json(report: &MatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn render_rebuild(outcome: &BundleOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "rebuilt: {} documents, {} terms (cache was {})",
        outcome.bundle.matrix.len(),
        outcome.bundle.model.dims(),
        outcome.state
    );
    push_diagnostics(&mut out, &outcome.diagnostics);
    out
}

pub fn render_status(state: CacheState, bundle: Option<&CacheBundle>) -> String {
    match bundle {
        Some(b) => format!(
            "cache: {}\ndocuments: {}\nterms: {}\nbuilt at: {}\n",
            state,
            b.matrix.len(),
            b.model.dims(),
            b.built_at.to_rfc3339()
        ),
        None => format!("cache: {state}\n"),
    }
}

fn push_diagnostics(out: &mut String, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nSkipped {} file(s):", diagnostics.len());
    for d in diagnostics {
        let _ = writeln!(out, "- {}: {}", d.identifier, d.message);
    }
}
