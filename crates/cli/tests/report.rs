use cli::report;
use compass_core::cache::CacheState;
use compass_core::pipeline::{match_against, Pipeline};
use std::fs;
use tempfile::tempdir;

fn pipeline_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Pipeline) {
    let temp = tempdir().unwrap();
    let resumes = temp.path().join("resumes");
    fs::create_dir_all(&resumes).unwrap();
    for (name, text) in files {
        fs::write(resumes.join(name), text).unwrap();
    }
    let pipeline = Pipeline::new(&resumes, temp.path().join(".cache"));
    (temp, pipeline)
}

#[test]
fn text_report_names_best_match_terms_and_skips() {
    let (_temp, pipeline) = pipeline_with(&[
        ("a.txt", "python backend developer api"),
        ("b.txt", "painter oil canvas exhibition"),
        ("c.rtf", "unsupported"),
    ]);
    let outcome = pipeline.load_or_build(false).unwrap();
    let report = match_against(&outcome, "seeking python backend engineer", 10).unwrap();
    let text = report::render_match(&report, 2);

    assert!(text.starts_with("Best match: a.txt\n"));
    assert!(text.contains("Key matching terms in 'a.txt':"));
    assert!(text.contains("- python: "));
    assert!(text.contains("- backend: "));
    assert!(!text.contains("canvas"));
    assert!(text.contains("Top 2 candidates:"));
    assert!(text.contains("Skipped 1 file(s):"));
    assert!(text.contains("- c.rtf: unsupported file format: .rtf"));
}

#[test]
fn json_report_carries_ranking_and_cache_state() {
    let (_temp, pipeline) = pipeline_with(&[("a.txt", "rust engineer"), ("b.txt", "chef")]);
    pipeline.load_or_build(false).unwrap();
    let outcome = pipeline.load_or_build(false).unwrap();
    let report = match_against(&outcome, "rust", 5).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&report::render_match_json(&report).unwrap()).unwrap();
    assert_eq!(value["best"]["identifier"], "a.txt");
    assert_eq!(value["cache_state"], "fresh");
    assert_eq!(value["ranking"]["entries"].as_array().unwrap().len(), 2);
    assert_eq!(value["explanation"][0]["term"], "rust");
}

#[test]
fn status_reports_each_state() {
    let (temp, pipeline) = pipeline_with(&[("a.txt", "rust engineer")]);
    let (state, bundle) = pipeline.status().unwrap();
    assert_eq!(report::render_status(state, bundle.as_ref()), "cache: absent\n");

    let outcome = pipeline.load_or_build(false).unwrap();
    assert!(report::render_rebuild(&outcome).starts_with("rebuilt: 1 documents, 2 terms (cache was absent)"));

    let (state, bundle) = pipeline.status().unwrap();
    assert_eq!(state, CacheState::Fresh);
    let text = report::render_status(state, bundle.as_ref());
    assert!(text.contains("cache: fresh\ndocuments: 1\nterms: 2\n"));

    fs::write(temp.path().join("resumes").join("a.txt"), "rust engineer manager").unwrap();
    let (state, bundle) = pipeline.status().unwrap();
    assert_eq!(report::render_status(state, bundle.as_ref()), "cache: stale\n");
}

#[test]
fn forced_rebuild_names_the_real_prior_state() {
    let (_temp, pipeline) = pipeline_with(&[("a.txt", "rust engineer"), ("b.rtf", "rtf")]);
    let first = report::render_rebuild(&pipeline.load_or_build(true).unwrap());
    assert!(first.starts_with("rebuilt: 1 documents, 2 terms (cache was absent)"));

    let again = report::render_rebuild(&pipeline.load_or_build(true).unwrap());
    assert!(again.starts_with("rebuilt: 1 documents, 2 terms (cache was fresh)"));
    assert!(again.contains("- b.rtf: "));
}
