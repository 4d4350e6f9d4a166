//! Reads the resume directory into an ordered document collection.

use crate::error::Result;
use crate::extractor::ReaderRegistry;
use crate::models::{CorpusLoad, Diagnostic, Document};
use crate::scanner::{self, IgnoreSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads every readable file in `dir`, in file-name order.
///
/// Files the registry cannot read, and entries the scan could not inspect, are
/// reported as diagnostics and left out; only a failure to list the directory
/// itself is an error.
pub fn load_corpus(dir: &Path, registry: &ReaderRegistry, ignore: &IgnoreSet) -> Result<CorpusLoad> {
    info!("Loading corpus from {:?}", dir);
    let listing = scanner::list_entries(dir, ignore)?;
    let mut load = CorpusLoad {
        documents: Vec::new(),
        diagnostics: listing.skipped,
    };
    for entry in listing.entries {
        match registry.read(&entry.path) {
            Ok(text) => {
                debug!("loaded {} ({} bytes)", entry.identifier, text.len());
                load.documents.push(Document {
                    identifier: entry.identifier,
                    text,
                });
            }
            Err(err) => {
                warn!("Error reading {}: {}", entry.identifier, err);
                load.diagnostics.push(Diagnostic {
                    identifier: entry.identifier,
                    message: err.to_string(),
                });
            }
        }
    }
    load.diagnostics.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    info!(
        "Loaded {} documents, skipped {}",
        load.documents.len(),
        load.diagnostics.len()
    );
    Ok(load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn unsupported_files_become_diagnostics() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b.txt"), "rust developer").unwrap();
        fs::write(temp.path().join("a.txt"), "python developer").unwrap();
        fs::write(temp.path().join("c.rtf"), "{\\rtf1 chef}").unwrap();

        let load = load_corpus(temp.path(), &ReaderRegistry::with_defaults(), &IgnoreSet::default())
            .unwrap();
        assert_eq!(load.identifiers(), vec!["a.txt", "b.txt"]);
        assert_eq!(load.texts(), vec!["python developer", "rust developer"]);
        assert_eq!(load.diagnostics.len(), 1);
        assert_eq!(load.diagnostics[0].identifier, "c.rtf");
        assert!(load.diagnostics[0].message.contains(".rtf"));
    }

    #[test]
    fn unreadable_file_does_not_abort_the_batch() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("bad.txt"), [0xff, 0xfe]).unwrap();
        fs::write(temp.path().join("good.txt"), "ok").unwrap();

        let load = load_corpus(temp.path(), &ReaderRegistry::with_defaults(), &IgnoreSet::default())
            .unwrap();
        assert_eq!(load.identifiers(), vec!["good.txt"]);
        assert_eq!(load.diagnostics[0].identifier, "bad.txt");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_reported_beside_valid_files() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "python developer").unwrap();
        fs::write(temp.path().join("c.txt"), "rust developer").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing.txt"), temp.path().join("b.txt"))
            .unwrap();
        fs::write(temp.path().join("d.rtf"), "{\\rtf1}").unwrap();

        let load = load_corpus(temp.path(), &ReaderRegistry::with_defaults(), &IgnoreSet::default())
            .unwrap();
        assert_eq!(load.identifiers(), vec!["a.txt", "c.txt"]);
        let skipped: Vec<_> = load.diagnostics.iter().map(|d| d.identifier.as_str()).collect();
        assert_eq!(skipped, vec!["b.txt", "d.rtf"]);
    }

    #[test]
    fn empty_directory_yields_no_documents() {
        let temp = tempfile::tempdir().unwrap();
        let load = load_corpus(temp.path(), &ReaderRegistry::with_defaults(), &IgnoreSet::default())
            .unwrap();
        assert!(load.documents.is_empty());
        assert!(load.diagnostics.is_empty());
    }
}
