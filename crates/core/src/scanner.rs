//! Enumerates the resume directory and hashes file contents.

use crate::error::{MatchError, Result};
use crate::models::Diagnostic;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// OS and editor artifacts that never belong to a corpus.
const BUILTIN_IGNORES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "~$*"];

#[derive(Debug, Clone)]
pub struct ScannedEntry {
    pub identifier: String,
    pub path: PathBuf,
}

/// Directory listing: entries to read plus entries that could not be inspected.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub entries: Vec<ScannedEntry>,
    pub skipped: Vec<Diagnostic>,
}

/// File-name patterns excluded from both the corpus and the fingerprints.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    set: GlobSet,
}

impl IgnoreSet {
    pub fn new(extra: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pat in BUILTIN_IGNORES.iter().copied().chain(extra.iter().map(String::as_str)) {
            let glob = Glob::new(pat)
                .map_err(|e| MatchError::InvalidConfig(format!("corpus.ignore {pat:?}: {e}")))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| MatchError::InvalidConfig(format!("corpus.ignore: {e}")))?;
        Ok(Self { set })
    }

    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.set.is_match(file_name)
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        let mut builder = GlobSetBuilder::new();
        for pat in BUILTIN_IGNORES {
            if let Ok(glob) = Glob::new(pat) {
                builder.add(glob);
            }
        }
        Self {
            set: builder.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }
}

/// Regular files directly inside `dir`, sorted by file name.
///
/// Only a missing or unreadable `dir` is an error. An entry that cannot be
/// inspected, such as a dangling symlink, lands in `skipped`. Names that are
/// not valid UTF-8 are kept under their lossy form.
pub fn list_entries(dir: &Path, ignore: &IgnoreSet) -> Result<Listing> {
    // walkdir reports a missing root lazily; surface it as a plain io error.
    fs::metadata(dir)?;
    let mut listing = Listing::default();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let name = err
                    .path()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned());
                let Some(identifier) = name else {
                    return Err(std::io::Error::from(err).into());
                };
                if !ignore.is_ignored(&identifier) {
                    warn!("Cannot inspect {}: {}", identifier, err);
                    listing.skipped.push(Diagnostic {
                        identifier,
                        message: err.to_string(),
                    });
                }
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let identifier = entry.file_name().to_string_lossy().into_owned();
        if ignore.is_ignored(&identifier) {
            continue;
        }
        listing.entries.push(ScannedEntry {
            identifier,
            path: entry.path().to_path_buf(),
        });
    }
    Ok(listing)
}

/// Full-file blake3 digest as lowercase hex.
pub fn full_hash(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_sorted_and_artifacts_skipped() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join(".DS_Store"), "x").unwrap();
        fs::write(temp.path().join("~$draft.docx"), "x").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("c.txt"), "c").unwrap();

        let listing = list_entries(temp.path(), &IgnoreSet::default()).unwrap();
        assert!(listing.skipped.is_empty());
        let names: Vec<_> = listing.entries.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn configured_patterns_are_ignored() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("keep.txt"), "k").unwrap();
        fs::write(temp.path().join("notes.bak"), "n").unwrap();

        let ignore = IgnoreSet::new(&["*.bak".to_string()]).unwrap();
        let entries = list_entries(temp.path(), &ignore).unwrap().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].identifier, "keep.txt");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        assert!(list_entries(&temp.path().join("nope"), &IgnoreSet::default()).is_err());
    }

    #[test]
    fn malformed_ignore_glob_is_a_config_error() {
        let err = IgnoreSet::new(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, MatchError::InvalidConfig(ref msg) if msg.contains("corpus.ignore")));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing.txt"), temp.path().join("c.txt"))
            .unwrap();

        let listing = list_entries(temp.path(), &IgnoreSet::default()).unwrap();
        let names: Vec<_> = listing.entries.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(listing.skipped.len(), 1);
        assert_eq!(listing.skipped[0].identifier, "c.txt");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_listed_lossily() {
        use std::os::unix::ffi::OsStrExt;
        let temp = tempfile::tempdir().unwrap();
        let raw = std::ffi::OsStr::from_bytes(b"r\xffsum\xe9.txt");
        fs::write(temp.path().join(raw), "cv").unwrap();

        let listing = list_entries(temp.path(), &IgnoreSet::default()).unwrap();
        assert_eq!(listing.entries.len(), 1);
        assert_eq!(listing.entries[0].identifier, raw.to_string_lossy());
        assert_eq!(listing.entries[0].path, temp.path().join(raw));
    }

    #[test]
    fn hash_tracks_content() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("cv.txt");
        fs::write(&path, "one").unwrap();
        let first = full_hash(&path).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, full_hash(&path).unwrap());
        fs::write(&path, "two").unwrap();
        assert_ne!(first, full_hash(&path).unwrap());
    }
}
