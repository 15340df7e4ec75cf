//! Discovery of the input documents checked against each candidate

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Suffix of the documents collected from a directory tree
pub const DOCUMENT_SUFFIX: &str = ".d.ts";

/// Document contents keyed by path relative to the collection root
pub type Documents = IndexMap<PathBuf, String>;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Collect the documents at `path`.
///
/// A file ending in `.d.ts` is collected under its file name; any other file
/// yields no documents. A directory is walked recursively and every file
/// ending in `.d.ts` is collected under its path relative to the directory,
/// in a stable (sorted) order.
pub fn collect_documents(path: &Path) -> Result<Documents, InputError> {
    let metadata = std::fs::metadata(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut documents = Documents::new();
    if metadata.is_file() {
        if !is_document(path) {
            debug!("Skipping {:?}: not a {} file", path, DOCUMENT_SUFFIX);
            return Ok(documents);
        }
        let name = path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf());
        documents.insert(name, read(path)?);
        return Ok(documents);
    }

    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_document(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(path)
            .unwrap_or(entry.path())
            .to_path_buf();
        debug!("Collected {:?}", relative);
        documents.insert(relative, read(entry.path())?);
    }

    Ok(documents)
}

fn is_document(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(DOCUMENT_SUFFIX))
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}
