use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::search::SourceDocument;

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Documents found under a corpus root.
#[derive(Debug, Default)]
pub struct Corpus {
    pub documents: Vec<SourceDocument>,
    /// Relative names of matching files that could not be read as UTF-8 text.
    pub skipped: Vec<String>,
}

/// Loads every text document under `root`, ordered by relative path.
/// The relative path (with `/` separators) becomes the document name.
pub fn load_documents(root: &Path) -> Result<Corpus> {
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "document directory {} does not exist",
            root.display()
        )));
    }

    let mut corpus = Corpus::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() || !is_document(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match fs::read_to_string(entry.path()) {
            Ok(text) => {
                debug!(document = %relative, chars = text.chars().count(), "loaded document");
                corpus.documents.push(SourceDocument::new(relative, text));
            }
            Err(e) => {
                warn!(document = %relative, error = %e, "skipping unreadable document");
                corpus.skipped.push(relative);
            }
        }
    }

    Ok(corpus)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
