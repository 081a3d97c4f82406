use std::path::{Path, PathBuf};

use globset::GlobSet;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    extract::{self, ExtractionError},
    record::DocumentRecord,
    walker::{self, DiscoveredFile},
};

/// Options applied while scanning a corpus root.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Files whose relative path or name matches are not indexed.
    pub exclude: Option<GlobSet>,
}

/// Counters reported after a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub files: usize,
    pub extracted: usize,
    pub fallbacks: usize,
}

impl std::fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) indexed, {} with extracted text, {} searchable by name only",
            self.files, self.extracted, self.fallbacks
        )
    }
}

/// A read-only snapshot of an indexed corpus.
///
/// Rescanning produces a new, unrelated snapshot; nothing is shared
/// between the two.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    records: Vec<DocumentRecord>,
    summary: IndexSummary,
}

impl Corpus {
    /// Scan `root` and build a snapshot.
    pub fn scan(root: &Path, options: &IndexOptions) -> Self {
        let files = walker::discover_files(root, options.exclude.as_ref());

        // Extraction runs in parallel; collect() keeps discovery order.
        let loaded: Vec<(DocumentRecord, bool)> =
            files.par_iter().map(load_record).collect();

        let extracted = loaded.iter().filter(|(_, ok)| *ok).count();
        let summary = IndexSummary {
            files: loaded.len(),
            extracted,
            fallbacks: loaded.len() - extracted,
        };
        info!("scanned {}: {summary}", root.display());

        Self {
            root: root.to_path_buf(),
            records: loaded.into_iter().map(|(record, _)| record).collect(),
            summary,
        }
    }

    /// Build a snapshot from records that were produced elsewhere.
    pub fn from_records(root: &Path, records: Vec<DocumentRecord>) -> Self {
        let summary = IndexSummary {
            files: records.len(),
            extracted: records.len(),
            fallbacks: 0,
        };
        Self {
            root: root.to_path_buf(),
            records,
            summary,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[DocumentRecord] {
        &self.records
    }

    pub fn summary(&self) -> &IndexSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Index every file under `root`.
///
/// A root that does not exist yields an empty list.
pub fn index(root: &Path) -> Vec<DocumentRecord> {
    Corpus::scan(root, &IndexOptions::default()).records
}

/// Build the record for one file. The flag reports whether real text was
/// extracted or the name fallback was used.
fn load_record(file: &DiscoveredFile) -> (DocumentRecord, bool) {
    let name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.relative_path.to_string_lossy().into_owned());
    let extension = file
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let (text, extracted) = match extract::extract_text(&file.path, &extension)
    {
        Ok(text) => (text, true),
        Err(ExtractionError::Unsupported { .. }) => (name.clone(), false),
        Err(e) => {
            debug!("falling back to filename for {}: {e}", file.path.display());
            (name.clone(), false)
        }
    };

    let record = DocumentRecord {
        path: file.path.to_string_lossy().into_owned(),
        name,
        extension,
        text,
    };
    (record, extracted)
}
