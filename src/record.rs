use serde::Serialize;

/// One file of the corpus.
///
/// Records are built once by the indexer and never mutated afterwards.
/// Scoring passes wrap a clone in a [`ScoredRecord`] instead of writing a
/// score into the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    /// Full path of the file, unique across the corpus.
    pub path: String,
    /// File basename.
    pub name: String,
    /// Lowercase extension without the leading dot, empty if none.
    pub extension: String,
    /// Best-effort extracted text. Never empty: falls back to `name`.
    pub text: String,
}

impl DocumentRecord {
    /// Path with `\` separators folded to `/` and lowercased, the form every
    /// path comparison in the crate works on.
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    pub fn icon(&self) -> &'static str {
        icon_for_extension(&self.extension)
    }
}

/// A record together with the score assigned by a retrieval pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: DocumentRecord,
    pub score: f32,
}

impl ScoredRecord {
    pub fn new(record: &DocumentRecord, score: f32) -> Self {
        Self {
            record: record.clone(),
            score,
        }
    }
}

pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}

/// Glyph used when an extension has no dedicated icon.
pub const DEFAULT_ICON: &str = "📁";

/// Map a file extension to a display glyph.
pub fn icon_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "pdf" | "txt" => "📄",
        "doc" | "docx" => "📝",
        "xls" | "xlsx" => "📊",
        "csv" => "🧾",
        "md" => "🗒️",
        "ppt" | "pptx" => "📈",
        "png" | "jpg" | "jpeg" | "gif" => "🖼️",
        "json" => "🧩",
        _ => DEFAULT_ICON,
    }
}
