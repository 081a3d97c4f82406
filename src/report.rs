//! Rendering of retrievals for the terminal, scripts and agents.

use std::fmt::Write as _;

use serde::Serialize;

use crate::{
    engine::Retrieval,
    error::Result,
    record::ScoredRecord,
    taxonomy::Taxonomy,
    text_util,
};

/// JSON shape shared by the CLI and the MCP tools.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'a str>,
    pub result_count: usize,
    pub results: Vec<JsonResult<'a>>,
    pub highlights: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct JsonResult<'a> {
    pub rank: usize,
    pub score: f32,
    pub path: &'a str,
    pub name: &'a str,
    pub extension: &'a str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl<'a> JsonReport<'a> {
    pub fn new(query: Option<&'a str>, retrieval: &'a Retrieval) -> Self {
        let results = retrieval
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| JsonResult {
                rank: i + 1,
                score: doc.score,
                path: &doc.record.path,
                name: &doc.record.name,
                extension: &doc.record.extension,
                icon: doc.record.icon(),
                snippet: snippet(doc, query.unwrap_or_default()),
            })
            .collect::<Vec<_>>();
        Self {
            query,
            result_count: results.len(),
            results,
            highlights: &retrieval.highlights,
        }
    }
}

/// Text worth showing for a document. Records whose text is only the name
/// fallback have nothing to add.
fn snippet(doc: &ScoredRecord, query: &str) -> Option<String> {
    if doc.record.text == doc.record.name {
        return None;
    }
    text_util::extract_snippet(&doc.record.text, query)
}

/// Human-readable listing, one block per document.
pub fn format_human(query: Option<&str>, retrieval: &Retrieval) -> String {
    if retrieval.documents.is_empty() {
        return "No results found.\n".to_string();
    }

    let mut out = String::new();
    for (i, doc) in retrieval.documents.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. [{:.1}] {} {}",
            i + 1,
            doc.score,
            doc.record.icon(),
            doc.record.name
        );
        let _ = writeln!(out, "     {}", doc.record.path);
        if let Some(snippet) = snippet(doc, query.unwrap_or_default()) {
            let _ = writeln!(out, "     {snippet}");
        }
    }
    let _ = writeln!(out, "\n{} result(s)", retrieval.documents.len());
    if !retrieval.highlights.is_empty() {
        let _ = writeln!(out, "Highlight: {}", retrieval.highlights.join(", "));
    }
    out
}

pub fn format_json(
    query: Option<&str>,
    retrieval: &Retrieval,
) -> Result<String> {
    Ok(serde_json::to_string(&JsonReport::new(query, retrieval))?)
}

/// One path per line.
pub fn format_files(retrieval: &Retrieval) -> String {
    retrieval
        .documents
        .iter()
        .map(|d| format!("{}\n", d.record.path))
        .collect()
}

/// Indented tree of the taxonomy, ids next to labels.
pub fn format_taxonomy(taxonomy: &Taxonomy) -> String {
    let mut out = String::new();
    write_node(taxonomy, &taxonomy.root().id, 0, &mut out);
    out
}

fn write_node(taxonomy: &Taxonomy, id: &str, depth: usize, out: &mut String) {
    if let Some(node) = taxonomy.get(id) {
        let _ = writeln!(
            out,
            "{:indent$}{} ({}, {})",
            "",
            node.label,
            node.id,
            node.kind.as_str(),
            indent = depth * 2
        );
    }
    for child in taxonomy.children(id) {
        write_node(taxonomy, &child.id, depth + 1, out);
    }
}
