//! Explicit node selections and the resolver that turns them into
//! documents without going through the scorer.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    domain::DomainConfig,
    error::{Error, Result},
    record::{DocumentRecord, ScoredRecord},
    walker,
};

/// Score given to every explicitly selected document. Higher than anything
/// the lexical scorer produces with the default weights.
pub const SELECTED_SCORE: f32 = 100.0;

/// One selected taxonomy node with the file names listed in its folder when
/// it was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedNode {
    pub id: String,
    pub label: String,
    pub files: Vec<String>,
}

/// The session's current selection, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSelection {
    nodes: Vec<SelectedNode>,
}

impl ContextSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection, keeping the first entry of any repeated id.
    pub fn from_nodes(nodes: impl IntoIterator<Item = SelectedNode>) -> Self {
        let mut selection = Self::new();
        for node in nodes {
            selection.add(node);
        }
        selection
    }

    /// Add a node. Returns `false` if its id was already selected.
    pub fn add(&mut self, node: SelectedNode) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    /// Returns `false` if `id` was not selected.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        self.nodes.len() != before
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[SelectedNode] {
        &self.nodes
    }

    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.label.as_str()).collect()
    }

    pub fn node_to_files(&self) -> HashMap<String, Vec<String>> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.files.clone()))
            .collect()
    }

    /// Folder names the scorer restricts a query to: the node's folder
    /// segment when the domain knows it, otherwise its label.
    pub fn context_folders(&self, domain: &dyn DomainConfig) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| {
                domain
                    .expected_path_segment(&n.id)
                    .unwrap_or_else(|| n.label.clone())
            })
            .collect()
    }
}

/// Build the selection entry for `id`, listing the files directly inside
/// its folder under `corpus_root`.
///
/// Unknown ids are an error; a node whose folder is missing or has no
/// folder at all (the root) is selected with an empty file list.
pub fn select_node(
    corpus_root: &Path,
    domain: &dyn DomainConfig,
    id: &str,
) -> Result<SelectedNode> {
    let node = domain.taxonomy().get(id).ok_or_else(|| Error::NotFound {
        kind: "node",
        name: id.to_string(),
    })?;

    let files = domain
        .decompose_node_id(id)
        .map(|folder| {
            let mut dir = corpus_root.join(folder.group);
            if let Some(leaf) = folder.leaf {
                dir.push(leaf);
            }
            walker::list_folder_files(&dir)
        })
        .unwrap_or_default();

    Ok(SelectedNode {
        id: node.id.clone(),
        label: node.label.clone(),
        files,
    })
}

/// Resolve selected node ids to the documents they contain.
///
/// A file listed for a node matches the record with the same name whose
/// path ends in the node's folder segment, so equally named files in other
/// folders are not picked up. Nodes without a known folder fall back to the
/// first record with that name. Results are deduplicated by path, first
/// occurrence wins, and every one is scored [`SELECTED_SCORE`].
pub fn resolve_selection<S: AsRef<str>>(
    selected: &[S],
    node_to_files: &HashMap<String, Vec<String>>,
    records: &[DocumentRecord],
    domain: &dyn DomainConfig,
) -> Vec<ScoredRecord> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for id in selected {
        let id = id.as_ref();
        if !domain.taxonomy().contains(id) {
            warn!("ignoring unknown node id '{id}' in context selection");
            continue;
        }
        let Some(files) = node_to_files.get(id) else {
            continue;
        };
        let segment = domain
            .expected_path_segment(id)
            .map(|s| s.to_lowercase());

        for file in files {
            let found = match &segment {
                Some(segment) => {
                    let suffix = format!("{segment}/{}", file.to_lowercase());
                    records.iter().find(|r| {
                        r.name == *file
                            && r.normalized_path().ends_with(&suffix)
                    })
                }
                None => records.iter().find(|r| r.name == *file),
            };

            if let Some(record) = found
                && seen.insert(record.path.clone())
            {
                resolved.push(ScoredRecord::new(record, SELECTED_SCORE));
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn rec(path: &str) -> DocumentRecord {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        DocumentRecord {
            path: path.to_string(),
            name: name.clone(),
            extension: "pdf".to_string(),
            text: name,
        }
    }

    fn node(id: &str, files: &[&str]) -> SelectedNode {
        SelectedNode {
            id: id.to_string(),
            label: id.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn selection_add_remove_clear() {
        let mut sel = ContextSelection::new();
        assert!(sel.add(node("west_accounting", &[])));
        assert!(!sel.add(node("west_accounting", &["x.pdf"])));
        assert!(sel.add(node("east_legal", &[])));
        assert_eq!(sel.ids(), vec!["west_accounting", "east_legal"]);
        assert!(sel.nodes()[0].files.is_empty());

        assert!(sel.remove("west_accounting"));
        assert!(!sel.remove("west_accounting"));
        assert_eq!(sel.len(), 1);

        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn same_file_name_in_other_region_is_excluded() {
        let fnb = Domain::Fnb.config().unwrap();
        let records = vec![
            rec("/data/West_Group/Accounting/q1_report.pdf"),
            rec("/data/East_Group/Accounting/q1_report.pdf"),
        ];
        let sel = ContextSelection::from_nodes([node(
            "west_accounting",
            &["q1_report.pdf"],
        )]);

        let docs = resolve_selection(
            &sel.ids(),
            &sel.node_to_files(),
            &records,
            fnb.as_ref(),
        );
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].record.path, records[0].path);
        assert_eq!(docs[0].score, SELECTED_SCORE);
    }

    #[test]
    fn resolution_is_idempotent_and_deduplicated() {
        let fnb = Domain::Fnb.config().unwrap();
        let records = vec![
            rec("/data/West_Group/Accounting/q1.pdf"),
            rec("/data/West_Group/Accounting/q2.pdf"),
        ];
        let sel = ContextSelection::from_nodes([
            node("west_accounting", &["q1.pdf", "q2.pdf", "q1.pdf"]),
            node("east_accounting", &["missing.pdf"]),
        ]);

        let run = || {
            resolve_selection(
                &sel.ids(),
                &sel.node_to_files(),
                &records,
                fnb.as_ref(),
            )
        };
        let first = run();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|d| d.score == SELECTED_SCORE));
        assert_eq!(first, run());
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let fnb = Domain::Fnb.config().unwrap();
        let records = vec![rec("/data/West_Group/Accounting/q1.pdf")];
        let mut map = HashMap::new();
        map.insert("north_accounting".to_string(), vec!["q1.pdf".to_string()]);

        let docs = resolve_selection(
            &["north_accounting"],
            &map,
            &records,
            fnb.as_ref(),
        );
        assert!(docs.is_empty());
    }

    #[test]
    fn root_node_falls_back_to_file_name() {
        let fnb = Domain::Fnb.config().unwrap();
        let records = vec![rec("/data/overview.pdf")];
        let mut map = HashMap::new();
        map.insert(
            "restaurant_franchise".to_string(),
            vec!["overview.pdf".to_string()],
        );

        let docs = resolve_selection(
            &["restaurant_franchise"],
            &map,
            &records,
            fnb.as_ref(),
        );
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn select_node_lists_folder_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("West_Group").join("Accounting");
        std::fs::create_dir_all(dir.join("archive")).unwrap();
        std::fs::write(dir.join("q1.pdf"), "x").unwrap();
        std::fs::write(dir.join("archive").join("old.pdf"), "x").unwrap();

        let fnb = Domain::Fnb.config().unwrap();
        let node =
            select_node(tmp.path(), fnb.as_ref(), "west_accounting").unwrap();
        assert_eq!(node.label, "Accounting");
        assert_eq!(node.files, vec!["q1.pdf"]);

        let empty =
            select_node(tmp.path(), fnb.as_ref(), "east_permits").unwrap();
        assert!(empty.files.is_empty());

        let err = select_node(tmp.path(), fnb.as_ref(), "nowhere").unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "node", .. }));
    }

    #[test]
    fn context_folders_prefer_segments() {
        let fnb = Domain::Fnb.config().unwrap();
        let sel = ContextSelection::from_nodes([
            node("west_accounting", &[]),
            node("restaurant_franchise", &[]),
        ]);
        assert_eq!(
            sel.context_folders(fnb.as_ref()),
            vec!["West_Group/Accounting", "restaurant_franchise"]
        );
    }

    #[test]
    fn selection_serializes_in_order() {
        let sel = ContextSelection::from_nodes([
            node("b", &["1.pdf"]),
            node("a", &[]),
        ]);
        let json = serde_json::to_string(&sel).unwrap();
        let back: ContextSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ids(), vec!["b", "a"]);
    }
}
