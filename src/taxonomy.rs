use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
    domain::DomainConfig,
    error::{Error, Result},
};

/// Position of a node in the board hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Group,
    Folder,
    PracticeArea,
    Matter,
}

impl NodeKind {
    /// Leaf kinds are the ones that hold documents and that
    /// [`node_ids_from_paths`] can produce.
    pub fn is_leaf(self) -> bool {
        matches!(self, Self::Folder | Self::Matter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Group => "group",
            Self::Folder => "folder",
            Self::PracticeArea => "practice_area",
            Self::Matter => "matter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyNode {
    pub id: String,
    pub label: String,
    /// Id of the containing node; `None` only for the root.
    pub parent: Option<String>,
    pub kind: NodeKind,
}

impl TaxonomyNode {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        parent: Option<&str>,
        kind: NodeKind,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent: parent.map(str::to_string),
            kind,
        }
    }
}

/// The immutable node tree of one domain configuration.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    nodes: Vec<TaxonomyNode>,
    by_id: HashMap<String, usize>,
    root: usize,
}

impl Taxonomy {
    /// Build a taxonomy, checking that it forms a single rooted tree.
    ///
    /// Duplicate ids, dangling parents, cycles and a missing or repeated
    /// root are reported as [`Error::DomainConfig`].
    pub fn from_nodes(
        domain: &'static str,
        nodes: Vec<TaxonomyNode>,
    ) -> Result<Self> {
        let malformed = |reason: String| Error::DomainConfig { domain, reason };

        let mut by_id = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if by_id.insert(node.id.clone(), idx).is_some() {
                return Err(malformed(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        let mut roots =
            nodes.iter().enumerate().filter(|(_, n)| n.parent.is_none());
        let root = match (roots.next(), roots.next()) {
            (Some((idx, _)), None) => idx,
            (None, _) => return Err(malformed("taxonomy has no root".into())),
            (Some(_), Some((_, second))) => {
                return Err(malformed(format!(
                    "taxonomy has more than one root (second: '{}')",
                    second.id
                )));
            }
        };

        for node in &nodes {
            if let Some(parent) = &node.parent
                && !by_id.contains_key(parent)
            {
                return Err(malformed(format!(
                    "node '{}' references unknown parent '{parent}'",
                    node.id
                )));
            }
        }

        // Every walk upwards must reach the root within nodes.len() steps.
        for node in &nodes {
            let mut current = node;
            let mut steps = 0;
            while let Some(parent) = &current.parent {
                steps += 1;
                if steps > nodes.len() {
                    return Err(malformed(format!(
                        "cycle detected above node '{}'",
                        node.id
                    )));
                }
                current = &nodes[by_id[parent]];
            }
        }

        Ok(Self { nodes, by_id, root })
    }

    pub fn root(&self) -> &TaxonomyNode {
        &self.nodes[self.root]
    }

    pub fn get(&self, id: &str) -> Option<&TaxonomyNode> {
        self.by_id.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All nodes in construction order (parents before children).
    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.nodes
    }

    pub fn children<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a TaxonomyNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent.as_deref() == Some(id))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &TaxonomyNode> {
        self.nodes.iter().filter(|n| n.kind.is_leaf())
    }

    /// The chain from `id` up to and including the root.
    pub fn ancestry(&self, id: &str) -> Vec<&TaxonomyNode> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.as_deref().and_then(|p| self.get(p));
        }
        chain
    }
}

/// Strip the separators that folder names use between words so that
/// `Smith_v_MegaCorp`, `smith-v-megacorp` and `Smith v MegaCorp` compare
/// equal.
pub fn normalize_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Map document paths to the leaf node ids they live under.
///
/// Each path is split into segments. A leaf segment is paired with the
/// nearest group segment above it, so group words in the corpus root
/// (`/srv/west/East_Group/...`) are overridden by the real group folder.
/// The first pair that composes a node id wins. Paths that never compose
/// one are skipped. Ids are returned in order of first appearance without
/// duplicates.
pub fn node_ids_from_paths<S: AsRef<str>>(
    paths: &[S],
    domain: &dyn DomainConfig,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for path in paths {
        let lowered = path.as_ref().replace('\\', "/").to_lowercase();
        let mut group = None;

        for segment in lowered.split('/').filter(|s| !s.is_empty()) {
            if let Some(group) = group
                && let Some(leaf) = domain.leaf_token(segment)
                && let Some(id) = domain.compose_node_id(group, leaf)
            {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
                break;
            }
            if let Some(token) = domain.group_token(segment) {
                group = Some(token);
            }
        }
    }

    ids
}
