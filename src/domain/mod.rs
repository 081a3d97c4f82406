//! Industry vocabularies and board shapes.
//!
//! Each domain configuration bundles the taxonomy tree with the fixed
//! vocabularies used to read structured hints out of a query and to map
//! folder names to node ids. The scorer and the resolvers only talk to
//! [`DomainConfig`], never to a concrete domain.

pub mod fnb;
pub mod legal;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    taxonomy::Taxonomy,
};

/// The closed set of domain configurations.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Food & beverage franchise: regions and back-office folders.
    #[default]
    Fnb,
    /// Law firm: practice areas and matters.
    Legal,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fnb => "fnb",
            Self::Legal => "legal",
        }
    }

    /// Build and validate the configuration for this domain.
    pub fn config(self) -> Result<Box<dyn DomainConfig>> {
        Ok(match self {
            Self::Fnb => Box::new(fnb::FnbDomain::new()?),
            Self::Legal => Box::new(legal::LegalDomain::new()?),
        })
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fnb" => Ok(Self::Fnb),
            "legal" => Ok(Self::Legal),
            other => Err(Error::Config(format!(
                "unknown domain '{other}' (expected fnb|legal)"
            ))),
        }
    }
}

/// Folder location of a taxonomy node relative to the corpus root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFolder {
    pub group: &'static str,
    pub leaf: Option<&'static str>,
}

impl NodeFolder {
    /// The path segment, e.g. `West_Group/Accounting`.
    pub fn segment(&self) -> String {
        match self.leaf {
            Some(leaf) => format!("{}/{leaf}", self.group),
            None => self.group.to_string(),
        }
    }
}

/// Domain-specific vocabulary and node-id rules.
///
/// The query resolvers receive the lowercased query (and its whitespace
/// separated words) and return the token the scorer then looks for in
/// document paths. Domains that have no notion of a given hint keep the
/// default `None`.
pub trait DomainConfig: Send + Sync + fmt::Debug {
    fn domain(&self) -> Domain;

    fn taxonomy(&self) -> &Taxonomy;

    /// Location token named by the query, matched in the raw lowercase
    /// path.
    fn resolve_location(&self, _words: &[&str]) -> Option<&'static str> {
        None
    }

    /// Canonical category named by the query, matched in the raw lowercase
    /// path.
    fn resolve_category(&self, _words: &[&str]) -> Option<&'static str> {
        None
    }

    /// Whether a lowercase file name mentions `category` under any of its
    /// query aliases.
    fn category_in_name(&self, _category: &str, _name: &str) -> bool {
        false
    }

    /// Practice-area token named by the query, matched in the normalized
    /// path (see [`crate::taxonomy::normalize_segment`]).
    fn resolve_practice_area(&self, _query: &str) -> Option<&'static str> {
        None
    }

    /// Matter token named by the query, matched in the normalized path.
    fn resolve_matter(&self, _query: &str) -> Option<&'static str> {
        None
    }

    /// Group token named by one lowercase path segment.
    fn group_token(&self, segment: &str) -> Option<&'static str>;

    /// Leaf token named by one lowercase path segment.
    fn leaf_token(&self, segment: &str) -> Option<&'static str>;

    /// Combine a group token and a leaf token into a node id. `None` when
    /// the pair does not name a node of the taxonomy.
    fn compose_node_id(&self, group: &str, leaf: &str) -> Option<String>;

    /// The folder a node id denotes. `None` for the root and unknown ids.
    fn decompose_node_id(&self, id: &str) -> Option<NodeFolder>;

    /// Path segment of the folder a node id denotes.
    fn expected_path_segment(&self, id: &str) -> Option<String> {
        self.decompose_node_id(id).map(|folder| folder.segment())
    }
}

/// Sort a keyword table so longer phrases are tried first. Ties keep their
/// table order.
pub(crate) fn longest_first<T: Copy>(
    table: &[(&'static str, T)],
) -> Vec<(&'static str, T)> {
    let mut sorted = table.to_vec();
    sorted.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_domain_names() {
        assert_eq!("fnb".parse::<Domain>().unwrap(), Domain::Fnb);
        assert_eq!(" Legal ".parse::<Domain>().unwrap(), Domain::Legal);
        assert!("retail".parse::<Domain>().is_err());
    }

    #[test]
    fn domain_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Domain::Legal).unwrap(), "\"legal\"");
    }

    #[test]
    fn every_domain_builds() {
        for domain in [Domain::Fnb, Domain::Legal] {
            let config = domain.config().unwrap();
            assert_eq!(config.domain(), domain);
        }
    }

    #[test]
    fn longest_first_is_stable() {
        let sorted = longest_first(&[("tax", 1), ("expense", 2), ("fee", 3)]);
        assert_eq!(sorted, vec![("expense", 2), ("tax", 1), ("fee", 3)]);
    }

    #[test]
    fn node_folder_segment() {
        let leaf = NodeFolder {
            group: "West_Group",
            leaf: Some("Accounting"),
        };
        assert_eq!(leaf.segment(), "West_Group/Accounting");
        let group = NodeFolder {
            group: "West_Group",
            leaf: None,
        };
        assert_eq!(group.segment(), "West_Group");
    }
}
