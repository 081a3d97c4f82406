//! Restaurant franchise board: three regional groups, each holding the same
//! four back-office folders.
//!
//! Node ids are composed as `{region}_{category}` for folders and
//! `{region}_group` for groups; the folder of `west_accounting` is
//! `West_Group/Accounting`.

use super::{Domain, DomainConfig, NodeFolder, longest_first};
use crate::{
    error::{Error, Result},
    taxonomy::{NodeKind, Taxonomy, TaxonomyNode, normalize_segment},
};

pub const ROOT_ID: &str = "restaurant_franchise";

#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub token: &'static str,
    pub folder: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub token: &'static str,
    pub folder: &'static str,
    /// Spellings recognised in folder names.
    pub folder_aliases: &'static [&'static str],
}

pub const REGIONS: &[Region] = &[
    Region {
        token: "west",
        folder: "West_Group",
    },
    Region {
        token: "central",
        folder: "Central_Group",
    },
    Region {
        token: "east",
        folder: "East_Group",
    },
];

pub const CATEGORIES: &[Category] = &[
    Category {
        token: "accounting",
        folder: "Accounting",
        folder_aliases: &["accounting"],
    },
    Category {
        token: "expenses",
        folder: "Expenses",
        folder_aliases: &["expenses", "expense"],
    },
    Category {
        token: "legal",
        folder: "Legal",
        folder_aliases: &["legal"],
    },
    Category {
        token: "permits",
        folder: "Permits",
        folder_aliases: &["permits", "permit"],
    },
];

/// Query keyword -> canonical category.
pub const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("accounting", "accounting"),
    ("expense", "expenses"),
    ("expenses", "expenses"),
    ("legal", "legal"),
    ("permit", "permits"),
    ("permits", "permits"),
    ("financial", "accounting"),
    ("finance", "accounting"),
    ("payroll", "accounting"),
    ("tax", "accounting"),
];

#[derive(Debug, Clone)]
pub struct FnbDomain {
    taxonomy: Taxonomy,
    regions: &'static [Region],
    categories: &'static [Category],
    keywords: Vec<(&'static str, &'static str)>,
}

impl FnbDomain {
    pub fn new() -> Result<Self> {
        Self::from_tables(REGIONS, CATEGORIES, CATEGORY_KEYWORDS)
    }

    pub(crate) fn from_tables(
        regions: &'static [Region],
        categories: &'static [Category],
        keywords: &[(&'static str, &'static str)],
    ) -> Result<Self> {
        for region in regions {
            let marker = format!("{}group", region.token);
            if !normalize_segment(region.folder).contains(&marker) {
                return Err(malformed(format!(
                    "region folder '{}' does not name group '{}'",
                    region.folder, region.token
                )));
            }
        }
        for category in categories {
            if category.folder_aliases.is_empty() {
                return Err(malformed(format!(
                    "category '{}' has no folder aliases",
                    category.token
                )));
            }
        }
        for (keyword, target) in keywords {
            if !categories.iter().any(|c| c.token == *target) {
                return Err(malformed(format!(
                    "keyword '{keyword}' maps to unknown category '{target}'"
                )));
            }
        }

        let taxonomy =
            Taxonomy::from_nodes("fnb", build_nodes(regions, categories))?;

        Ok(Self {
            taxonomy,
            regions,
            categories,
            keywords: longest_first(keywords),
        })
    }

    fn region(&self, token: &str) -> Option<&'static Region> {
        self.regions.iter().find(|r| r.token == token)
    }

    fn category(&self, token: &str) -> Option<&'static Category> {
        self.categories.iter().find(|c| c.token == token)
    }
}

fn malformed(reason: String) -> Error {
    Error::DomainConfig {
        domain: "fnb",
        reason,
    }
}

fn build_nodes(
    regions: &[Region],
    categories: &[Category],
) -> Vec<TaxonomyNode> {
    let mut nodes = vec![TaxonomyNode::new(
        ROOT_ID,
        "Restaurant Franchise",
        None,
        NodeKind::Root,
    )];
    for region in regions {
        let group_id = format!("{}_group", region.token);
        nodes.push(TaxonomyNode::new(
            group_id.clone(),
            region.folder,
            Some(ROOT_ID),
            NodeKind::Group,
        ));
        for category in categories {
            nodes.push(TaxonomyNode::new(
                format!("{}_{}", region.token, category.token),
                category.folder,
                Some(group_id.as_str()),
                NodeKind::Folder,
            ));
        }
    }
    nodes
}

impl DomainConfig for FnbDomain {
    fn domain(&self) -> Domain {
        Domain::Fnb
    }

    fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    fn resolve_location(&self, words: &[&str]) -> Option<&'static str> {
        words.iter().find_map(|word| {
            self.regions
                .iter()
                .find(|r| word.contains(r.token))
                .map(|r| r.token)
        })
    }

    fn resolve_category(&self, words: &[&str]) -> Option<&'static str> {
        words.iter().find_map(|word| {
            self.keywords
                .iter()
                .find(|(keyword, _)| word.contains(keyword))
                .map(|(_, category)| *category)
        })
    }

    fn category_in_name(&self, category: &str, name: &str) -> bool {
        self.keywords.iter().any(|(keyword, target)| {
            *target == category && name.contains(keyword)
        })
    }

    fn group_token(&self, segment: &str) -> Option<&'static str> {
        let normalized = normalize_segment(segment);
        self.regions
            .iter()
            .find(|r| {
                normalized.contains(&format!("{}group", r.token))
                    || segment == r.token
            })
            .map(|r| r.token)
    }

    fn leaf_token(&self, segment: &str) -> Option<&'static str> {
        let normalized = normalize_segment(segment);
        self.categories
            .iter()
            .find(|c| c.folder_aliases.iter().any(|a| normalized.contains(a)))
            .map(|c| c.token)
    }

    fn compose_node_id(&self, group: &str, leaf: &str) -> Option<String> {
        let id = format!("{group}_{leaf}");
        self.taxonomy.contains(&id).then_some(id)
    }

    fn decompose_node_id(&self, id: &str) -> Option<NodeFolder> {
        let (region, rest) = id.split_once('_')?;
        let region = self.region(region)?;
        if rest == "group" {
            return Some(NodeFolder {
                group: region.folder,
                leaf: None,
            });
        }
        let category = self.category(rest)?;
        Some(NodeFolder {
            group: region.folder,
            leaf: Some(category.folder),
        })
    }
}
