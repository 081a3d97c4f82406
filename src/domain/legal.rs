//! Law firm board: practice areas at the top, one folder per matter below.
//!
//! Matter ids do not decompose regularly (`lit_smith_megacorp` lives in
//! `Litigation/Smith_v_MegaCorp`), so both directions go through the
//! lookup tables below.

use super::{Domain, DomainConfig, NodeFolder, longest_first};
use crate::{
    error::{Error, Result},
    taxonomy::{NodeKind, Taxonomy, TaxonomyNode, normalize_segment},
};

pub const ROOT_ID: &str = "law_firm";

#[derive(Debug, Clone, Copy)]
pub struct PracticeArea {
    pub id: &'static str,
    pub folder: &'static str,
    /// `folder` with word separators stripped and lowercased.
    pub token: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Matter {
    pub id: &'static str,
    pub practice: &'static str,
    pub folder: &'static str,
    pub token: &'static str,
    /// Phrases a query may use to name the matter.
    pub aliases: &'static [&'static str],
}

pub const PRACTICE_AREAS: &[PracticeArea] = &[
    PracticeArea {
        id: "litigation",
        folder: "Litigation",
        token: "litigation",
    },
    PracticeArea {
        id: "corporate",
        folder: "Corporate",
        token: "corporate",
    },
    PracticeArea {
        id: "real_estate",
        folder: "Real_Estate",
        token: "realestate",
    },
    PracticeArea {
        id: "employment",
        folder: "Employment",
        token: "employment",
    },
    PracticeArea {
        id: "intellectual_property",
        folder: "Intellectual_Property",
        token: "intellectualproperty",
    },
];

pub const MATTERS: &[Matter] = &[
    Matter {
        id: "lit_smith_megacorp",
        practice: "litigation",
        folder: "Smith_v_MegaCorp",
        token: "smithvmegacorp",
        aliases: &[
            "smith v. megacorp",
            "smith v megacorp",
            "smith vs megacorp",
            "megacorp",
        ],
    },
    Matter {
        id: "lit_jones_contract",
        practice: "litigation",
        folder: "Jones_Contract_Dispute",
        token: "jonescontractdispute",
        aliases: &["jones contract", "jones"],
    },
    Matter {
        id: "corp_acme_merger",
        practice: "corporate",
        folder: "Acme_Merger",
        token: "acmemerger",
        aliases: &["acme merger", "acme"],
    },
    Matter {
        id: "corp_series_b",
        practice: "corporate",
        folder: "Series_B_Financing",
        token: "seriesbfinancing",
        aliases: &["series b financing", "series b"],
    },
    Matter {
        id: "re_harbor_lease",
        practice: "real_estate",
        folder: "Harbor_Lease",
        token: "harborlease",
        aliases: &["harbor lease", "harbor"],
    },
    Matter {
        id: "re_downtown_acq",
        practice: "real_estate",
        folder: "Downtown_Acquisition",
        token: "downtownacquisition",
        aliases: &["downtown acquisition", "downtown"],
    },
    Matter {
        id: "emp_doe_termination",
        practice: "employment",
        folder: "Doe_Wrongful_Termination",
        token: "doewrongfultermination",
        aliases: &["doe wrongful termination", "doe termination"],
    },
    Matter {
        id: "emp_handbook_review",
        practice: "employment",
        folder: "Handbook_Review",
        token: "handbookreview",
        aliases: &["handbook review"],
    },
    Matter {
        id: "ip_widget_patent",
        practice: "intellectual_property",
        folder: "Widget_Patent",
        token: "widgetpatent",
        aliases: &["widget patent", "widget"],
    },
    Matter {
        id: "ip_brand_trademark",
        practice: "intellectual_property",
        folder: "Brand_Trademark",
        token: "brandtrademark",
        aliases: &["brand trademark"],
    },
];

/// Query keyword -> practice area id.
pub const PRACTICE_KEYWORDS: &[(&str, &str)] = &[
    ("intellectual property", "intellectual_property"),
    ("trademark", "intellectual_property"),
    ("patent", "intellectual_property"),
    ("copyright", "intellectual_property"),
    ("wrongful termination", "employment"),
    ("employment", "employment"),
    ("employee", "employment"),
    ("handbook", "employment"),
    ("real estate", "real_estate"),
    ("lease", "real_estate"),
    ("zoning", "real_estate"),
    ("property", "real_estate"),
    ("litigation", "litigation"),
    ("lawsuit", "litigation"),
    ("dispute", "litigation"),
    ("court", "litigation"),
    ("corporate", "corporate"),
    ("merger", "corporate"),
    ("shareholder", "corporate"),
    ("financing", "corporate"),
];

#[derive(Debug, Clone)]
pub struct LegalDomain {
    taxonomy: Taxonomy,
    practice_keywords: Vec<(&'static str, &'static PracticeArea)>,
    matter_aliases: Vec<(&'static str, &'static Matter)>,
}

impl LegalDomain {
    pub fn new() -> Result<Self> {
        validate_tables(PRACTICE_AREAS, MATTERS, PRACTICE_KEYWORDS)?;

        let mut practice_keywords = Vec::with_capacity(PRACTICE_KEYWORDS.len());
        for (keyword, practice) in PRACTICE_KEYWORDS {
            if let Some(area) = practice_area(practice) {
                practice_keywords.push((*keyword, area));
            }
        }
        let matter_aliases: Vec<_> = MATTERS
            .iter()
            .flat_map(|m| m.aliases.iter().map(move |alias| (*alias, m)))
            .collect();

        let taxonomy = Taxonomy::from_nodes(
            "legal",
            build_nodes(PRACTICE_AREAS, MATTERS),
        )?;

        Ok(Self {
            taxonomy,
            practice_keywords: longest_first(&practice_keywords),
            matter_aliases: longest_first(&matter_aliases),
        })
    }
}

fn practice_area(id: &str) -> Option<&'static PracticeArea> {
    PRACTICE_AREAS.iter().find(|p| p.id == id)
}

fn matter(id: &str) -> Option<&'static Matter> {
    MATTERS.iter().find(|m| m.id == id)
}

fn malformed(reason: String) -> Error {
    Error::DomainConfig {
        domain: "legal",
        reason,
    }
}

/// Check that the vocabulary tables agree with each other.
pub(crate) fn validate_tables(
    practices: &[PracticeArea],
    matters: &[Matter],
    keywords: &[(&str, &str)],
) -> Result<()> {
    for practice in practices {
        if normalize_segment(practice.folder) != practice.token {
            return Err(malformed(format!(
                "practice area '{}' token '{}' does not match folder '{}'",
                practice.id, practice.token, practice.folder
            )));
        }
    }
    for matter in matters {
        if normalize_segment(matter.folder) != matter.token {
            return Err(malformed(format!(
                "matter '{}' token '{}' does not match folder '{}'",
                matter.id, matter.token, matter.folder
            )));
        }
        if !practices.iter().any(|p| p.id == matter.practice) {
            return Err(malformed(format!(
                "matter '{}' belongs to unknown practice area '{}'",
                matter.id, matter.practice
            )));
        }
    }
    for (keyword, practice) in keywords {
        if !practices.iter().any(|p| p.id == *practice) {
            return Err(malformed(format!(
                "keyword '{keyword}' maps to unknown practice area '{practice}'"
            )));
        }
    }
    Ok(())
}

fn build_nodes(
    practices: &[PracticeArea],
    matters: &[Matter],
) -> Vec<TaxonomyNode> {
    let mut nodes =
        vec![TaxonomyNode::new(ROOT_ID, "Law Firm", None, NodeKind::Root)];
    for practice in practices {
        nodes.push(TaxonomyNode::new(
            practice.id,
            practice.folder.replace('_', " "),
            Some(ROOT_ID),
            NodeKind::PracticeArea,
        ));
        for matter in matters.iter().filter(|m| m.practice == practice.id) {
            nodes.push(TaxonomyNode::new(
                matter.id,
                matter.folder.replace('_', " "),
                Some(practice.id),
                NodeKind::Matter,
            ));
        }
    }
    nodes
}

impl DomainConfig for LegalDomain {
    fn domain(&self) -> Domain {
        Domain::Legal
    }

    fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    fn resolve_practice_area(&self, query: &str) -> Option<&'static str> {
        self.practice_keywords
            .iter()
            .find(|(keyword, _)| query.contains(keyword))
            .map(|(_, area)| area.token)
    }

    fn resolve_matter(&self, query: &str) -> Option<&'static str> {
        self.matter_aliases
            .iter()
            .find(|(alias, _)| query.contains(alias))
            .map(|(_, matter)| matter.token)
    }

    fn group_token(&self, segment: &str) -> Option<&'static str> {
        let normalized = normalize_segment(segment);
        PRACTICE_AREAS
            .iter()
            .find(|p| normalized.contains(p.token))
            .map(|p| p.id)
    }

    fn leaf_token(&self, segment: &str) -> Option<&'static str> {
        let normalized = normalize_segment(segment);
        MATTERS
            .iter()
            .find(|m| normalized.contains(m.token))
            .map(|m| m.id)
    }

    fn compose_node_id(&self, group: &str, leaf: &str) -> Option<String> {
        matter(leaf)
            .filter(|m| m.practice == group)
            .map(|m| m.id.to_string())
    }

    fn decompose_node_id(&self, id: &str) -> Option<NodeFolder> {
        if let Some(practice) = practice_area(id) {
            return Some(NodeFolder {
                group: practice.folder,
                leaf: None,
            });
        }
        let matter = matter(id)?;
        let practice = practice_area(matter.practice)?;
        Some(NodeFolder {
            group: practice.folder,
            leaf: Some(matter.folder),
        })
    }
}
