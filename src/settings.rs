use std::path::PathBuf;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;

use crate::{
    config_db::ConfigDb,
    context::ContextSelection,
    domain::Domain,
    error::{Error, Result},
    ingestion::IndexOptions,
    search::ScoringWeights,
};

/// Keys accepted by `config set`, in display order.
pub const KEYS: &[&str] = &[
    "domain",
    "corpus_root",
    "result_limit",
    "highlight_threshold",
    "exclude",
    "weights",
];

/// User settings persisted in the `settings` table.
///
/// Every key is stored as a string and parsed on load; keys that were never
/// set keep their default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub domain: Domain,
    pub corpus_root: PathBuf,
    pub result_limit: usize,
    /// Only results scoring strictly above this are highlighted.
    pub highlight_threshold: f32,
    /// Glob patterns of files left out of the index.
    pub exclude: Vec<String>,
    pub weights: ScoringWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            domain: Domain::default(),
            corpus_root: PathBuf::from("sample_data"),
            result_limit: 5,
            highlight_threshold: 25.0,
            exclude: Vec::new(),
            weights: ScoringWeights::default(),
        }
    }
}

impl Settings {
    pub fn load(db: &ConfigDb) -> Result<Self> {
        let mut settings = Self::default();
        for key in KEYS {
            if let Some(value) = db.get_setting(key)? {
                settings.apply(key, &value)?;
            }
        }
        Ok(settings)
    }

    /// Validate and persist one key.
    ///
    /// Switching to a different domain clears the stored context selection,
    /// since its node ids belong to the old taxonomy. Returns the updated
    /// settings.
    pub fn set(db: &ConfigDb, key: &str, value: &str) -> Result<Self> {
        let mut settings = Self::load(db)?;
        let previous_domain = settings.domain;
        settings.apply(key, value)?;

        let stored = settings.value_of(key).ok_or_else(|| unknown_key(key))?;
        db.set_setting(key, &stored)?;

        if settings.domain != previous_domain {
            db.clear_selection()?;
        }
        Ok(settings)
    }

    /// Parse `value` into the field named by `key`.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| {
            Error::Config(format!("invalid value for '{key}': {reason}"))
        };

        match key {
            "domain" => self.domain = value.parse()?,
            "corpus_root" => {
                if value.trim().is_empty() {
                    return Err(invalid("path is empty".into()));
                }
                self.corpus_root = PathBuf::from(value.trim());
            }
            "result_limit" => {
                let limit: usize =
                    value.trim().parse().map_err(|e| invalid(format!("{e}")))?;
                if limit == 0 {
                    return Err(invalid("must be at least 1".into()));
                }
                self.result_limit = limit;
            }
            "highlight_threshold" => {
                let threshold: f32 =
                    value.trim().parse().map_err(|e| invalid(format!("{e}")))?;
                if !threshold.is_finite() {
                    return Err(invalid("must be a finite number".into()));
                }
                self.highlight_threshold = threshold;
            }
            "exclude" => {
                let patterns: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
                build_globset(&patterns)?;
                self.exclude = patterns;
            }
            "weights" => {
                self.weights = serde_json::from_str(value)
                    .map_err(|e| invalid(e.to_string()))?;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// The stored string form of `key`.
    pub fn value_of(&self, key: &str) -> Option<String> {
        let value = match key {
            "domain" => self.domain.to_string(),
            "corpus_root" => self.corpus_root.display().to_string(),
            "result_limit" => self.result_limit.to_string(),
            "highlight_threshold" => self.highlight_threshold.to_string(),
            "exclude" => self.exclude.join(","),
            "weights" => serde_json::to_string(&self.weights).ok()?,
            _ => return None,
        };
        Some(value)
    }

    pub fn index_options(&self) -> Result<IndexOptions> {
        let exclude = if self.exclude.is_empty() {
            None
        } else {
            Some(build_globset(&self.exclude)?)
        };
        Ok(IndexOptions { exclude })
    }
}

/// The stored context selection, or an empty one when `domain` differs
/// from the stored domain the selection was made in.
pub fn selection_for(
    db: &ConfigDb,
    domain: Domain,
) -> Result<ContextSelection> {
    if Settings::load(db)?.domain != domain {
        return Ok(ContextSelection::new());
    }
    db.load_selection()
}

/// Persist `selection` for `domain`. A run that overrides the stored domain
/// may not replace the selection of the stored one.
pub fn store_selection_for(
    db: &ConfigDb,
    domain: Domain,
    selection: &ContextSelection,
) -> Result<()> {
    let stored = Settings::load(db)?.domain;
    if stored != domain {
        return Err(Error::Config(format!(
            "the stored selection belongs to domain '{stored}'; \
             run `boardrag config set domain {domain}` before changing it"
        )));
    }
    db.store_selection(selection)
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown setting '{key}' (expected one of: {})",
        KEYS.join(", ")
    ))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            Error::Config(format!("invalid exclude pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("invalid exclude patterns: {e}")))
}
