use serde::Serialize;
use tracing::debug;

use crate::{
    context::{self, ContextSelection},
    domain::DomainConfig,
    error::Result,
    ingestion::Corpus,
    record::ScoredRecord,
    search::{self, ScoringWeights, SearchParams},
    settings::Settings,
    taxonomy,
};

/// Documents answering a query or selection, plus the taxonomy nodes the
/// board should highlight for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieval {
    pub documents: Vec<ScoredRecord>,
    pub highlights: Vec<String>,
}

/// Options of one query.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions<'a> {
    /// Falls back to the engine's result limit when `None`.
    pub limit: Option<usize>,
    pub industry_filter: Option<&'a str>,
    /// Restrict the query to the folders of these selected nodes.
    pub context: Option<&'a ContextSelection>,
}

/// A corpus snapshot bound to one domain configuration.
///
/// The engine never mutates the corpus, so one instance can serve any
/// number of queries, concurrently if shared behind a reference.
#[derive(Debug)]
pub struct Engine {
    corpus: Corpus,
    domain: Box<dyn DomainConfig>,
    weights: ScoringWeights,
    result_limit: usize,
    highlight_threshold: f32,
}

impl Engine {
    pub fn new(corpus: Corpus, domain: Box<dyn DomainConfig>) -> Self {
        let defaults = Settings::default();
        Self {
            corpus,
            domain,
            weights: defaults.weights,
            result_limit: defaults.result_limit,
            highlight_threshold: defaults.highlight_threshold,
        }
    }

    /// Build the domain configuration named by `settings` and scan its
    /// corpus root.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let domain = settings.domain.config()?;
        let corpus =
            Corpus::scan(&settings.corpus_root, &settings.index_options()?);
        Ok(Self::new(corpus, domain)
            .with_weights(settings.weights)
            .with_result_limit(settings.result_limit)
            .with_highlight_threshold(settings.highlight_threshold))
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn with_highlight_threshold(mut self, threshold: f32) -> Self {
        self.highlight_threshold = threshold;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn domain(&self) -> &dyn DomainConfig {
        self.domain.as_ref()
    }

    /// Rank the corpus against a free-text query.
    pub fn search(
        &self,
        query: &str,
        options: &QueryOptions<'_>,
    ) -> Retrieval {
        let folders = options
            .context
            .map(|selection| selection.context_folders(self.domain()))
            .unwrap_or_default();
        let params = SearchParams {
            limit: options.limit.unwrap_or(self.result_limit),
            context_folders: &folders,
            industry_filter: options.industry_filter,
        };

        let documents = search::score(
            query,
            self.corpus.records(),
            &params,
            self.domain(),
            &self.weights,
        );
        let highlights = self.highlight_node_ids(&documents);
        debug!(
            results = documents.len(),
            highlights = highlights.len(),
            "search finished"
        );
        Retrieval {
            documents,
            highlights,
        }
    }

    /// Resolve an explicit selection. Every node's documents are returned
    /// with the selection score, and all of them are highlighted.
    pub fn resolve_context(&self, selection: &ContextSelection) -> Retrieval {
        let documents = context::resolve_selection(
            &selection.ids(),
            &selection.node_to_files(),
            self.corpus.records(),
            self.domain(),
        );
        let highlights = self.highlight_node_ids(&documents);
        Retrieval {
            documents,
            highlights,
        }
    }

    /// Node ids of the documents scoring above the highlight threshold.
    pub fn highlight_node_ids(
        &self,
        documents: &[ScoredRecord],
    ) -> Vec<String> {
        let paths: Vec<&str> = documents
            .iter()
            .filter(|d| d.score > self.highlight_threshold)
            .map(|d| d.record.path.as_str())
            .collect();
        taxonomy::node_ids_from_paths(&paths, self.domain())
    }
}
