use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    config_db::ConfigDb,
    context::{self, ContextSelection},
    engine::{Engine, QueryOptions, Retrieval},
    error,
    report::JsonReport,
    settings::{self, Settings},
    taxonomy,
};

struct BoardState {
    engine: Engine,
    config_db: ConfigDb,
    corpus_root: PathBuf,
    selection: Mutex<ContextSelection>,
    /// False when the server runs with a domain other than the stored one;
    /// the selection then lives only for this session.
    persist: bool,
}

#[derive(Clone)]
pub struct BoardMcpServer {
    state: Arc<BoardState>,
    tool_router: ToolRouter<Self>,
}

impl BoardMcpServer {
    fn new(state: BoardState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }

    fn selection(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, ContextSelection>, rmcp::ErrorData>
    {
        self.state.selection.lock().map_err(|_| {
            rmcp::ErrorData::internal_error("selection lock poisoned", None)
        })
    }
}

#[tool_router(router = tool_router)]
impl BoardMcpServer {
    /// Rank the corpus against a free-text query.
    #[tool(
        name = "board_search",
        description = "Search the board's documents by free text. Location, category, practice area and matter names in the query boost documents in the matching folders. Returns ranked documents and the board node ids to highlight."
    )]
    pub async fn board_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let use_context = params.use_context.unwrap_or(true);

        let selection = self.selection()?.clone();
        let options = QueryOptions {
            limit: params.limit,
            industry_filter: params.industry.as_deref(),
            context: (use_context && !selection.is_empty())
                .then_some(&selection),
        };
        let retrieval = self.state.engine.search(&params.query, &options);

        let summary = format_summary(&retrieval, Some(&params.query));
        tool_result(summary, &JsonReport::new(Some(&params.query), &retrieval))
    }

    /// Change the node selection and return the selected documents.
    #[tool(
        name = "board_context",
        description = "Select or deselect board nodes by id, then return every document in the selected folders (score 100) and the node ids to highlight. Call with no arguments to read the current selection."
    )]
    pub async fn board_context(
        &self,
        params: Parameters<ContextParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let domain = self.state.engine.domain();

        // Edits go to a copy that replaces the shared selection only once it
        // is validated and stored.
        let selection = {
            let mut current = self.selection()?;
            let mut updated = current.clone();
            let mut changed = false;
            if params.clear.unwrap_or(false) && !updated.is_empty() {
                updated.clear();
                changed = true;
            }
            for id in params.remove.unwrap_or_default() {
                changed |= updated.remove(&id);
            }
            for id in params.add.unwrap_or_default() {
                let node =
                    context::select_node(&self.state.corpus_root, domain, &id)
                        .map_err(|e| invalid_params("cannot select node", e))?;
                changed |= updated.add(node);
            }
            if changed {
                if self.state.persist {
                    self.state
                        .config_db
                        .store_selection(&updated)
                        .map_err(|e| {
                            mcp_error("failed to store selection", e)
                        })?;
                }
                *current = updated;
            }
            current.clone()
        };

        let retrieval = self.state.engine.resolve_context(&selection);
        let mut summary = if selection.is_empty() {
            "No nodes selected.".to_string()
        } else {
            format!("Selected: {}", selection.ids().join(", "))
        };
        summary.push('\n');
        summary.push_str(&format_summary(&retrieval, None));

        let structured = ContextResponse {
            selected: selection.ids(),
            report: JsonReport::new(None, &retrieval),
        };
        tool_result(summary, &structured)
    }

    /// Map document paths to board node ids.
    #[tool(
        name = "board_highlight",
        description = "Map document paths to the ids of the board nodes (folders or matters) that contain them. Paths outside the board are ignored."
    )]
    pub async fn board_highlight(
        &self,
        params: Parameters<HighlightParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let ids = taxonomy::node_ids_from_paths(
            &params.0.paths,
            self.state.engine.domain(),
        );
        let summary = if ids.is_empty() {
            "No board nodes matched.".to_string()
        } else {
            ids.join("\n")
        };
        tool_result(summary, &json!({ "highlights": ids }))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for BoardMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("boardrag", env!("CARGO_PKG_VERSION"))
                    .with_title("boardrag MCP"),
            )
            .with_instructions(
                "Use board_search for free-text questions about the board. Use board_context when the user names specific folders or matters.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Search query string.
    pub query: String,
    /// Maximum number of results (default: the result_limit setting).
    pub limit: Option<usize>,
    /// Only consider documents whose path contains this substring.
    pub industry: Option<String>,
    /// Restrict the query to the selected nodes' folders (default: true).
    pub use_context: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContextParams {
    /// Node ids to select.
    pub add: Option<Vec<String>>,
    /// Node ids to deselect.
    pub remove: Option<Vec<String>>,
    /// Deselect everything before applying `add`.
    pub clear: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HighlightParams {
    /// Document paths to map to node ids.
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ContextResponse<'a> {
    selected: Vec<&'a str>,
    #[serde(flatten)]
    report: JsonReport<'a>,
}

fn format_summary(retrieval: &Retrieval, query: Option<&str>) -> String {
    let docs = &retrieval.documents;
    if docs.is_empty() {
        return match query {
            Some(query) => format!("No results found for \"{query}\""),
            None => "No documents found.".to_string(),
        };
    }

    let mut lines = Vec::with_capacity(docs.len() + 2);
    let suffix = if docs.len() == 1 { "" } else { "s" };
    lines.push(match query {
        Some(query) => {
            format!("Found {} result{suffix} for \"{query}\":", docs.len())
        }
        None => format!("Found {} document{suffix}:", docs.len()),
    });
    for doc in docs {
        lines.push(format!(
            "{} {:.1} {}",
            doc.record.icon(),
            doc.score,
            doc.record.path
        ));
    }
    if !retrieval.highlights.is_empty() {
        lines.push(format!("Highlight: {}", retrieval.highlights.join(", ")));
    }

    lines.join("\n")
}

fn tool_result(
    summary: String,
    structured: &impl Serialize,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let structured = serde_json::to_value(structured)
        .map_err(|e| mcp_error("failed to serialize results", e))?;
    let mut result = CallToolResult::success(vec![Content::text(summary)]);
    result.structured_content = Some(structured);
    Ok(result)
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

fn invalid_params(
    message: &str,
    error: impl std::fmt::Display,
) -> rmcp::ErrorData {
    rmcp::ErrorData::invalid_params(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

/// Serve the engine over MCP on stdio until the client disconnects.
pub fn run_mcp(
    engine: Engine,
    config_db: ConfigDb,
    corpus_root: PathBuf,
) -> error::Result<()> {
    let domain = engine.domain().domain();
    let persist = Settings::load(&config_db)?.domain == domain;
    let selection = settings::selection_for(&config_db, domain)?;
    if !persist {
        warn!(
            %domain,
            "domain differs from the stored one, selections are not saved"
        );
    }
    info!(
        documents = engine.corpus().len(),
        selected = selection.len(),
        "starting MCP server"
    );

    let server = BoardMcpServer::new(BoardState {
        engine,
        config_db,
        corpus_root,
        selection: Mutex::new(selection),
        persist,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::Domain, ingestion::Corpus};

    fn server(tmp: &tempfile::TempDir) -> BoardMcpServer {
        server_with(tmp, true)
    }

    fn server_with(tmp: &tempfile::TempDir, persist: bool) -> BoardMcpServer {
        let root = tmp.path().join("sample_data");
        for (dir, file, text) in [
            ("East_Group/Expenses", "q3_summary.txt", "Q3 fryer oil spend"),
            ("West_Group/Accounting", "q1_report.txt", "Q1 ledger"),
            ("East_Group/Accounting", "q1_report.txt", "Q1 ledger east"),
        ] {
            let dir = root.join(dir);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(file), text).unwrap();
        }

        let corpus = Corpus::scan(&root, &Default::default());
        let engine = Engine::new(corpus, Domain::Fnb.config().unwrap());
        let config_db =
            ConfigDb::open(&tmp.path().join("config.redb")).unwrap();

        BoardMcpServer::new(BoardState {
            engine,
            config_db,
            corpus_root: root,
            selection: Mutex::new(ContextSelection::new()),
            persist,
        })
    }

    fn summary(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn search_tool_returns_structured_results() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let result = server
            .board_search(Parameters(SearchParams {
                query: "east expenses q3".to_string(),
                limit: Some(5),
                industry: None,
                use_context: None,
            }))
            .await
            .unwrap();

        let structured = result.structured_content.clone().expect("structured");
        let results = structured
            .get("results")
            .and_then(|v| v.as_array())
            .expect("results array");
        assert!(!results.is_empty());
        assert_eq!(
            results[0].get("name").and_then(|v| v.as_str()),
            Some("q3_summary.txt")
        );
        assert_eq!(structured["highlights"][0], "east_expenses");
        assert!(summary(&result).contains("for \"east expenses q3\""));
    }

    #[tokio::test]
    async fn context_tool_selects_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let result = server
            .board_context(Parameters(ContextParams {
                add: Some(vec!["west_accounting".to_string()]),
                ..Default::default()
            }))
            .await
            .unwrap();

        let structured = result.structured_content.clone().expect("structured");
        assert_eq!(structured["selected"][0], "west_accounting");
        let results = structured["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert!(
            results[0]["path"]
                .as_str()
                .unwrap()
                .contains("West_Group")
        );
        assert_eq!(results[0]["score"], 100.0);

        let stored = server.state.config_db.load_selection().unwrap();
        assert_eq!(stored.ids(), vec!["west_accounting"]);
    }

    #[tokio::test]
    async fn context_tool_rejects_unknown_nodes() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let err = server
            .board_context(Parameters(ContextParams {
                add: Some(vec!["north_accounting".to_string()]),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("cannot select node"));
    }

    #[tokio::test]
    async fn highlight_tool_maps_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let result = server
            .board_highlight(Parameters(HighlightParams {
                paths: vec![
                    "x/West_Group/Permits/a.pdf".to_string(),
                    "x/readme.txt".to_string(),
                ],
            }))
            .await
            .unwrap();
        assert_eq!(summary(&result), "west_permits");
    }

    #[tokio::test]
    async fn failed_context_edit_changes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        server
            .board_context(Parameters(ContextParams {
                add: Some(vec!["west_accounting".to_string()]),
                ..Default::default()
            }))
            .await
            .unwrap();

        let err = server
            .board_context(Parameters(ContextParams {
                clear: Some(true),
                add: Some(vec!["bogus".to_string()]),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("cannot select node"));

        assert_eq!(
            server.selection().unwrap().ids(),
            vec!["west_accounting"]
        );
        let stored = server.state.config_db.load_selection().unwrap();
        assert_eq!(stored.ids(), vec!["west_accounting"]);
    }

    #[tokio::test]
    async fn overridden_domain_keeps_selection_in_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server_with(&tmp, false);

        let result = server
            .board_context(Parameters(ContextParams {
                add: Some(vec!["east_accounting".to_string()]),
                ..Default::default()
            }))
            .await
            .unwrap();
        let structured = result.structured_content.clone().expect("structured");
        assert_eq!(structured["selected"][0], "east_accounting");
        assert!(server.state.config_db.load_selection().unwrap().is_empty());
    }
}
