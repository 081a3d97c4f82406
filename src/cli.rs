use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::domain::Domain;

#[derive(Debug, Parser)]
#[command(
    name = "boardrag",
    about = "Retrieve documents from a folder-shaped business board"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Domain configuration for this run (overrides the stored setting)
    #[arg(long, global = true, value_enum)]
    pub domain: Option<Domain>,

    /// Corpus root for this run (overrides the stored setting)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the corpus root and summarise what can be searched
    Index(IndexArgs),
    /// Rank documents against a free-text query
    Search(SearchArgs),
    /// Manage the selected board nodes
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },
    /// Map document paths to the board nodes they belong to
    Highlight(HighlightArgs),
    /// Print the board hierarchy of the active domain
    Taxonomy(TaxonomyArgs),
    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Start MCP server for AI agent integration
    Mcp,
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Index --

#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Number of results to return (defaults to the result_limit setting)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Only consider documents whose path contains this substring
    #[arg(long)]
    pub industry: Option<String>,

    /// Ignore the stored context selection
    #[arg(long)]
    pub no_context: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Output only file paths (one per line)
    #[arg(long, conflicts_with = "json")]
    pub files: bool,
}

// -- Context subcommands --

#[derive(Debug, Subcommand)]
pub enum ContextAction {
    /// Select one or more nodes, listing their folders' files
    Add {
        /// Node ids (see `boardrag taxonomy`)
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Deselect nodes
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List the selected nodes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deselect every node
    Clear,
    /// Return the documents of the selected nodes
    Resolve {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Output only file paths (one per line)
        #[arg(long, conflicts_with = "json")]
        files: bool,
    },
}

// -- Highlight --

#[derive(Debug, Parser)]
pub struct HighlightArgs {
    /// Document paths
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Taxonomy --

#[derive(Debug, Parser)]
pub struct TaxonomyArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Config --

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and store one setting
    Set {
        /// One of: domain, corpus_root, result_limit, highlight_threshold,
        /// exclude, weights
        key: String,
        value: String,
    },
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "boardrag",
            &mut std::io::stdout(),
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parse_search_defaults() {
        let cli = Cli::parse_from(["boardrag", "search", "east expenses"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "east expenses");
                assert_eq!(args.count, None);
                assert_eq!(args.industry, None);
                assert!(!args.no_context);
                assert!(!args.json);
                assert!(!args.files);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "boardrag",
            "search",
            "megacorp",
            "--domain",
            "legal",
            "--root",
            "/srv/firm",
            "-n",
            "3",
        ]);
        assert_eq!(cli.domain, Some(Domain::Legal));
        assert_eq!(cli.root, Some(PathBuf::from("/srv/firm")));
        match cli.command {
            Command::Search(args) => assert_eq!(args.count, Some(3)),
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn context_add_requires_ids() {
        assert!(Cli::try_parse_from(["boardrag", "context", "add"]).is_err());
        let cli = Cli::parse_from([
            "boardrag",
            "context",
            "add",
            "west_accounting",
            "east_legal",
        ]);
        match cli.command {
            Command::Context {
                action: ContextAction::Add { ids },
            } => assert_eq!(ids, vec!["west_accounting", "east_legal"]),
            _ => panic!("expected context add"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
