use boardrag::{
    cli::{Cli, Command, ConfigAction, ContextAction},
    config_db::ConfigDb,
    context,
    data_dir::DataDir,
    engine::{Engine, QueryOptions, Retrieval},
    error::{self, Error},
    ingestion::Corpus,
    mcp,
    report,
    settings::{self, Settings},
    taxonomy,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("BOARDRAG_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let config_db = ConfigDb::open(&data_dir.config_db())?;

    let mut settings = Settings::load(&config_db)?;
    let stored_domain = settings.domain;
    if let Some(domain) = cli.domain {
        settings.domain = domain;
    }
    if let Some(root) = cli.root {
        settings.corpus_root = root;
    }
    // Validate the domain tables before doing anything else.
    let domain = settings.domain.config()?;

    match cli.command {
        Command::Index(args) => {
            let corpus =
                Corpus::scan(&settings.corpus_root, &settings.index_options()?);
            cmd_index(&corpus, args.json)?;
        }
        Command::Search(args) => {
            let engine = Engine::from_settings(&settings)?;
            let selection = if args.no_context {
                None
            } else {
                Some(settings::selection_for(&config_db, settings.domain)?)
            };
            let options = QueryOptions {
                limit: args.count,
                industry_filter: args.industry.as_deref(),
                context: selection.as_ref().filter(|s| !s.is_empty()),
            };
            let retrieval = engine.search(&args.query, &options);
            print_retrieval(
                Some(&args.query),
                &retrieval,
                args.json,
                args.files,
            )?;
        }
        Command::Context { action } => match action {
            ContextAction::Add { ids } => {
                let mut selection =
                    settings::selection_for(&config_db, settings.domain)?;
                let mut added = Vec::new();
                for id in &ids {
                    let node = context::select_node(
                        &settings.corpus_root,
                        domain.as_ref(),
                        id,
                    )?;
                    let count = node.files.len();
                    added.push((id, count, selection.add(node)));
                }
                settings::store_selection_for(
                    &config_db,
                    settings.domain,
                    &selection,
                )?;
                for (id, count, new) in added {
                    if new {
                        println!("Selected '{id}' ({count} file(s))");
                    } else {
                        println!("'{id}' is already selected");
                    }
                }
            }
            ContextAction::Remove { ids } => {
                let mut selection =
                    settings::selection_for(&config_db, settings.domain)?;
                for id in &ids {
                    if !selection.remove(id) {
                        return Err(Error::NotFound {
                            kind: "selected node",
                            name: id.clone(),
                        });
                    }
                }
                settings::store_selection_for(
                    &config_db,
                    settings.domain,
                    &selection,
                )?;
                for id in &ids {
                    println!("Deselected '{id}'");
                }
            }
            ContextAction::List { json } => {
                let selection =
                    settings::selection_for(&config_db, settings.domain)?;
                if json {
                    println!("{}", serde_json::to_string(selection.nodes())?);
                } else if selection.is_empty() {
                    println!("No nodes selected.");
                } else {
                    for node in selection.nodes() {
                        println!(
                            "{}\t{}\t{} file(s)",
                            node.id,
                            node.label,
                            node.files.len()
                        );
                    }
                }
            }
            ContextAction::Clear => {
                settings::store_selection_for(
                    &config_db,
                    settings.domain,
                    &context::ContextSelection::new(),
                )?;
                println!("Cleared the context selection");
            }
            ContextAction::Resolve { json, files } => {
                let selection =
                    settings::selection_for(&config_db, settings.domain)?;
                let engine = Engine::from_settings(&settings)?;
                let retrieval = engine.resolve_context(&selection);
                print_retrieval(None, &retrieval, json, files)?;
            }
        },
        Command::Highlight(args) => {
            let ids =
                taxonomy::node_ids_from_paths(&args.paths, domain.as_ref());
            if args.json {
                println!("{}", serde_json::to_string(&ids)?);
            } else {
                for id in &ids {
                    println!("{id}");
                }
            }
        }
        Command::Taxonomy(args) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string(domain.taxonomy().nodes())?
                );
            } else {
                print!("{}", report::format_taxonomy(domain.taxonomy()));
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Show { json } => {
                if json {
                    println!("{}", serde_json::to_string(&settings)?);
                } else {
                    println!("data_dir\t{}", data_dir.root().display());
                    for key in settings::KEYS {
                        let value = settings.value_of(key).unwrap_or_default();
                        println!("{key}\t{value}");
                    }
                }
            }
            ConfigAction::Set { key, value } => {
                let updated = Settings::set(&config_db, &key, &value)?;
                let shown = updated.value_of(&key).unwrap_or_default();
                println!("Set {key} = {shown}");
                if key == "domain" && updated.domain != stored_domain {
                    println!("Cleared the context selection");
                }
            }
        },
        Command::Mcp => {
            let engine = Engine::from_settings(&settings)?;
            mcp::run_mcp(engine, config_db, settings.corpus_root)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_index(corpus: &Corpus, json: bool) -> error::Result<()> {
    let summary = corpus.summary();
    if json {
        let value = serde_json::json!({
            "root": corpus.root().display().to_string(),
            "files": summary.files,
            "extracted": summary.extracted,
            "fallbacks": summary.fallbacks,
        });
        println!("{value}");
    } else {
        println!("Root: {}", corpus.root().display());
        println!("{summary}");
    }
    Ok(())
}

fn print_retrieval(
    query: Option<&str>,
    retrieval: &Retrieval,
    json: bool,
    files: bool,
) -> error::Result<()> {
    if json {
        println!("{}", report::format_json(query, retrieval)?);
    } else if files {
        print!("{}", report::format_files(retrieval));
    } else {
        print!("{}", report::format_human(query, retrieval));
    }
    Ok(())
}
