//! boardrag - document retrieval for folder-shaped business boards.
//!
//! boardrag scans a corpus root laid out as a fixed taxonomy of folders
//! (regions and back-office categories for a restaurant franchise, practice
//! areas and matters for a law firm), extracts text from every file, and
//! ranks documents against free-text queries with a keyword and folder-path
//! scorer. Results come with the taxonomy nodes a board UI should
//! highlight, and an explicit selection of nodes can stand in for a query.
//!
//! # Quick start
//!
//! ```no_run
//! use boardrag::{ConfigDb, DataDir, Engine, Settings};
//! use boardrag::engine::QueryOptions;
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let config_db = ConfigDb::open(&data_dir.config_db()).unwrap();
//! let settings = Settings::load(&config_db).unwrap();
//!
//! let engine = Engine::from_settings(&settings).unwrap();
//! let retrieval =
//!     engine.search("east expenses q3", &QueryOptions::default());
//! for doc in &retrieval.documents {
//!     println!("{} (score: {:.1})", doc.record.path, doc.score);
//! }
//! println!("highlight: {:?}", retrieval.highlights);
//! ```

pub mod cli;
pub mod config_db;
pub mod context;
pub mod data_dir;
pub mod domain;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ingestion;
pub mod mcp;
pub mod record;
pub mod report;
pub mod search;
pub mod settings;
pub mod taxonomy;
pub mod text_util;
pub mod walker;

pub use config_db::ConfigDb;
pub use context::ContextSelection;
pub use data_dir::DataDir;
pub use domain::{Domain, DomainConfig};
pub use engine::{Engine, Retrieval};
pub use error::{Error, Result};
pub use ingestion::Corpus;
pub use record::{DocumentRecord, ScoredRecord};
pub use settings::Settings;
