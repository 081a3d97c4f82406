use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::{
    context::{ContextSelection, SelectedNode},
    error::Result,
};

const SETTINGS: TableDefinition<&str, &str> = TableDefinition::new("settings");
const CONTEXT_SELECTION: TableDefinition<&str, &str> =
    TableDefinition::new("context_selection");

/// Stored form of one selected node. The position keeps insertion order,
/// which redb's key order would otherwise lose.
#[derive(Debug, Serialize, Deserialize)]
struct StoredNode {
    position: u64,
    label: String,
    files: Vec<String>,
}

pub struct ConfigDb {
    db: Database,
}

impl ConfigDb {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(redb::Error::from)?;

        // Ensure all tables exist by opening them in a write transaction.
        let txn = db.begin_write()?;
        txn.open_table(SETTINGS)?;
        txn.open_table(CONTEXT_SELECTION)?;
        txn.commit()?;

        Ok(Self { db })
    }

    // -- Settings --

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(SETTINGS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SETTINGS)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    // -- Context selection --

    /// Load the stored selection in insertion order.
    pub fn load_selection(&self) -> Result<ContextSelection> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(CONTEXT_SELECTION)?;
        let mut entries = Vec::new();
        for entry in table.iter()? {
            let (k, v) = entry?;
            let stored: StoredNode = serde_json::from_str(v.value())?;
            entries.push((
                stored.position,
                SelectedNode {
                    id: k.value().to_string(),
                    label: stored.label,
                    files: stored.files,
                },
            ));
        }
        entries.sort_by_key(|(position, _)| *position);
        Ok(ContextSelection::from_nodes(
            entries.into_iter().map(|(_, node)| node),
        ))
    }

    /// Replace the stored selection with `selection` in one transaction.
    pub fn store_selection(&self, selection: &ContextSelection) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(CONTEXT_SELECTION)?;
            let stale = table
                .iter()?
                .map(|entry| entry.map(|(k, _)| k.value().to_string()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for id in &stale {
                table.remove(id.as_str())?;
            }
            for (position, node) in selection.nodes().iter().enumerate() {
                let stored = serde_json::to_string(&StoredNode {
                    position: position as u64,
                    label: node.label.clone(),
                    files: node.files.clone(),
                })?;
                table.insert(node.id.as_str(), stored.as_str())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    pub fn clear_selection(&self) -> Result<()> {
        self.store_selection(&ContextSelection::new())
    }
}

impl std::fmt::Debug for ConfigDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDb").finish_non_exhaustive()
    }
}
