//! Local SQLite datastore: connection and schema management

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::debug;

use super::tables::{table_spec, TABLES};
use crate::error::Result;

/// SQLite-backed [`Store`](super::Store) used when no hosted datastore is configured.
pub struct ImportDatabase {
    pub(crate) conn: Connection,
    pub(crate) path: Option<PathBuf>,
    /// Known columns per table, filled lazily from `PRAGMA table_info`.
    pub(crate) columns: HashMap<String, HashSet<String>>,
}

impl ImportDatabase {
    /// Open (or create) the database file and ensure the known tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let mut db = Self {
            conn,
            path: Some(path.to_path_buf()),
            columns: HashMap::new(),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self {
            conn,
            path: None,
            columns: HashMap::new(),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        for table in TABLES {
            self.conn.execute(table.ddl, [])?;
        }

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_season
             ON team_conference_history(season)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_rosters_team_season
             ON player_team_rosters(team_id, season)",
            [],
        )?;

        Ok(())
    }

    /// Make sure `table` is registered and has every column in `wanted`,
    /// adding missing ones as untyped columns.
    pub(crate) fn ensure_columns<'a>(
        &mut self,
        table: &str,
        wanted: impl IntoIterator<Item = &'a String>,
    ) -> Result<()> {
        table_spec(table)?;

        if !self.columns.contains_key(table) {
            let existing = self.load_columns(table)?;
            self.columns.insert(table.to_string(), existing);
        }

        let missing: Vec<String> = {
            let known = &self.columns[table];
            wanted
                .into_iter()
                .filter(|c| !known.contains(c.as_str()))
                .cloned()
                .collect()
        };

        for column in missing {
            debug!(table, %column, "adding column");
            self.conn.execute(
                &format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    quote_ident(table),
                    quote_ident(&column)
                ),
                [],
            )?;
            if let Some(known) = self.columns.get_mut(table) {
                known.insert(column);
            }
        }

        Ok(())
    }

    fn load_columns(&self, table: &str) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(names)
    }
}

/// Double-quote an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
