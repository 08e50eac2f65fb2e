//! The working store: a single in-memory SQLite database per session.
//!
//! Every component receives the [`Store`] explicitly. There is no global
//! connection; a session constructs one handle at startup and threads it
//! through ingestion, exploration and lineage queries.
//!
//! # Generations
//!
//! The store counts committed writes. Anything derived from the store (a
//! lineage graph, a cached question list) can record the generation it was
//! computed at and compare it with [`Store::generation`] later to detect
//! that it is stale.

mod query;

pub use query::QueryResult;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Errors raised by store inspection and queries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Column metadata as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type; empty when the DDL declares none.
    pub storage_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub is_primary_key: bool,
}

/// A table in the working store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub table_name: String,
    pub create_statement: String,
    pub columns: Vec<ColumnInfo>,
}

/// Handle to the working store.
pub struct Store {
    conn: Connection,
    generation: u64,
}

impl Store {
    /// Open a fresh, empty in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            generation: 0,
        })
    }

    /// Number of committed writes since the store was opened.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// Read access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Names of all user tables, in creation order.
    pub fn table_names(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
             ORDER BY rowid",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Whether a table (or view) named `name` exists.
    pub fn has_table(&self, name: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Tables with their DDL and column metadata.
    pub fn current_schema(&self) -> StoreResult<Vec<TableInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, sql FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
             ORDER BY rowid",
        )?;
        let tables = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        tables
            .into_iter()
            .map(|(table_name, sql)| {
                let columns = self.table_columns(&table_name)?;
                Ok(TableInfo {
                    table_name,
                    create_statement: sql.unwrap_or_default(),
                    columns,
                })
            })
            .collect()
    }

    /// Column metadata for one table.
    pub fn table_columns(&self, table: &str) -> StoreResult<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?)",
        )?;
        let columns = stmt
            .query_map(params![table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    storage_type: row.get(1)?,
                    not_null: row.get::<_, i64>(2)? != 0,
                    default: row.get(3)?,
                    is_primary_key: row.get::<_, i64>(4)? > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> StoreResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Run a single SQL statement and collect its result set.
    ///
    /// Statements that write bump the store generation.
    pub fn query(&mut self, sql: &str) -> StoreResult<QueryResult> {
        let (result, writes) = {
            let mut stmt = self.conn.prepare(sql)?;
            let writes = !stmt.readonly();
            (QueryResult::collect(&mut stmt)?, writes)
        };
        if writes {
            self.bump_generation();
        }
        Ok(result)
    }

    /// SHA-256 over the serialized schema, as lowercase hex.
    ///
    /// Identical schemas hash identically; any table or column change
    /// produces a different fingerprint.
    pub fn schema_fingerprint(&self) -> StoreResult<String> {
        let json = serde_json::to_string(&self.current_schema()?)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}
