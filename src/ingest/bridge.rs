//! Wholesale import of an external SQLite database.
//!
//! Unlike delimited loads, this path overwrites: every source table replaces
//! any same-named table in the working store, using the source's own DDL.

use std::io::Write;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};

use super::schema::insert_statement;
use super::{IngestError, IngestResult, TableLoad};
use crate::store::{quote_ident, Store};

/// A table enumerated from the source database.
#[derive(Debug, Clone)]
struct SourceTable {
    name: String,
    sql: String,
}

/// Rows read from one source table, with the column order of the result set.
struct SourceRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Import a database image held in memory.
pub fn import_database(store: &mut Store, bytes: &[u8]) -> IngestResult<Vec<TableLoad>> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    import_database_file(store, file.path())
}

/// Import the database at `path`. The source is opened read-only.
pub fn import_database_file<P: AsRef<Path>>(
    store: &mut Store,
    path: P,
) -> IngestResult<Vec<TableLoad>> {
    let source = Connection::open_with_flags(
        path.as_ref(),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(IngestError::MalformedSourceDatabase)?;

    // Read everything before touching the working store.
    let tables = list_tables(&source).map_err(IngestError::MalformedSourceDatabase)?;
    log::debug!("source database has {} tables", tables.len());

    let mut contents = Vec::with_capacity(tables.len());
    for table in tables {
        let rows = read_rows(&source, &table.name).map_err(IngestError::MalformedSourceDatabase)?;
        contents.push((table, rows));
    }

    contents
        .into_iter()
        .map(|(table, rows)| replace_table(store, &table, rows))
        .collect()
}

fn list_tables(source: &Connection) -> rusqlite::Result<Vec<SourceTable>> {
    let mut stmt = source.prepare(
        "SELECT name, sql FROM sqlite_master
         WHERE type = 'table' AND sql IS NOT NULL
           AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
         ORDER BY rowid",
    )?;
    let tables = stmt
        .query_map([], |row| {
            Ok(SourceTable {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tables)
}

fn read_rows(source: &Connection, table: &str) -> rusqlite::Result<SourceRows> {
    let mut stmt = source.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| (0..width).map(|i| row.get::<_, Value>(i)).collect())?
        .collect::<Result<Vec<Vec<Value>>, _>>()?;

    Ok(SourceRows { columns, rows })
}

/// Drop, recreate and fill one table in the working store.
fn replace_table(
    store: &mut Store,
    table: &SourceTable,
    data: SourceRows,
) -> IngestResult<TableLoad> {
    let failure = |source| IngestError::LoadTransactionFailure {
        table: table.name.clone(),
        source,
    };

    // Drop, DDL and rows commit together; a failed copy restores the old table.
    let tx = store.connection_mut().transaction().map_err(failure)?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(&table.name)))
        .map_err(failure)?;
    tx.execute_batch(&table.sql).map_err(failure)?;

    // Schema-only tables get their DDL and nothing else.
    if !data.rows.is_empty() {
        let sql = insert_statement(&table.name, data.columns.iter().map(String::as_str));
        let mut stmt = tx.prepare(&sql).map_err(failure)?;
        for row in &data.rows {
            stmt.execute(params_from_iter(row.iter())).map_err(failure)?;
        }
    }
    tx.commit().map_err(failure)?;
    store.bump_generation();

    log::info!("replicated {} ({} rows)", table.name, data.rows.len());
    Ok(TableLoad {
        table_name: table.name.clone(),
        rows_loaded: data.rows.len(),
        created: true,
    })
}
