//! Atomic bulk loading of decoded rows.

use rusqlite::params_from_iter;

use super::decoder::Row;
use super::schema::TableSchema;
use super::{IngestError, IngestResult, TableLoad};
use crate::store::Store;

/// Create `schema`'s table if it is absent and insert `rows` in one transaction.
///
/// An existing table of the same name is kept and appended to. If any row
/// fails to bind or execute, the transaction is rolled back and the table is
/// left exactly as it was before the call.
pub fn load(store: &mut Store, schema: &TableSchema, rows: &[Row]) -> IngestResult<TableLoad> {
    let table = &schema.table_name;
    let failure = |source| IngestError::LoadTransactionFailure {
        table: table.clone(),
        source,
    };

    let existed = store.has_table(table)?;
    let conn = store.connection_mut();
    conn.execute_batch(&schema.create_statement)
        .map_err(failure)?;

    let tx = conn.transaction().map_err(failure)?;
    {
        let mut stmt = tx.prepare(&schema.insert_statement()).map_err(failure)?;
        for row in rows {
            stmt.execute(params_from_iter(row.iter())).map_err(failure)?;
        }
    }
    tx.commit().map_err(failure)?;
    store.bump_generation();

    log::info!("loaded {} rows into {}", rows.len(), table);
    Ok(TableLoad {
        table_name: table.clone(),
        rows_loaded: rows.len(),
        created: !existed,
    })
}
