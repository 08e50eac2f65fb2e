//! Schema synthesis from decoded rows.
//!
//! Column types are never declared by the user; they are taken from the
//! first non-null value of each column. A column that is null throughout
//! falls back to TEXT.

use std::path::Path;

use serde::Serialize;

use super::decoder::DecodedTable;
use super::value::StorageType;
use crate::store::quote_ident;

/// A synthesized column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub name: String,
    pub storage_type: StorageType,
}

/// A synthesized table: columns plus the statement that creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
    pub create_statement: String,
}

impl TableSchema {
    /// Parameterized INSERT covering every column in order.
    pub fn insert_statement(&self) -> String {
        insert_statement(
            &self.table_name,
            self.columns.iter().map(|c| c.name.as_str()),
        )
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Derive a table name from a file name.
///
/// The extension is stripped and every character outside `[A-Za-z0-9_]`
/// becomes `_`.
pub fn table_name_from_file(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());

    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Synthesize the schema of `table` under `table_name`.
pub fn synthesize(table: &DecodedTable, table_name: &str) -> TableSchema {
    let columns: Vec<ColumnSpec> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| ColumnSpec {
            name: name.clone(),
            storage_type: table
                .first_non_null(idx)
                .and_then(|v| v.storage_type())
                .unwrap_or(StorageType::Text),
        })
        .collect();

    let column_defs = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.storage_type))
        .collect::<Vec<_>>()
        .join(", ");

    let create_statement = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table_name),
        column_defs
    );

    TableSchema {
        table_name: table_name.to_string(),
        columns,
        create_statement,
    }
}

/// Build `INSERT INTO "t" ("a", "b") VALUES (?, ?)`.
pub(crate) fn insert_statement<'a>(
    table_name: &str,
    columns: impl IntoIterator<Item = &'a str>,
) -> String {
    let quoted: Vec<String> = columns.into_iter().map(quote_ident).collect();
    let placeholders = vec!["?"; quoted.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table_name),
        quoted.join(", "),
        placeholders
    )
}
