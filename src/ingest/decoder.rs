//! Delimiter-separated text decoding.

use std::collections::HashSet;

use serde::Serialize;

use super::value::{infer, TypedValue};
use super::{IngestError, IngestResult};

/// A decoded row, positionally aligned with [`DecodedTable::columns`].
pub type Row = Vec<TypedValue>;

/// Header plus typed rows of a delimited file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DecodedTable {
    pub columns: Vec<String>,
    #[serde(skip)]
    pub rows: Vec<Row>,
}

impl DecodedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&TypedValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }

    /// First non-null value of the column at `idx`.
    pub fn first_non_null(&self, idx: usize) -> Option<&TypedValue> {
        self.rows
            .iter()
            .filter_map(|row| row.get(idx))
            .find(|v| !v.is_null())
    }
}

/// Decode `text` using a single-byte `separator`.
///
/// The first record is the header. Short rows are padded with nulls and
/// fields beyond the header are dropped.
pub fn decode(text: &str, separator: char) -> IngestResult<DecodedTable> {
    if !separator.is_ascii() {
        return Err(IngestError::InvalidSeparator(separator));
    }

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(separator as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = unique_columns(reader.headers()?.iter());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = (0..columns.len())
            .map(|i| record.get(i).map(infer).unwrap_or(TypedValue::Null))
            .collect();
        rows.push(row);
    }

    log::debug!(
        "decoded {} rows x {} columns (separator {:?})",
        rows.len(),
        columns.len(),
        separator
    );

    Ok(DecodedTable { columns, rows })
}

/// Rename repeated header names to `name_2`, `name_3`, ... so every column
/// survives. The first occurrence keeps its name.
fn unique_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let headers: Vec<&str> = headers.collect();
    let original: HashSet<&str> = headers.iter().copied().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(headers.len());

    let mut columns = Vec::with_capacity(headers.len());
    for header in headers {
        let name = if used.contains(header) {
            let renamed = (2..)
                .map(|n| format!("{}_{}", header, n))
                .find(|c| !used.contains(c) && !original.contains(c.as_str()))
                .unwrap_or_default();
            log::warn!("duplicate column {:?} renamed to {:?}", header, renamed);
            renamed
        } else {
            header.to_string()
        };
        used.insert(name.clone());
        columns.push(name);
    }
    columns
}
