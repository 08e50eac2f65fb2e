//! Ingestion engine.
//!
//! Turns uploaded files into tables of the working store.
//!
//! # Architecture
//!
//! ```text
//!            IngestFile { name, contents }
//!                         │
//!                         ▼ [FileKind::detect]
//!          ┌──────────────┴───────────────┐
//!          │ .csv / .tsv                  │ .db / .sqlite / .sqlite3 / .s3db / .sl3
//!          ▼                              ▼
//!   decoder::decode                bridge::import_database
//!          │                              │  (drop + replicate DDL + copy rows)
//!          ▼                              │
//!   schema::synthesize                    │
//!          │                              │
//!          ▼                              │
//!   loader::load (one transaction)        │
//!          └──────────────┬───────────────┘
//!                         ▼
//!                       Store
//! ```
//!
//! Failures are returned as [`IngestError`]s; an empty delimited file is not
//! an error but a [`IngestWarning::EmptyInput`] on an otherwise successful
//! [`LoadSummary`].

pub mod bridge;
pub mod decoder;
pub mod loader;
pub mod schema;
pub mod value;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::store::{Store, StoreError};

pub use bridge::{import_database, import_database_file};
pub use decoder::{decode, DecodedTable, Row};
pub use loader::load;
pub use schema::{synthesize, table_name_from_file, ColumnSpec, TableSchema};
pub use value::{infer, StorageType, TypedValue};

/// File extensions treated as SQLite database images.
const DATABASE_EXTENSIONS: &[&str] = &["sqlite3", "sqlite", "db", "s3db", "sl3"];

/// Errors that can occur while ingesting a file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unrecognized file type: {0}")]
    UnrecognizedFileType(String),

    #[error("Separator must be a single ASCII character, got {0:?}")]
    InvalidSeparator(char),

    #[error("Failed to decode delimited text: {0}")]
    Decode(#[from] csv::Error),

    #[error("Failed to load table {table}: {source}")]
    LoadTransactionFailure {
        table: String,
        source: rusqlite::Error,
    },

    #[error("Malformed source database: {0}")]
    MalformedSourceDatabase(#[source] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Non-fatal conditions reported alongside a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// The file decoded to zero data rows; no table was created.
    EmptyInput { table: String },
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestWarning::EmptyInput { table } => write!(f, "File has no rows: {}", table),
        }
    }
}

/// How a file is ingested, decided from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileKind {
    Delimited { separator: char },
    Database,
}

impl FileKind {
    /// Detect the kind from a file name (extension, case-insensitive).
    pub fn detect(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()?
            .to_string_lossy()
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Some(FileKind::Delimited { separator: ',' }),
            "tsv" => Some(FileKind::Delimited { separator: '\t' }),
            e if DATABASE_EXTENSIONS.contains(&e) => Some(FileKind::Database),
            _ => None,
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct IngestFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl IngestFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> IngestResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, contents })
    }
}

/// Outcome of loading one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub table_name: String,
    pub rows_loaded: usize,
    /// False when rows were appended to a table that already existed.
    pub created: bool,
}

/// Outcome of ingesting one file.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub file_name: String,
    pub kind: FileKind,
    pub tables: Vec<TableLoad>,
    pub warnings: Vec<IngestWarning>,
}

impl LoadSummary {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows_loaded).sum()
    }
}

/// Result of one file within a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub file_name: String,
    pub result: IngestResult<LoadSummary>,
}

/// Detect the kind of `file` and load it into `store`.
pub fn detect_and_ingest(store: &mut Store, file: &IngestFile) -> IngestResult<LoadSummary> {
    let kind = FileKind::detect(&file.name)
        .ok_or_else(|| IngestError::UnrecognizedFileType(file.name.clone()))?;

    let mut summary = LoadSummary {
        file_name: file.name.clone(),
        kind,
        tables: Vec::new(),
        warnings: Vec::new(),
    };

    match kind {
        FileKind::Delimited { separator } => {
            let text = String::from_utf8_lossy(&file.contents);
            let decoded = decode(&text, separator)?;
            let table_name = table_name_from_file(&file.name);

            if decoded.is_empty() {
                log::warn!("{} has no data rows; skipping {}", file.name, table_name);
                summary
                    .warnings
                    .push(IngestWarning::EmptyInput { table: table_name });
                return Ok(summary);
            }

            let schema = synthesize(&decoded, &table_name);
            summary.tables.push(load(store, &schema, &decoded.rows)?);
        }
        FileKind::Database => {
            summary.tables = import_database(store, &file.contents)?;
        }
    }

    log::info!(
        "imported {} ({} tables, {} rows)",
        file.name,
        summary.tables.len(),
        summary.total_rows()
    );
    Ok(summary)
}

/// Ingest several files in order. A failing file does not stop the batch.
pub fn ingest_batch(store: &mut Store, files: &[IngestFile]) -> Vec<BatchOutcome> {
    files
        .iter()
        .map(|file| {
            let result = detect_and_ingest(store, file);
            if let Err(e) = &result {
                log::warn!("skipping {}: {}", file.name, e);
            }
            BatchOutcome {
                file_name: file.name.clone(),
                result,
            }
        })
        .collect()
}
