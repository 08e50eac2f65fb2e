//! # Datachat
//!
//! Ingests user-supplied tabular files into an in-memory relational store,
//! reconstructs data-lineage graphs from that store, and lays them out with
//! a force-directed simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │  .csv / .tsv             │      │  .sqlite3 / .db / ...    │
//! └──────────────────────────┘      └──────────────────────────┘
//!              │ [decode + infer]                │ [bridge]
//!              ▼                                 │
//! ┌──────────────────────────┐                   │
//! │  schema synthesis        │                   │
//! │  + transactional load    │                   │
//! └──────────────────────────┘                   │
//!              │                                 │
//!              ▼                                 ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Store (in-memory SQLite)                │
//! └─────────────────────────────────────────────────────────┘
//!              │ [lineage builder: filter, degree, top-N]
//!              ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              LineageGraph { nodes, links }              │
//! └─────────────────────────────────────────────────────────┘
//!              │ [force layout]
//!              ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              LayoutSnapshot per tick                    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod ingest;
pub mod layout;
pub mod lineage;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{LineageSettings, Settings};
    pub use crate::ingest::{
        detect_and_ingest, ingest_batch, IngestError, IngestFile, LoadSummary, StorageType,
        TypedValue,
    };
    pub use crate::layout::{Canvas, LayoutConfig, LayoutHandle, LayoutSession, LayoutSnapshot};
    pub use crate::lineage::{CategoryFilter, LineageGraph, LineageGraphBuilder};
    pub use crate::store::{QueryResult, Store};
}
