//! Data-lineage graph reconstruction.
//!
//! Datasets are nodes; each lineage edge record (source dataset, target
//! dataset, job) becomes a directed link labelled with the job's name.
//!
//! The graph is rebuilt from the store on every request, parameterized by a
//! [`CategoryFilter`] and a top-N flag:
//!
//! ```text
//! edges ──► keep edges whose endpoints both pass the category filter
//!       ──► nodes = endpoints of kept edges (first-appearance order)
//!       ──► links = kept edges, labelled with job names
//!       ──► degree = in + out over kept edges
//!       ──► [top10] keep the 10 highest-degree nodes and the links among them
//! ```
//!
//! Every link endpoint is always present in the node list: nodes are derived
//! from the filtered edges, never the other way round.

mod builder;

pub use builder::LineageGraphBuilder;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;

use crate::store::StoreError;

/// Number of nodes kept when top-N pruning is requested.
pub const TOP_N: usize = 10;

/// Errors that can occur while building a lineage graph.
#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    #[error("Lineage relation not found: {0}")]
    MissingRelation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type LineageResult<T> = Result<T, LineageError>;

/// Set of dataset categories to include.
///
/// An empty filter includes every category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    categories: BTreeSet<String>,
}

impl CategoryFilter {
    /// The unrestricted filter.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }
}

impl<S: Into<String>> FromIterator<S> for CategoryFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "all categories");
        }
        let parts: Vec<&str> = self.iter().collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// A dataset in the lineage graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub degree: usize,
}

/// A job connecting two datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// `{nodes, links}` description of a lineage graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineageGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    /// Store generation the graph was built from.
    pub generation: u64,
}

impl LineageGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn degree(&self, id: &str) -> Option<usize> {
        self.node(id).map(|n| n.degree)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keep the `n` highest-degree nodes and the links among them.
    ///
    /// The sort is stable, so ties keep their existing order.
    pub(crate) fn retain_top(&mut self, n: usize) {
        self.nodes.sort_by(|a, b| b.degree.cmp(&a.degree));
        self.nodes.truncate(n);

        let kept: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.links
            .retain(|l| kept.contains(l.source.as_str()) && kept.contains(l.target.as_str()));
    }
}
