//! Lineage graph construction from the working store.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use super::{
    CategoryFilter, GraphLink, GraphNode, LineageError, LineageGraph, LineageResult, TOP_N,
};
use crate::config::LineageSettings;
use crate::store::{quote_ident, Store};

/// One lineage edge record.
#[derive(Debug, Clone)]
struct EdgeRecord {
    source: String,
    target: String,
    job: String,
}

/// Builds lineage graphs from the relations named in [`LineageSettings`].
pub struct LineageGraphBuilder<'a> {
    store: &'a Store,
    settings: &'a LineageSettings,
}

impl<'a> LineageGraphBuilder<'a> {
    pub fn new(store: &'a Store, settings: &'a LineageSettings) -> Self {
        Self { store, settings }
    }

    /// Distinct non-null dataset categories, ascending.
    ///
    /// Returns an empty list when the store has no dataset relation yet.
    pub fn list_categories(&self) -> LineageResult<Vec<String>> {
        let s = self.settings;
        if !self.store.has_table(&s.datasets_table)? {
            return Ok(Vec::new());
        }

        let category = quote_ident(&s.category_column);
        let sql = format!(
            "SELECT DISTINCT {category} FROM {} WHERE {category} IS NOT NULL ORDER BY {category}",
            quote_ident(&s.datasets_table),
        );
        let mut stmt = self.store.connection().prepare(&sql)?;
        let categories = stmt
            .query_map([], |row| row.get::<_, Value>(0))?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(value_to_id)
            .collect();
        Ok(categories)
    }

    /// Build the graph for `filter`, optionally pruned to the top-N nodes.
    pub fn build(&self, filter: &CategoryFilter, top10: bool) -> LineageResult<LineageGraph> {
        self.require_relations()?;

        let edges = self.fetch_edges()?;
        let datasets = self.fetch_datasets(filter)?;
        let jobs = self.fetch_jobs()?;

        // With no filter every edge survives; otherwise both endpoints must
        // belong to a selected category.
        let allowed = |id: &str| filter.is_empty() || datasets.contains_key(id);
        let filtered: Vec<&EdgeRecord> = edges
            .iter()
            .filter(|e| allowed(&e.source) && allowed(&e.target))
            .collect();

        log::debug!(
            "lineage: {} of {} edges pass filter ({})",
            filtered.len(),
            edges.len(),
            filter
        );

        let mut graph: DiGraph<GraphNode, GraphLink> = DiGraph::new();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();

        for edge in &filtered {
            let source = node_for(&mut graph, &mut index, &edge.source, &datasets);
            let target = node_for(&mut graph, &mut index, &edge.target, &datasets);
            let label = jobs
                .get(&edge.job)
                .cloned()
                .unwrap_or_else(|| edge.job.clone());
            graph.add_edge(
                source,
                target,
                GraphLink {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    label,
                },
            );
        }

        // A self-loop shows up in both directions and so counts twice.
        for idx in graph.node_indices() {
            let degree = graph.edges_directed(idx, Direction::Outgoing).count()
                + graph.edges_directed(idx, Direction::Incoming).count();
            graph[idx].degree = degree;
        }

        let (nodes, links) = graph.into_nodes_edges();
        let mut lineage = LineageGraph {
            nodes: nodes.into_iter().map(|n| n.weight).collect(),
            links: links.into_iter().map(|e| e.weight).collect(),
            generation: self.store.generation(),
        };

        if top10 {
            lineage.retain_top(TOP_N);
        }
        Ok(lineage)
    }

    fn require_relations(&self) -> LineageResult<()> {
        let s = self.settings;
        for table in [&s.edges_table, &s.datasets_table, &s.jobs_table] {
            if !self.store.has_table(table)? {
                return Err(LineageError::MissingRelation(table.clone()));
            }
        }
        Ok(())
    }

    fn fetch_edges(&self) -> LineageResult<Vec<EdgeRecord>> {
        let s = self.settings;
        let sql = format!(
            "SELECT {}, {}, {} FROM {}",
            quote_ident(&s.edge_source_column),
            quote_ident(&s.edge_target_column),
            quote_ident(&s.edge_job_column),
            quote_ident(&s.edges_table),
        );
        let mut stmt = self.store.connection().prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Value>(0)?,
                    row.get::<_, Value>(1)?,
                    row.get::<_, Value>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut edges = Vec::with_capacity(rows.len());
        for (source, target, job) in rows {
            match (value_to_id(source), value_to_id(target)) {
                (Some(source), Some(target)) => edges.push(EdgeRecord {
                    source,
                    target,
                    job: value_to_id(job).unwrap_or_default(),
                }),
                _ => log::warn!("skipping lineage edge with a NULL endpoint"),
            }
        }
        Ok(edges)
    }

    /// Dataset id -> display name, restricted to `filter` when it is non-empty.
    fn fetch_datasets(&self, filter: &CategoryFilter) -> LineageResult<HashMap<String, String>> {
        let s = self.settings;
        let mut sql = format!(
            "SELECT {}, {} FROM {}",
            quote_ident(&s.dataset_id_column),
            quote_ident(&s.dataset_name_column),
            quote_ident(&s.datasets_table),
        );
        if !filter.is_empty() {
            let placeholders = vec!["?"; filter.len()].join(", ");
            sql.push_str(&format!(
                " WHERE {} IN ({})",
                quote_ident(&s.category_column),
                placeholders
            ));
        }

        let mut stmt = self.store.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(filter.iter()), |row| {
                Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, name)| {
                let id = value_to_id(id)?;
                let name = display_name(name, &id);
                Some((id, name))
            })
            .collect())
    }

    /// Job id -> display name.
    fn fetch_jobs(&self) -> LineageResult<HashMap<String, String>> {
        let s = self.settings;
        let sql = format!(
            "SELECT {}, {} FROM {}",
            quote_ident(&s.job_id_column),
            quote_ident(&s.job_name_column),
            quote_ident(&s.jobs_table),
        );
        let mut stmt = self.store.connection().prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, name)| {
                let id = value_to_id(id)?;
                let name = display_name(name, &id);
                Some((id, name))
            })
            .collect())
    }
}

/// Look up or insert the node for `id`, preserving first-appearance order.
fn node_for<'e>(
    graph: &mut DiGraph<GraphNode, GraphLink>,
    index: &mut HashMap<&'e str, NodeIndex>,
    id: &'e str,
    datasets: &HashMap<String, String>,
) -> NodeIndex {
    *index.entry(id).or_insert_with(|| {
        graph.add_node(GraphNode {
            id: id.to_string(),
            name: datasets.get(id).cloned().unwrap_or_else(|| id.to_string()),
            degree: 0,
        })
    })
}

/// Normalise an id of any storage class to text. NULL has no id.
fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(t) => Some(t),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// A NULL or empty name displays as the raw id.
fn display_name(name: Value, id: &str) -> String {
    value_to_id(name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| id.to_string())
}
