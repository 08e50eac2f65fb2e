#[cfg(test)]
mod tests {
    use datachat::config::LineageSettings;
    use datachat::ingest::{detect_and_ingest, IngestFile};
    use datachat::lineage::{CategoryFilter, LineageError, LineageGraph, LineageGraphBuilder};
    use datachat::store::Store;
    use std::collections::HashSet;

    /// Load the three lineage relations from CSV text.
    fn store_with(datasets: &str, edges: &str, jobs: &str) -> Store {
        let mut store = Store::open_in_memory().unwrap();
        for (name, text) in [
            ("bank_datasets.csv", datasets),
            ("bank_lineage.csv", edges),
            ("bank_jobs.csv", jobs),
        ] {
            detect_and_ingest(&mut store, &IngestFile::new(name, text)).unwrap();
        }
        store
    }

    fn edges_csv(edges: &[(&str, &str, &str)]) -> String {
        let mut csv = String::from("lineage_id,source_dataset,target_dataset,job_id\n");
        for (i, (s, t, j)) in edges.iter().enumerate() {
            csv.push_str(&format!("{i},{s},{t},{j}\n"));
        }
        csv
    }

    fn build(store: &Store, filter: &CategoryFilter, top10: bool) -> LineageGraph {
        let settings = LineageSettings::default();
        LineageGraphBuilder::new(store, &settings)
            .build(filter, top10)
            .unwrap()
    }

    fn assert_links_closed(graph: &LineageGraph) {
        let ids = graph.node_ids();
        for link in &graph.links {
            assert!(ids.contains(link.source.as_str()), "dangling {}", link.source);
            assert!(ids.contains(link.target.as_str()), "dangling {}", link.target);
        }
    }

    #[test]
    fn test_degree_correctness() {
        let store = store_with(
            "dataset_id,dataset_name,category\nA,Accounts,Core\nB,Balances,Core\nC,Customers,Core\n",
            &edges_csv(&[("A", "B", "J1"), ("B", "C", "J2"), ("A", "C", "J3")]),
            "job_id,job_name\nJ1,extract\nJ2,transform\n",
        );
        let graph = build(&store, &CategoryFilter::all(), false);

        assert_eq!(graph.degree("A"), Some(2));
        assert_eq!(graph.degree("B"), Some(2));
        assert_eq!(graph.degree("C"), Some(2));
        assert_eq!(graph.node("A").unwrap().name, "Accounts");

        let labels: Vec<&str> = graph.links.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["extract", "transform", "J3"]);
        assert_links_closed(&graph);
    }

    #[test]
    fn test_scenario_four_nodes() {
        let store = store_with(
            "dataset_id,dataset_name,category\n",
            &edges_csv(&[
                ("A", "B", "J"),
                ("B", "C", "J"),
                ("C", "D", "J"),
                ("D", "A", "J"),
                ("A", "C", "J"),
            ]),
            "job_id,job_name\nJ,load\n",
        );
        // A header-only dataset file creates no table; supply an empty one.
        store
            .connection()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS bank_datasets
                 (dataset_id TEXT, dataset_name TEXT, category TEXT)",
            )
            .unwrap();

        let graph = build(&store, &CategoryFilter::all(), false);
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);

        let degrees: Vec<usize> = graph.nodes.iter().map(|n| n.degree).collect();
        assert_eq!(degrees, vec![3, 2, 3, 2]);
        assert_eq!(graph.links.len(), 5);
        // No metadata at all: names fall back to raw ids.
        assert!(graph.nodes.iter().all(|n| n.name == n.id));
    }

    #[test]
    fn test_filter_drops_half_included_edges() {
        let store = store_with(
            "dataset_id,dataset_name,category\nA,a,Loans\nB,b,Loans\nC,c,Cards\nD,d,Cards\n",
            &edges_csv(&[("A", "B", "J"), ("B", "C", "J"), ("C", "D", "J")]),
            "job_id,job_name\nJ,load\n",
        );

        let loans = build(&store, &["Loans"].into_iter().collect(), false);
        let ids: HashSet<&str> = loans.node_ids();
        assert_eq!(ids, HashSet::from(["A", "B"]));
        assert_eq!(loans.links.len(), 1);
        assert_eq!(loans.degree("B"), Some(1));

        // Exact string match only.
        let none = build(&store, &["loans"].into_iter().collect(), false);
        assert!(none.is_empty());
        assert!(none.links.is_empty());
    }

    #[test]
    fn test_isolated_datasets_are_not_nodes() {
        let store = store_with(
            "dataset_id,dataset_name,category\nA,a,X\nB,b,X\nLONELY,l,X\n",
            &edges_csv(&[("A", "B", "J")]),
            "job_id,job_name\nJ,load\n",
        );
        let graph = build(&store, &["X"].into_iter().collect(), false);
        assert!(graph.node("LONELY").is_none());
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_filter_monotonicity() {
        let store = store_with(
            "dataset_id,dataset_name,category\n\
             A,a,Loans\nB,b,Loans\nC,c,Cards\nD,d,Cards\nE,e,Risk\n",
            &edges_csv(&[
                ("A", "B", "J"),
                ("B", "C", "J"),
                ("C", "D", "J"),
                ("D", "E", "J"),
                ("A", "C", "J"),
            ]),
            "job_id,job_name\nJ,load\n",
        );

        let chain: [CategoryFilter; 3] = [
            ["Loans"].into_iter().collect(),
            ["Loans", "Cards"].into_iter().collect(),
            ["Loans", "Cards", "Risk"].into_iter().collect(),
        ];
        let graphs: Vec<LineageGraph> = chain.iter().map(|f| build(&store, f, false)).collect();

        for pair in graphs.windows(2) {
            assert!(pair[0].node_ids().is_subset(&pair[1].node_ids()));
        }
        for graph in &graphs {
            assert_links_closed(graph);
        }
        assert_eq!(graphs[2].nodes.len(), 5);
    }

    #[test]
    fn test_top10_bound() {
        // A hub with twelve spokes plus a chain among the spokes.
        let mut edges: Vec<(String, String)> = (0..12)
            .map(|i| ("HUB".to_string(), format!("S{i:02}")))
            .collect();
        for i in 0..5 {
            edges.push((format!("S{i:02}"), format!("S{:02}", i + 1)));
        }
        let refs: Vec<(&str, &str, &str)> = edges
            .iter()
            .map(|(s, t)| (s.as_str(), t.as_str(), "J"))
            .collect();
        let store = store_with(
            "dataset_id,dataset_name,category\nHUB,hub,X\n",
            &edges_csv(&refs),
            "job_id,job_name\nJ,load\n",
        );

        let full = build(&store, &CategoryFilter::all(), false);
        assert_eq!(full.nodes.len(), 13);

        let top = build(&store, &CategoryFilter::all(), true);
        assert_eq!(top.nodes.len(), 10);
        assert_eq!(top.nodes[0].id, "HUB");
        assert_eq!(top.nodes[0].degree, 12);
        assert_links_closed(&top);

        // Degrees are those of the full graph, not recomputed after pruning.
        for node in &top.nodes {
            assert_eq!(full.degree(&node.id), Some(node.degree));
        }
        // Spokes S00..S05 have degree 2 or 3 and outrank the leaves.
        let kept = top.node_ids();
        for id in ["S00", "S01", "S02", "S03", "S04", "S05"] {
            assert!(kept.contains(id), "{id} should survive pruning");
        }
    }

    #[test]
    fn test_top10_keeps_small_graphs_whole() {
        let store = store_with(
            "dataset_id,dataset_name,category\n",
            &edges_csv(&[("A", "B", "J"), ("B", "C", "J")]),
            "job_id,job_name\nJ,load\n",
        );
        store
            .connection()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS bank_datasets (dataset_id, dataset_name, category)",
            )
            .unwrap();

        let graph = build(&store, &CategoryFilter::all(), true);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.links.len(), 2);
    }

    #[test]
    fn test_list_categories() {
        let store = store_with(
            "dataset_id,dataset_name,category\nA,a,Loans\nB,b,Cards\nC,c,Loans\nD,d,\n",
            &edges_csv(&[("A", "B", "J")]),
            "job_id,job_name\nJ,load\n",
        );
        let settings = LineageSettings::default();
        let categories = LineageGraphBuilder::new(&store, &settings)
            .list_categories()
            .unwrap();
        assert_eq!(categories, vec!["Cards", "Loans"]);
    }

    #[test]
    fn test_missing_job_relation() {
        let mut store = Store::open_in_memory().unwrap();
        detect_and_ingest(
            &mut store,
            &IngestFile::new("bank_lineage.csv", edges_csv(&[("A", "B", "J")])),
        )
        .unwrap();
        detect_and_ingest(
            &mut store,
            &IngestFile::new("bank_datasets.csv", "dataset_id,dataset_name,category\nA,a,X\n"),
        )
        .unwrap();

        let settings = LineageSettings::default();
        let err = LineageGraphBuilder::new(&store, &settings)
            .build(&CategoryFilter::all(), false)
            .unwrap_err();
        assert!(matches!(err, LineageError::MissingRelation(t) if t == "bank_jobs"));
    }

    #[test]
    fn test_custom_relation_names() {
        let mut store = Store::open_in_memory().unwrap();
        for (name, text) in [
            ("tables.csv", "tid,title,domain\n1,orders,sales\n2,revenue,finance\n"),
            ("flows.csv", "src,dst,proc\n1,2,10\n"),
            ("procs.csv", "pid,label\n10,aggregate\n"),
        ] {
            detect_and_ingest(&mut store, &IngestFile::new(name, text)).unwrap();
        }

        let settings = LineageSettings {
            datasets_table: "tables".to_string(),
            dataset_id_column: "tid".to_string(),
            dataset_name_column: "title".to_string(),
            category_column: "domain".to_string(),
            edges_table: "flows".to_string(),
            edge_source_column: "src".to_string(),
            edge_target_column: "dst".to_string(),
            edge_job_column: "proc".to_string(),
            jobs_table: "procs".to_string(),
            job_id_column: "pid".to_string(),
            job_name_column: "label".to_string(),
        };
        let graph = LineageGraphBuilder::new(&store, &settings)
            .build(&["sales", "finance"].into_iter().collect(), false)
            .unwrap();

        assert_eq!(graph.node("1").unwrap().name, "orders");
        assert_eq!(graph.node("2").unwrap().name, "revenue");
        assert_eq!(graph.links[0].label, "aggregate");
    }

    #[test]
    fn test_graph_carries_store_generation() {
        let mut store = store_with(
            "dataset_id,dataset_name,category\n",
            &edges_csv(&[("A", "B", "J")]),
            "job_id,job_name\nJ,load\n",
        );
        store
            .query("CREATE TABLE bank_datasets (dataset_id, dataset_name, category)")
            .unwrap();

        let graph = build(&store, &CategoryFilter::all(), false);
        assert_eq!(graph.generation, store.generation());

        detect_and_ingest(&mut store, &IngestFile::new("bank_jobs.csv", "job_id,job_name\nK,x\n"))
            .unwrap();
        assert!(graph.generation < store.generation());
    }
}
