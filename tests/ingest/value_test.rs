#[cfg(test)]
mod tests {
    use datachat::ingest::{detect_and_ingest, IngestFile};
    use datachat::store::Store;
    use rusqlite::types::Value;

    fn read_back(store: &Store, sql: &str) -> Vec<Vec<Value>> {
        let mut stmt = store.connection().prepare(sql).unwrap();
        let width = stmt.column_count();
        stmt.query_map([], |row| (0..width).map(|i| row.get::<_, Value>(i)).collect())
            .unwrap()
            .collect::<Result<Vec<Vec<Value>>, _>>()
            .unwrap()
    }

    #[test]
    fn test_round_trip_cells() {
        let mut store = Store::open_in_memory().unwrap();
        let csv = "id,score,active,joined,note\n\
                   3,3.5,true,2024-01-05,first\n\
                   4,0.25,false,2023-12-31,\n";
        let summary = detect_and_ingest(&mut store, &IngestFile::new("members.csv", csv)).unwrap();
        assert_eq!(summary.total_rows(), 2);

        let rows = read_back(&store, "SELECT * FROM members ORDER BY rowid");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                Value::Integer(3),
                Value::Real(3.5),
                Value::Integer(1),
                Value::Text("2024-01-05T00:00:00.000Z".to_string()),
                Value::Text("first".to_string()),
            ]
        );
        assert_eq!(rows[1][2], Value::Integer(0));
        assert_eq!(rows[1][4], Value::Null);
    }

    #[test]
    fn test_tsv_round_trip() {
        let mut store = Store::open_in_memory().unwrap();
        let tsv = "name\tamount\nwidget, large\t12\n";
        detect_and_ingest(&mut store, &IngestFile::new("orders.tsv", tsv)).unwrap();

        let rows = read_back(&store, "SELECT name, amount FROM orders");
        assert_eq!(
            rows,
            vec![vec![
                Value::Text("widget, large".to_string()),
                Value::Integer(12)
            ]]
        );
    }

    #[test]
    fn test_quoted_fields_keep_separators() {
        let mut store = Store::open_in_memory().unwrap();
        let csv = "city,population\n\"Portland, OR\",650000\n";
        detect_and_ingest(&mut store, &IngestFile::new("cities.csv", csv)).unwrap();

        let rows = read_back(&store, "SELECT city FROM cities");
        assert_eq!(rows[0][0], Value::Text("Portland, OR".to_string()));
    }
}
