#[cfg(test)]
mod tests {
    use datachat::ingest::{detect_and_ingest, FileKind, IngestError, IngestFile};
    use datachat::store::Store;
    use rusqlite::Connection;

    /// Build a database image on disk and return its bytes.
    fn database_image(setup: &str) -> Vec<u8> {
        let file = tempfile::NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(file.path()).unwrap();
            conn.execute_batch(setup).unwrap();
        }
        std::fs::read(file.path()).unwrap()
    }

    #[test]
    fn test_import_replicates_tables() {
        let bytes = database_image(
            "CREATE TABLE bank_jobs (job_id TEXT PRIMARY KEY, job_name TEXT NOT NULL);
             INSERT INTO bank_jobs VALUES ('J1', 'nightly load'), ('J2', 'reconcile');
             CREATE TABLE audit (at TEXT DEFAULT 'now');",
        );
        let mut store = Store::open_in_memory().unwrap();

        let summary =
            detect_and_ingest(&mut store, &IngestFile::new("bank.sqlite3", bytes)).unwrap();
        assert_eq!(summary.kind, FileKind::Database);
        assert_eq!(summary.total_rows(), 2);
        assert_eq!(store.table_names().unwrap(), vec!["bank_jobs", "audit"]);

        // Source DDL is kept, constraints included.
        let jobs = store.table_columns("bank_jobs").unwrap();
        assert!(jobs[0].is_primary_key);
        assert!(jobs[1].not_null);
        let audit = store.table_columns("audit").unwrap();
        assert_eq!(audit[0].default.as_deref(), Some("'now'"));
        assert_eq!(store.row_count("audit").unwrap(), 0);
    }

    #[test]
    fn test_import_overwrites_same_named_table() {
        let mut store = Store::open_in_memory().unwrap();
        detect_and_ingest(
            &mut store,
            &IngestFile::new("bank_jobs.csv", "legacy\n1\n2\n3\n"),
        )
        .unwrap();

        let bytes = database_image(
            "CREATE TABLE bank_jobs (job_id TEXT, job_name TEXT);
             INSERT INTO bank_jobs VALUES ('J1', 'nightly');",
        );
        detect_and_ingest(&mut store, &IngestFile::new("bank.db", bytes)).unwrap();

        assert_eq!(store.row_count("bank_jobs").unwrap(), 1);
        let names: Vec<String> = store
            .table_columns("bank_jobs")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["job_id", "job_name"]);
    }

    #[test]
    fn test_malformed_image_leaves_store_untouched() {
        let mut store = Store::open_in_memory().unwrap();
        detect_and_ingest(&mut store, &IngestFile::new("keep.csv", "x\n1\n")).unwrap();
        let generation = store.generation();

        let garbage = b"definitely not a database".repeat(400);
        let err = detect_and_ingest(&mut store, &IngestFile::new("broken.s3db", garbage))
            .unwrap_err();

        assert!(matches!(err, IngestError::MalformedSourceDatabase(_)));
        assert_eq!(store.table_names().unwrap(), vec!["keep"]);
        assert_eq!(store.generation(), generation);
    }

    #[test]
    fn test_failed_copy_restores_previous_table() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .query("CREATE TABLE t (x INTEGER, label TEXT)")
            .unwrap();
        store
            .query("INSERT INTO t VALUES (10, 'old'), (20, 'old')")
            .unwrap();
        let generation = store.generation();

        // The source holds a row its own CHECK constraint rejects on copy.
        let bytes = database_image(
            "PRAGMA ignore_check_constraints = ON;
             CREATE TABLE t (x INTEGER CHECK (x > 0));
             INSERT INTO t VALUES (1), (-1);",
        );
        let err = detect_and_ingest(&mut store, &IngestFile::new("bad.db", bytes)).unwrap_err();

        match err {
            IngestError::LoadTransactionFailure { table, .. } => assert_eq!(table, "t"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(store.row_count("t").unwrap(), 2);
        let names: Vec<String> = store
            .table_columns("t")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["x", "label"]);
        assert_eq!(store.generation(), generation);
    }
}
