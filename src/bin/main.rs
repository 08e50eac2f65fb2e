//! Datachat CLI - Load data files and explore their lineage
//!
//! Usage:
//!   datachat [-f <file>]... [--demo <title>] <command>
//!
//! Examples:
//!   datachat -f bank.sqlite3 schema
//!   datachat -f sales.csv query --sql "SELECT * FROM sales"
//!   datachat -f bank.sqlite3 lineage --category Loans --top10 --layout
//!   datachat --demo "Bank lineage" categories

use clap::{Parser, Subcommand};
use datachat::config::Settings;
use datachat::ingest::{ingest_batch, IngestFile};
use datachat::layout::LayoutSession;
use datachat::lineage::{CategoryFilter, LineageGraphBuilder};
use datachat::store::Store;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "datachat")]
#[command(about = "Datachat - Load tabular files into SQLite and explore data lineage")]
#[command(version)]
struct Cli {
    /// Files to load (.csv, .tsv, .sqlite3, .sqlite, .db, .s3db, .sl3)
    #[arg(short, long = "file", global = true)]
    files: Vec<PathBuf>,

    /// Load a demo dataset from the configuration
    #[arg(long, global = true)]
    demo: Option<String>,

    /// Path to a config file (defaults to the standard search order)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema of every loaded table
    Schema,

    /// Run a SQL statement against the loaded data
    Query {
        #[arg(short, long)]
        sql: String,

        /// Print every row instead of the preview
        #[arg(long)]
        all: bool,
    },

    /// Build the lineage graph
    Lineage {
        /// Restrict to datasets in these categories (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Keep only the 10 highest-degree datasets
        #[arg(long)]
        top10: bool,

        /// Also run the force layout and print final positions
        #[arg(long)]
        layout: bool,
    },

    /// List dataset categories
    Categories,

    /// List configured demo datasets
    Demos,
}

#[derive(Serialize)]
struct SchemaOutput<'a> {
    fingerprint: String,
    tables: &'a [datachat::store::TableInfo],
}

#[derive(Serialize)]
struct LineageOutput<'a> {
    graph: &'a datachat::lineage::LineageGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<datachat::layout::LayoutSnapshot>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut store = match Store::open_in_memory() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(code) = load_files(&mut store, &settings, &cli) {
        return code;
    }

    match cli.command {
        Commands::Schema => cmd_schema(&store),
        Commands::Query { sql, all } => cmd_query(&mut store, &settings, &sql, all),
        Commands::Lineage {
            categories,
            top10,
            layout,
        } => cmd_lineage(&store, &settings, categories, top10, layout),
        Commands::Categories => cmd_categories(&store, &settings),
        Commands::Demos => cmd_demos(&settings),
    }
}

/// Load `--file` arguments and the `--demo` file. Individual file failures
/// are reported and skipped; only unreadable inputs abort.
fn load_files(store: &mut Store, settings: &Settings, cli: &Cli) -> Result<(), ExitCode> {
    let mut paths = cli.files.clone();
    if let Some(title) = &cli.demo {
        let demo = settings.demo(title).map_err(|e| {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        })?;
        let file = demo.resolved_file().map_err(|e| {
            eprintln!("Error resolving demo file: {}", e);
            ExitCode::FAILURE
        })?;
        paths.push(file);
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        match IngestFile::from_path(path) {
            Ok(f) => files.push(f),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                return Err(ExitCode::FAILURE);
            }
        }
    }

    for outcome in ingest_batch(store, &files) {
        match outcome.result {
            Ok(summary) => {
                for warning in &summary.warnings {
                    eprintln!("Warning: {}", warning);
                }
            }
            Err(e) => eprintln!("Error importing '{}': {}", outcome.file_name, e),
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_schema(store: &Store) -> ExitCode {
    let result = store
        .current_schema()
        .and_then(|tables| Ok((store.schema_fingerprint()?, tables)));

    match result {
        Ok((fingerprint, tables)) => print_json(&SchemaOutput {
            fingerprint,
            tables: &tables,
        }),
        Err(e) => {
            eprintln!("Error reading schema: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_query(store: &mut Store, settings: &Settings, sql: &str, all: bool) -> ExitCode {
    match store.query(sql) {
        Ok(result) if all => print_json(&result),
        Ok(result) => {
            let limit = settings.query.preview_limit;
            if result.rows.len() > limit {
                eprintln!("Showing {} of {} rows", limit, result.rows.len());
            }
            print_json(&result.preview(limit))
        }
        Err(e) => {
            eprintln!("Query error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_lineage(
    store: &Store,
    settings: &Settings,
    categories: Vec<String>,
    top10: bool,
    layout: bool,
) -> ExitCode {
    let filter: CategoryFilter = categories.into_iter().collect();
    let builder = LineageGraphBuilder::new(store, &settings.lineage);

    let graph = match builder.build(&filter, top10) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Failed to build lineage diagram: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let snapshot = if layout {
        let mut session = LayoutSession::new(settings.layout.clone());
        session
            .start(&graph.nodes, &graph.links, settings.layout.canvas())
            .settle()
    } else {
        None
    };

    print_json(&LineageOutput {
        graph: &graph,
        layout: snapshot,
    })
}

fn cmd_categories(store: &Store, settings: &Settings) -> ExitCode {
    match LineageGraphBuilder::new(store, &settings.lineage).list_categories() {
        Ok(categories) => print_json(&categories),
        Err(e) => {
            eprintln!("Error listing categories: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_demos(settings: &Settings) -> ExitCode {
    if settings.demos.is_empty() {
        println!("No demos configured.");
        return ExitCode::SUCCESS;
    }
    print_json(&settings.demos)
}
