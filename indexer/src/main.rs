use anyhow::Result;
use boolsearch_core::engine::SearchEngine;
use boolsearch_core::index::IndexingStats;
use boolsearch_core::store::JsonlStore;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "boolsearch-indexer")]
#[command(about = "Build the boolean search index over a JSON/JSONL corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print corpus statistics as JSON
    Stats {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
    },
    /// Build the index and print documents matching a boolean query as JSON lines
    Search {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Query using &&, ||, ! and parentheses
        #[arg(long)]
        query: String,
        /// Maximum number of documents to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct StatsReport<'a> {
    built_at: String,
    input: &'a str,
    #[serde(flatten)]
    stats: &'a IndexingStats,
    total_bytes_kb: f64,
    avg_token_length: f64,
    indexing_speed_kb_per_sec: f64,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { input } => print_stats(&input),
        Commands::Search { input, query, limit } => print_matches(&input, &query, limit),
    }
}

fn open_engine(input: &str) -> Result<(SearchEngine, IndexingStats)> {
    let engine = SearchEngine::new(Arc::new(JsonlStore::new(input)));
    let stats = engine.build_index()?;
    Ok((engine, stats))
}

fn print_stats(input: &str) -> Result<()> {
    let (_, stats) = open_engine(input)?;
    let report = StatsReport {
        built_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        input,
        stats: &stats,
        total_bytes_kb: stats.total_bytes_kb(),
        avg_token_length: stats.avg_token_length(),
        indexing_speed_kb_per_sec: stats.indexing_speed_kb_per_sec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_matches(input: &str, query: &str, limit: usize) -> Result<()> {
    let (engine, _) = open_engine(input)?;
    let ids = engine.search(query);
    let documents = engine.fetch_documents(&ids);
    tracing::info!(query, hits = ids.len(), "query evaluated");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for doc in documents.iter().take(limit) {
        serde_json::to_writer(&mut out, doc)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
