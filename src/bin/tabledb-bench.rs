use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::time::Instant;
use tabledb::{persist, Comparator, Record, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Times equality lookups on a table before and after indexing the lookup column.
#[derive(Debug, Parser)]
#[command(name = "tabledb-bench")]
struct BenchConfig {
    /// Rows in the generated table.
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// Random lookups per phase.
    #[arg(long, default_value_t = 1000)]
    lookups: usize,

    /// Seed for choosing lookup keys.
    #[arg(long)]
    seed: Option<u64>,

    /// Benchmark a table read from this file; lookups go against its first column.
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the table to this file when done.
    #[arg(long)]
    save: Option<PathBuf>,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn generated_table(rows: usize) -> Result<Table, Box<dyn std::error::Error>> {
    let columns = ["lastname", "firstname", "id"];
    let mut table = Table::new(&columns)?;
    for i in 0..rows {
        let id = i.to_string();
        table.insert(Record::new(&columns, &["Gap", "Mark", id.as_str()])?)?;
    }
    Ok(table)
}

/// Runs every lookup and returns the elapsed seconds.
fn time_lookups(
    table: &Table,
    column: &str,
    keys: &[String],
    exact: bool,
) -> Result<f64, Box<dyn std::error::Error>> {
    let start = Instant::now();
    for key in keys {
        let found = table.select(&[column], &[key.as_str()], &[Comparator::Equal])?;
        if (exact && found.len() != 1) || found.is_empty() {
            return Err(format!(
                "select returned {} records for {} = {}",
                found.len(),
                column,
                key
            )
            .into());
        }
    }
    Ok(start.elapsed().as_secs_f64())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let config = BenchConfig::parse();

    let (mut table, exact) = match &config.load {
        Some(path) => (persist::read_file(path)?, false),
        None => (generated_table(config.rows)?, true),
    };
    let column = if exact {
        "id".to_string()
    } else {
        table.columns()[0].clone()
    };
    if table.is_empty() {
        return Err("table has no records to look up".into());
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let population: Vec<String> = table
        .records()
        .filter_map(|record| record.get(&column).map(str::to_string))
        .collect();
    let keys: Vec<String> = (0..config.lookups)
        .map(|_| population[rng.random_range(0..population.len())].clone())
        .collect();

    let n = table.len();
    let scan_secs = time_lookups(&table, &column, &keys, exact)?;
    info!(n, lookups = keys.len(), total_secs = scan_secs, "non-indexed search");

    let start = Instant::now();
    table.create_index(&column)?;
    let index_secs = start.elapsed().as_secs_f64();
    info!(n, secs = index_secs, "create index");

    let indexed_secs = time_lookups(&table, &column, &keys, exact)?;
    info!(n, lookups = keys.len(), total_secs = indexed_secs, "indexed search");

    if !keys.is_empty() && indexed_secs > 0.0 {
        info!(speedup = scan_secs / indexed_secs, "indexed vs non-indexed");
    }

    if let Some(path) = &config.save {
        persist::write_file(&table, path)?;
        info!(path = %path.display(), "saved table");
    }
    Ok(())
}
