use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use regsearch_core::{Config, FilterSet, JsonRecord};
use regsearch_session::{Outcome, PagedSearchSession, SortDirection};

/// Runs one filtered search against the configured backend and prints a table.
#[derive(Debug, Parser)]
#[command(name = "regsearch", version)]
struct Cli {
    /// Directory holding config.toml / config.<env>.toml
    #[arg(long, env = "REGSEARCH_CONFIG_DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Field path to sort by (missing values last)
    #[arg(long)]
    sort: Option<String>,

    #[arg(long, requires = "sort")]
    desc: bool,

    /// Filters as NAME=VALUE
    #[arg(required = true, value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplayConfig {
    #[serde(default)]
    columns: Vec<String>,
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=').ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((name.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir).map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let backend = config.backend()?;
    let display: DisplayConfig = config.get("display").unwrap_or_default();
    let filters: FilterSet = cli.filters.into_iter().collect();

    tracing::info!(endpoint = %backend.endpoint, filters = filters.len(), "starting search");
    let session = PagedSearchSession::<JsonRecord>::from_backend(backend)?;
    session.search(&filters).await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    for _ in 1..cli.pages {
        match session.load_more().await.map_err(|e| anyhow::anyhow!(e.user_message()))? {
            Outcome::Skipped => {
                tracing::debug!("no further pages");
                break;
            }
            Outcome::Applied | Outcome::Stale => {}
        }
    }

    let items = match &cli.sort {
        Some(key) => {
            let direction = if cli.desc { SortDirection::Descending } else { SortDirection::Ascending };
            session.sorted(key, direction)
        }
        None => session.state().items.clone(),
    };
    let total = session.state().total_count;

    if items.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    let columns = if display.columns.is_empty() {
        items[0].fields().keys().cloned().collect::<Vec<_>>()
    } else {
        display.columns
    };
    println!("{}", columns.join("\t"));
    for item in &items {
        let row: Vec<String> = columns.iter().map(|c| item.display(c)).collect();
        println!("{}", row.join("\t"));
    }
    println!("\nShowing {} of {} results", items.len(), total);
    Ok(())
}
