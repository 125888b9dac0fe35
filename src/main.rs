//! txscope main entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use txscope_config::Config;
use txscope_fetch::{FetchAdapter, HttpTransactionSource, MemorySource, SourceRef};
use txscope_query::{Dashboard, DashboardView, FetchOutcome, FilterStore, MemoryHistory, END_OF_LIST};

#[derive(Parser, Debug)]
#[command(name = "txscope")]
#[command(version = "0.1.0")]
#[command(about = "Browse a paginated transactions endpoint with shareable filters", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Location to start from, e.g. "/?status=failed&category=payment"
    #[arg(short, long, default_value = "/")]
    url: String,

    /// Number of pages to load
    #[arg(short, long, default_value_t = 1)]
    pages: u32,

    /// Load pages until the endpoint runs out
    #[arg(long)]
    all: bool,

    /// Serve records from a JSON file instead of the remote endpoint
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path.clone())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();

    let rt = Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let source: SourceRef = match &args.fixture {
        Some(path) => {
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read fixture {}", path.display()))?;
            log::info!("Serving transactions from {}", path.display());
            Arc::new(MemorySource::from_json(&body)?)
        }
        None => {
            log::info!("Fetching transactions from {}", config.remote.base_url);
            Arc::new(HttpTransactionSource::new(config.remote.base_url.clone()))
        }
    };

    let fetcher = Arc::new(FetchAdapter::new(source, config.remote.page_size));
    let store = FilterStore::from_history(MemoryHistory::new(&args.url));
    let dashboard = Dashboard::new(&config, store, fetcher);

    let mut loaded = 0u32;
    if let Some(handle) = dashboard.sync() {
        if let FetchOutcome::Appended { .. } = handle.wait().await {
            loaded += 1;
        }
    }

    while args.all || loaded < args.pages {
        let Some(handle) = dashboard.load_more() else {
            break;
        };
        match handle.wait().await {
            FetchOutcome::Appended { cursor, count } => {
                log::debug!("Page {} added {} records", cursor, count);
                loaded += 1;
            }
            _ => break,
        }
    }

    print_view(dashboard.store().location(), &dashboard.view());
    Ok(())
}

fn print_view(location: String, view: &DashboardView) {
    println!("{}", location);
    println!();

    for card in &view.cards {
        println!("{:<20} {}", card.title, card.value);
    }
    println!();

    if let Some(empty) = &view.empty_state {
        println!("{}", empty.title());
        println!("{}", empty.description());
        return;
    }

    for record in view.records.iter() {
        println!("{}", record.summary());
    }

    if let Some(error) = &view.error {
        eprintln!("{}", error);
    }
    if view.show_end_of_list {
        println!();
        println!("{}", END_OF_LIST);
    }
}
