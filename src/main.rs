//! Catalog Crawler main entry point
//!
//! This is the command-line interface for the catalog crawler.

use catalog_crawler::config::{load_config_with_hash, Config};
use catalog_crawler::crawler::{crawl, CategorySequencer};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Catalog Crawler: a sequential category crawler for rendered storefronts
///
/// Walks the configured category listings page by page, renders every new
/// product page through a Splash-compatible service and stores one record
/// per product URL in SQLite.
#[derive(Parser, Debug)]
#[command(name = "catalog-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A sequential category crawler for rendered storefronts", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Export stored products as JSON lines to PATH and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats"])]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = cli.export.as_deref() {
        handle_export(&config, path)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_crawler=info,warn"),
            1 => EnvFilter::new("catalog_crawler=debug,info"),
            2 => EnvFilter::new("catalog_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Catalog Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Render wait: {}s", config.crawler.wait_seconds);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!(
        "  Max products per page: {}",
        config.crawler.max_products_per_page
    );
    println!(
        "  Max images per product: {}",
        config.crawler.max_images_per_product
    );
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);

    println!("\nRenderer:");
    println!("  Endpoint: {}", config.renderer.endpoint);
    println!("  Timeout: {}s", config.renderer.timeout_secs);
    println!("  User agents: {}", config.user_agent.agents.len());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let sequencer = CategorySequencer::from_config(&config.categories)?;
    println!("\nCategories ({}):", sequencer.len());
    for category in sequencer.categories() {
        let marker = if category.skip { " (skip)" } else { "" };
        println!("  {}. {}{}", category.index + 1, category.url, marker);
    }

    println!("\n✓ Configuration is valid");
    match sequencer
        .next_eligible_category(0)
        .and_then(|index| sequencer.get(index))
    {
        Some(first) => println!("✓ Would start crawling at {}", first.url),
        None => println!("! Every category is skipped; nothing would be crawled"),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_crawler::output::{load_statistics, print_statistics};
    use catalog_crawler::storage::open_sink;

    println!("Database: {}\n", config.output.database_path);

    let sink = open_sink(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes stored products as JSON lines
fn handle_export(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_crawler::output::export_products;
    use catalog_crawler::storage::open_sink;

    println!("=== Exporting Products ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", path.display());
    println!();

    let sink = open_sink(Path::new(&config.output.database_path))?;
    let count = export_products(&sink, path)?;

    println!("✓ Exported {} product(s) to: {}", count, path.display());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    let eligible = config.categories.iter().filter(|c| !c.skip).count();
    tracing::info!(
        "Categories: {} configured, {} eligible",
        config.categories.len(),
        eligible
    );

    // Run the crawler
    match crawl(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed successfully: {} product(s) accepted",
                summary.products_accepted
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
