//! IG-Harvest main entry point
//!
//! This is the command-line interface for the profile feed harvester.

use anyhow::Context;
use clap::Parser;
use ig_harvest::config::{load_accounts, load_config_with_hash, Config};
use ig_harvest::crawler::harvest;
use ig_harvest::output::print_statistics;
use ig_harvest::state::Account;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// IG-Harvest: an incremental profile feed harvester
///
/// Reads profile handles from the accounts file and downloads every still
/// image of each profile's feed into `instagram/instagram_<account>/`.
/// Images already on disk are skipped, so repeated runs only fetch new posts.
#[derive(Parser, Debug)]
#[command(name = "ig-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental profile feed harvester", long_about = None)]
struct Cli {
    /// File with one account handle per line
    #[arg(value_name = "ACCOUNTS", default_value = "accounts")]
    accounts: PathBuf,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the configuration and accounts without crawling
    #[arg(long)]
    dry_run: bool,

    /// Skip the pause between accounts
    #[arg(long)]
    no_delay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let accounts = load_accounts(&cli.accounts)
        .with_context(|| format!("failed to read accounts file {}", cli.accounts.display()))?;
    tracing::info!(
        "{} account(s) loaded from {}",
        accounts.len(),
        cli.accounts.display()
    );

    if cli.dry_run {
        print_dry_run(&config, &accounts);
        return Ok(());
    }

    let stats = harvest(&config, &accounts, !cli.no_delay)
        .await
        .context("failed to start harvest")?;

    if !cli.quiet {
        print_statistics(&stats);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ig_harvest=info,warn"),
            1 => EnvFilter::new("ig_harvest=debug,info"),
            2 => EnvFilter::new("ig_harvest=trace,debug"),
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

fn print_dry_run(config: &Config, accounts: &[Account]) {
    println!("=== IG-Harvest Dry Run ===\n");

    println!("Crawler:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Page size: {}", config.crawler.page_size);
    println!(
        "  Max concurrent downloads: {}",
        config.crawler.max_concurrent_downloads
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  User agent: {}", config.user_agent.value);

    println!("\nPause between accounts:");
    println!(
        "  {}s to {}s",
        config.rate_limit.min_delay_secs, config.rate_limit.max_delay_secs
    );

    println!("\nOutput:");
    println!("  Images: {}", config.output.image_dir.display());
    println!("  Logs: {}", config.output.log_dir.display());

    println!("\nAccounts ({}):", accounts.len());
    for account in accounts {
        println!(
            "  - {} -> {}",
            account,
            config
                .output
                .image_dir
                .join(account.output_dir_name())
                .display()
        );
    }
}
