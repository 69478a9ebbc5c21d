//! Status Relay CLI
//!
//! Local execution entry point. For AWS Lambda, use `status-relay-lambda`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use status_relay::{
    error::Result,
    models::Config,
    pipeline::Relay,
    scheduler::RelayRunner,
    server,
    storage::{DedupStore, open_store},
};

/// status-relay - Status Page to Social Timeline Relay
#[derive(Parser, Debug)]
#[command(
    name = "status-relay",
    version,
    about = "Relays status page incidents and maintenance notices to a social timeline"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute exactly one tick and print the delivery reports
    Run {
        /// Compose messages but do not post or persist anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the liveness endpoint and run ticks on an interval
    Serve,

    /// Validate configuration
    Validate,

    /// Print the processed entry keys
    Seen,

    /// Forget every processed entry key
    Reset,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        log::info!("{} not found, using defaults", cli.config.display());
        Config::default()
    };
    config.apply_env()?;

    if let Command::Run { dry_run: true } = cli.command {
        config.relay.test_mode = true;
    }

    // `seen` and `reset` only touch storage
    if matches!(cli.command, Command::Run { .. } | Command::Serve | Command::Validate) {
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
    }

    match cli.command {
        Command::Run { .. } => {
            let relay = Relay::from_config(Arc::new(config)).await?;
            let report = relay.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            let failed = report.deliveries().iter().filter(|d| d.is_failed()).count();
            if failed > 0 {
                log::warn!("{} deliveries failed", failed);
            }
        }

        Command::Serve => {
            let interval = Duration::from_secs(config.server.interval_secs);
            let server_config = config.server.clone();

            let relay = Relay::from_config(Arc::new(config)).await?;
            let runner = Arc::new(RelayRunner::new(relay));

            log::info!("Scheduling a run every {}s", interval.as_secs());
            let scheduler = Arc::clone(&runner).spawn(interval);

            let result = server::serve(runner, &server_config).await;
            scheduler.abort();
            result?;
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            log::info!("Feed: {}", config.feed_url());
            log::info!("Social API: {}", config.api_url());
            if config.relay.test_mode {
                log::info!("Test mode is on: nothing will be posted or persisted");
            }
        }

        Command::Seen => {
            let dedup = DedupStore::new(open_store(&config.storage).await?, &config.storage.key);
            let set = dedup.load().await?;
            for key in set.iter() {
                println!("{}", key);
            }
            log::info!("{} processed keys under '{}'", set.len(), dedup.key());
        }

        Command::Reset => {
            let dedup = DedupStore::new(open_store(&config.storage).await?, &config.storage.key);
            dedup.clear().await?;
            log::info!("Cleared '{}'", dedup.key());
        }
    }

    Ok(())
}
