//! Offline CLI - Inspect and exercise the offline caching worker.
//!
//! Commands:
//! - `offline classify` - Show which strategy serves a URL
//! - `offline partitions` - List the partitions of the configured version
//! - `offline reconcile` - Show which existing partitions activation would delete
//! - `offline precache` - Run a real install against a build directory
//! - `offline config` - Manage configuration

mod commands;
mod config;
mod context;
mod fs_fetcher;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ClassifyArgs, ConfigArgs, PartitionsArgs, PrecacheArgs, ReconcileArgs};

/// Offline CLI - Inspect and exercise the offline caching worker
#[derive(Parser)]
#[command(name = "offline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the caching strategy for one or more URLs
    Classify(ClassifyArgs),

    /// List the cache partitions of the configured version
    Partitions(PartitionsArgs),

    /// Show which existing partitions activation would delete
    Reconcile(ReconcileArgs),

    /// Precache the app shell and fonts from a build directory
    Precache(PrecacheArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug; RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let output = output::Output::new(cli.verbose > 0, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let result = match cli.command {
        Commands::Classify(args) => commands::classify::run(args, &ctx).await,
        Commands::Partitions(args) => commands::partitions::run(args, &ctx).await,
        Commands::Reconcile(args) => commands::reconcile::run(args, &ctx).await,
        Commands::Precache(args) => commands::precache::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
