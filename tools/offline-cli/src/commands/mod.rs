//! CLI command implementations.

pub mod classify;
pub mod config;
pub mod partitions;
pub mod precache;
pub mod reconcile;

use clap::{Args, Subcommand};

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// URLs or paths to classify. Paths resolve against the configured origin.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Treat the requests as top-level navigations.
    #[arg(short, long)]
    pub navigate: bool,

    /// Request method.
    #[arg(short, long, default_value = "GET")]
    pub method: String,
}

/// Arguments for the partitions command.
#[derive(Args)]
pub struct PartitionsArgs {
    /// Cache version to use instead of the configured one.
    #[arg(long)]
    pub version: Option<String>,
}

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Names of the partitions that currently exist.
    #[arg(required = true)]
    pub existing: Vec<String>,

    /// Cache version to use instead of the configured one.
    #[arg(long)]
    pub version: Option<String>,
}

/// Arguments for the precache command.
#[derive(Args)]
pub struct PrecacheArgs {
    /// Build output directory served as the origin.
    #[arg(short, long, default_value = "dist")]
    pub root: String,

    /// Directory holding cache partitions across runs. In-memory when omitted.
    #[arg(short, long)]
    pub store: Option<String>,

    /// Also run activation after a successful install, deleting partitions
    /// of other versions from the store.
    #[arg(long, requires = "store")]
    pub activate: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Output path.
        #[arg(short, long, default_value = "offline.toml")]
        path: String,

        /// Origin the worker is hosted on.
        #[arg(long, default_value = "http://localhost:8080")]
        origin: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
