//! Run a real install against a build directory.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use offline_cache::{CacheStore, DirCacheStore, InMemoryCacheStore, PartitionKind};
use offline_core::{WorkerConfig, WorkerState};
use offline_worker::{InstallReport, NoopHost, OfflineWorker};
use serde::Serialize;

use super::PrecacheArgs;
use crate::context::Context;
use crate::fs_fetcher::FsFetcher;
use crate::output::format_bytes;

#[derive(Debug, Serialize)]
struct PrecacheReport {
    version: String,
    partitions: Vec<PartitionReport>,
    bytes: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    deleted: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PartitionReport {
    name: String,
    entries: usize,
}

/// What an install (and optional activation) left behind.
#[derive(Debug)]
struct Installed {
    report: InstallReport,
    deleted: Vec<String>,
    state: WorkerState,
    app_shell: String,
    fonts: String,
}

async fn install_into<S: CacheStore>(
    config: WorkerConfig,
    store: S,
    fetcher: Arc<FsFetcher>,
    activate: bool,
) -> Result<Installed> {
    let worker = OfflineWorker::new(config, Arc::new(store), fetcher, Arc::new(NoopHost))
        .context("Failed to build worker")?;

    let report = worker.install().await.context("Install failed")?;
    let deleted = if activate {
        worker.activate().await.context("Activation failed")?
    } else {
        Vec::new()
    };

    let registry = worker.registry();
    Ok(Installed {
        report,
        deleted,
        state: worker.state(),
        app_shell: registry.physical_name(PartitionKind::AppShell),
        fonts: registry.physical_name(PartitionKind::Fonts),
    })
}

/// Run the precache command.
pub async fn run(args: PrecacheArgs, ctx: &Context) -> Result<()> {
    let config = ctx.worker_config()?;
    let version = config.cache_version.clone();
    let root = ctx.resolve_path(&args.root);
    if !root.is_dir() {
        bail!("Build directory not found: {}", root.display());
    }

    ctx.output.step(1, 2, &format!("Serving {}", root.display()));
    let fetcher = Arc::new(FsFetcher::new(&root));

    let label = if args.activate {
        "Installing and activating"
    } else {
        "Installing"
    };
    ctx.output.step(2, 2, label);
    let spinner = ctx.output.spinner("Precaching app shell and fonts...");
    let installed = match &args.store {
        Some(dir) => {
            let store = DirCacheStore::new(ctx.resolve_path(dir));
            ctx.output.debug(&format!("Store: {}", store.root().display()));
            install_into(config, store, fetcher.clone(), args.activate).await
        }
        None => install_into(config, InMemoryCacheStore::new(), fetcher.clone(), args.activate).await,
    };
    spinner.finish_and_clear();
    let installed = installed?;

    let report = PrecacheReport {
        version,
        partitions: vec![
            PartitionReport {
                name: installed.app_shell.clone(),
                entries: installed.report.app_shell,
            },
            PartitionReport {
                name: installed.fonts.clone(),
                entries: installed.report.fonts,
            },
        ],
        bytes: fetcher.served_bytes(),
        deleted: installed.deleted,
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.success(&format!(
        "Precached {} entries ({})",
        installed.report.total(),
        format_bytes(report.bytes)
    ));
    for partition in &report.partitions {
        ctx.output.kv(&partition.name, &partition.entries.to_string());
    }
    for name in &report.deleted {
        ctx.output.list_item(&format!("deleted {}", name));
    }
    ctx.output.debug(&format!("Worker state: {}", installed.state));

    Ok(())
}
