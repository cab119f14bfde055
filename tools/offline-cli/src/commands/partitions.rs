//! List the partitions of a cache version.

use anyhow::{bail, Result};
use offline_cache::{PartitionKind, PartitionRegistry};
use serde::Serialize;

use super::PartitionsArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct PartitionRow {
    logical_name: &'static str,
    physical_name: String,
}

/// Run the partitions command.
pub async fn run(args: PartitionsArgs, ctx: &Context) -> Result<()> {
    let version = match args.version {
        Some(version) if version.trim().is_empty() => bail!("Version must not be empty"),
        Some(version) => version,
        None => ctx.worker_config()?.cache_version,
    };
    let registry = PartitionRegistry::new(version);

    let rows: Vec<PartitionRow> = PartitionKind::ALL
        .iter()
        .map(|kind| PartitionRow {
            logical_name: kind.logical_name(),
            physical_name: registry.physical_name(*kind),
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&rows);
        return Ok(());
    }

    ctx.output.header(&format!("Partitions ({})", registry.version()));
    for row in &rows {
        ctx.output.kv(row.logical_name, &row.physical_name);
    }

    Ok(())
}
