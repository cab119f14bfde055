//! Show which partitions activation would delete.

use anyhow::Result;
use offline_cache::PartitionRegistry;
use serde::Serialize;

use super::ReconcileArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct ReconcilePlan {
    version: String,
    keep: Vec<String>,
    delete: Vec<String>,
}

fn plan(registry: &PartitionRegistry, existing: &[String]) -> ReconcilePlan {
    let delete = registry.reconcile(existing.iter().cloned());
    let keep = existing
        .iter()
        .filter(|name| !delete.contains(*name))
        .cloned()
        .collect();
    ReconcilePlan {
        version: registry.version().to_string(),
        keep,
        delete: delete.into_iter().collect(),
    }
}

/// Run the reconcile command.
pub async fn run(args: ReconcileArgs, ctx: &Context) -> Result<()> {
    let version = match args.version {
        Some(version) => version,
        None => ctx.worker_config()?.cache_version,
    };
    let registry = PartitionRegistry::new(version);
    let plan = plan(&registry, &args.existing);

    if ctx.output.is_json() {
        ctx.output.json(&plan);
        return Ok(());
    }

    ctx.output.header(&format!("Reconcile against {}", plan.version));
    for name in &plan.keep {
        ctx.output.list_item(&format!("keep    {}", name));
    }
    for name in &plan.delete {
        ctx.output.list_item(&format!("delete  {}", name));
    }

    if plan.delete.is_empty() {
        ctx.output.success("Nothing to delete");
    } else {
        ctx.output
            .info(&format!("{} partition(s) would be deleted", plan.delete.len()));
    }

    Ok(())
}
