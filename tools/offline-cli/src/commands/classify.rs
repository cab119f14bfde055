//! Show which strategy serves a request.

use anyhow::{Context as _, Result};
use offline_cache::PartitionRegistry;
use offline_core::{Method, RequestDescriptor, RequestMode, Url, WorkerConfig};
use offline_strategy::{RequestClassifier, StrategyClass};
use serde::Serialize;

use super::ClassifyArgs;
use crate::context::Context;
use crate::output::strategy_badge;

/// Classification of one request.
#[derive(Debug, Serialize)]
pub struct Classification {
    pub url: String,
    pub intercepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

impl Classification {
    fn new(request: &RequestDescriptor, class: Option<StrategyClass>, config: &WorkerConfig) -> Self {
        let registry = PartitionRegistry::new(config.cache_version.clone());
        let partition = class
            .and_then(|c| c.partition())
            .map(|kind| registry.physical_name(kind));
        let max_age = class
            .and_then(|c| c.freshness())
            .map(|window| window.max_age_secs(&config.freshness));
        Self {
            url: request.url().to_string(),
            intercepted: class.is_some(),
            strategy: class.map(|c| c.name().to_string()),
            partition,
            max_age,
        }
    }
}

/// Run the classify command.
pub async fn run(args: ClassifyArgs, ctx: &Context) -> Result<()> {
    let config = ctx.worker_config()?;
    let classifier = RequestClassifier::new(&config)?;
    let origin = config.origin_url()?;

    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;
    let mode = if args.navigate {
        RequestMode::Navigate
    } else {
        RequestMode::Other
    };

    let mut results = Vec::with_capacity(args.urls.len());
    for raw in &args.urls {
        let url = parse_target(&origin, raw)?;
        let request = RequestDescriptor::new(method.clone(), url, mode);
        let class = classifier.classify(&request);
        tracing::debug!(url = %request.url(), ?class, "classified");
        results.push(Classification::new(&request, class, &config));
    }

    if ctx.output.is_json() {
        ctx.output.json(&results);
        return Ok(());
    }

    ctx.output.header("Classification");
    let width = results.iter().map(|r| r.url.len()).max().unwrap_or(0);
    for result in &results {
        match &result.strategy {
            Some(strategy) => {
                let partition = result.partition.as_deref().unwrap_or("-");
                let max_age = result
                    .max_age
                    .map(|secs| format!("max-age={}", secs))
                    .unwrap_or_else(|| "-".to_string());
                ctx.output.table_row(
                    &[
                        result.url.as_str(),
                        strategy_badge(strategy).as_str(),
                        partition,
                        max_age.as_str(),
                    ],
                    &[width, 26, 20, 16],
                );
            }
            None => ctx
                .output
                .table_row(&[result.url.as_str(), "not intercepted"], &[width, 26]),
        }
    }

    Ok(())
}

/// Parse an absolute URL, or resolve a path against `origin`.
fn parse_target(origin: &Url, raw: &str) -> Result<Url> {
    if raw.starts_with('/') {
        origin
            .join(raw)
            .with_context(|| format!("Invalid path: {}", raw))
    } else {
        Url::parse(raw).with_context(|| format!("Invalid URL: {}", raw))
    }
}
