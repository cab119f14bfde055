//! Configuration management commands.

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init {
            path,
            origin,
            force,
        } => init_config(&path, &origin, force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;
    ctx.output.kv("cache_version", &config.cache_version);
    ctx.output.kv("origin", &config.origin);
    ctx.output.kv("api_prefix", &config.api_prefix);
    ctx.output.kv("font_extension", &config.font_extension);
    ctx.output.kv("static_extensions", &config.static_extensions.join(", "));
    ctx.output.kv("shell_document", &config.shell_document);
    ctx.output.kv("themes", &config.themes.join(", "));

    ctx.output.info("App shell assets:");
    for asset in &config.app_shell_assets {
        ctx.output.list_item(asset);
    }
    ctx.output.info("Font assets:");
    for asset in &config.font_assets {
        ctx.output.list_item(asset);
    }

    ctx.output.info("[freshness]");
    ctx.output.kv("short_secs", &config.freshness.short_secs.to_string());
    ctx.output.kv("medium_secs", &config.freshness.medium_secs.to_string());
    ctx.output.kv("long_secs", &config.freshness.long_secs.to_string());

    Ok(())
}

async fn init_config(path: &str, origin: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.resolve_path(path);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    if config_path.extension().is_some_and(|ext| ext == "json") {
        let config = offline_core::WorkerConfig::default().with_origin(origin);
        crate::config::save_config(&config, &config_path)?;
    } else {
        std::fs::write(&config_path, generate_default_config(origin))?;
    }

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut warnings: Vec<String> = Vec::new();
    let config = ctx.worker_config()?;

    if config.app_shell_assets.is_empty() {
        warnings.push("app_shell_assets is empty; navigations have no offline fallback".to_string());
    }
    if config.font_assets.is_empty() {
        warnings.push("font_assets is empty; no fonts are precached".to_string());
    }
    if let Err(e) = offline_strategy::RequestClassifier::new(&config) {
        bail!("Invalid classifier rules: {}", e);
    }
    if config.freshness.short_secs > config.freshness.medium_secs
        || config.freshness.medium_secs > config.freshness.long_secs
    {
        warnings.push("freshness windows are not ordered short <= medium <= long".to_string());
    }

    if warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }
    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
