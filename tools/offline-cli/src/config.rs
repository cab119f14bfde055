//! Config file handling.

use std::path::Path;

use anyhow::{Context, Result};
use offline_core::{is_json_path, WorkerConfig};

/// File names searched for, in order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["offline.toml", ".offline.toml", "offline.json"];

/// Read a config file without validating it.
pub fn read_config(path: &Path) -> Result<WorkerConfig> {
    WorkerConfig::read(path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))
}

/// Write a config file, TOML or JSON by extension.
pub fn save_config(config: &WorkerConfig, path: &Path) -> Result<()> {
    let content = if is_json_path(path) {
        serde_json::to_string_pretty(config)?
    } else {
        toml::to_string_pretty(config)?
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Generate a default offline.toml.
pub fn generate_default_config(origin: &str) -> String {
    format!(
        r#"# Offline caching worker configuration

# Bump to invalidate every cached partition on the next activation.
cache_version = "v2"
origin = "{origin}"

api_prefix = "/api/"
font_extension = ".woff2"
static_extensions = ["wasm", "js", "css", "svg", "png", "jpg", "jpeg", "webp", "ico", "json"]

shell_document = "/index.html"
app_shell_assets = ["/", "/index.html"]
font_assets = [
    "/public/fonts/inter-latin-400.woff2",
    "/public/fonts/inter-latin-500.woff2",
    "/public/fonts/inter-latin-600.woff2",
    "/public/fonts/inter-latin-700.woff2",
    "/public/fonts/material-symbols.woff2",
]

themes = ["cat", "chicken", "elephant", "octopus"]

[freshness]
short_secs = 3600
medium_secs = 86400
long_secs = 31536000
"#,
        origin = origin
    )
}
