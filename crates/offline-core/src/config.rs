//! Worker configuration: cache version, routing rules and asset manifests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors from loading or validating a [`WorkerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid origin '{0}'")]
    InvalidOrigin(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Freshness windows (in seconds) injected into served `Cache-Control` headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Window for cached copies served after a network failure.
    #[serde(default = "default_short_secs")]
    pub short_secs: u64,
    /// Window for stale-while-revalidate responses.
    #[serde(default = "default_medium_secs")]
    pub medium_secs: u64,
    /// Window for content-addressed (immutable) assets.
    #[serde(default = "default_long_secs")]
    pub long_secs: u64,
}

fn default_short_secs() -> u64 {
    3_600
}

fn default_medium_secs() -> u64 {
    86_400
}

fn default_long_secs() -> u64 {
    31_536_000
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            short_secs: default_short_secs(),
            medium_secs: default_medium_secs(),
            long_secs: default_long_secs(),
        }
    }
}

/// Static configuration of the caching worker.
///
/// Built once at startup and shared read-only; changing any value (in
/// particular `cache_version`) only takes effect through a redeploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Version tag appended to every partition name.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin the worker is hosted on; manifest paths resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path prefix of API traffic (never cached).
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Extension identifying font files.
    #[serde(default = "default_font_extension")]
    pub font_extension: String,

    /// Extensions (without dot) identifying static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Path of the application-shell document used as navigation fallback.
    #[serde(default = "default_shell_document")]
    pub shell_document: String,

    /// Paths precached into the app-shell partition on install.
    #[serde(default = "default_app_shell_assets")]
    pub app_shell_assets: Vec<String>,

    /// Paths precached into the fonts partition on install.
    #[serde(default = "default_font_assets")]
    pub font_assets: Vec<String>,

    /// Theme identifiers accepted by the precache-theme command.
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,

    /// Freshness windows.
    #[serde(default)]
    pub freshness: FreshnessConfig,
}

fn default_cache_version() -> String {
    "v2".to_string()
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_font_extension() -> String {
    ".woff2".to_string()
}

fn default_static_extensions() -> Vec<String> {
    ["wasm", "js", "css", "svg", "png", "jpg", "jpeg", "webp", "ico", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_shell_document() -> String {
    "/index.html".to_string()
}

fn default_app_shell_assets() -> Vec<String> {
    vec!["/".to_string(), "/index.html".to_string()]
}

fn default_font_assets() -> Vec<String> {
    [
        "/public/fonts/inter-latin-400.woff2",
        "/public/fonts/inter-latin-500.woff2",
        "/public/fonts/inter-latin-600.woff2",
        "/public/fonts/inter-latin-700.woff2",
        "/public/fonts/material-symbols.woff2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_themes() -> Vec<String> {
    ["cat", "chicken", "elephant", "octopus"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Whether a config path is read and written as JSON.
pub fn is_json_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            origin: default_origin(),
            api_prefix: default_api_prefix(),
            font_extension: default_font_extension(),
            static_extensions: default_static_extensions(),
            shell_document: default_shell_document(),
            app_shell_assets: default_app_shell_assets(),
            font_assets: default_font_assets(),
            themes: default_themes(),
            freshness: FreshnessConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Load and validate config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read config from a file without validating it. `.json` files are
    /// parsed as JSON, anything else as TOML.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if is_json_path(path) {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Set the cache version tag.
    pub fn with_cache_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = version.into();
        self
    }

    /// Set the hosting origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Replace the app-shell manifest.
    pub fn with_app_shell_assets(mut self, assets: Vec<&str>) -> Self {
        self.app_shell_assets = assets.into_iter().map(String::from).collect();
        self
    }

    /// Replace the font manifest.
    pub fn with_font_assets(mut self, assets: Vec<&str>) -> Self {
        self.font_assets = assets.into_iter().map(String::from).collect();
        self
    }

    /// The hosting origin as a URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|_| ConfigError::InvalidOrigin(self.origin.clone()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::InvalidOrigin(self.origin.clone()));
        }
        Ok(url)
    }

    /// Whether `theme` is in the theme allow-list.
    pub fn is_known_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }

    /// Check the configuration for values the worker cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(ConfigError::Invalid("cache_version must not be empty".into()));
        }
        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "api_prefix must start with '/': {}",
                self.api_prefix
            )));
        }
        if !self.font_extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "font_extension must start with '.': {}",
                self.font_extension
            )));
        }
        if self.static_extensions.is_empty() {
            return Err(ConfigError::Invalid("static_extensions must not be empty".into()));
        }
        if let Some(ext) = self
            .static_extensions
            .iter()
            .find(|e| e.is_empty() || !e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(ConfigError::Invalid(format!("invalid static extension '{}'", ext)));
        }
        if !self.app_shell_assets.contains(&self.shell_document) {
            return Err(ConfigError::Invalid(format!(
                "shell_document {} is not listed in app_shell_assets",
                self.shell_document
            )));
        }
        self.origin_url()?;
        Ok(())
    }
}
