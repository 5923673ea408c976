//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. Explicit overrides (typically CLI arguments)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub service: Service,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "trellis.db".to_string()
}

/// Service-wide policy switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Upper bound for a single page of list results.
    #[serde(default = "default_max_items_per_page")]
    pub max_items_per_page: u32,

    /// Whether link shares may be issued and presented.
    #[serde(default = "default_enable_link_sharing")]
    pub enable_link_sharing: bool,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            max_items_per_page: default_max_items_per_page(),
            enable_link_sharing: default_enable_link_sharing(),
        }
    }
}

fn default_max_items_per_page() -> u32 {
    50
}

fn default_enable_link_sharing() -> bool {
    true
}

/// Explicit overrides applied after file and environment layers.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub database_url: Option<&'a str>,
    pub max_items_per_page: Option<u32>,
    pub enable_link_sharing: Option<bool>,
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct Loader {
    /// Environment variable prefix (e.g., "MYAPP" -> MYAPP_MAX_ITEMS_PER_PAGE)
    pub env_prefix: String,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            env_prefix: "TRELLIS".to_string(),
        }
    }
}

impl Loader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
        }
    }

    /// Load configuration from file, environment, and explicit overrides.
    pub fn load(&self, config_path: Option<&Path>, overrides: Overrides<'_>) -> crate::Result<Config> {
        // Start with file config or defaults
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        let prefix = &self.env_prefix;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(value) = std::env::var(format!("{prefix}_MAX_ITEMS_PER_PAGE")) {
            config.service.max_items_per_page = value.parse().map_err(|e| {
                Error::Config(format!("{prefix}_MAX_ITEMS_PER_PAGE is not a number: {e}"))
            })?;
        }
        if let Ok(value) = std::env::var(format!("{prefix}_ENABLE_LINK_SHARING")) {
            config.service.enable_link_sharing = parse_flag(&value).ok_or_else(|| {
                Error::Config(format!("{prefix}_ENABLE_LINK_SHARING must be true or false"))
            })?;
        }

        if let Some(url) = overrides.database_url {
            config.database.url = url.to_string();
        }
        if let Some(max) = overrides.max_items_per_page {
            config.service.max_items_per_page = max;
        }
        if let Some(enabled) = overrides.enable_link_sharing {
            config.service.enable_link_sharing = enabled;
        }

        if config.service.max_items_per_page == 0 {
            return Err(Error::Config(
                "max_items_per_page must be greater than zero".to_string(),
            ));
        }
        if config.database.url.is_empty() {
            return Err(Error::Config("database url must not be empty".to_string()));
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
