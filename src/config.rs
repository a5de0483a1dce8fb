use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variables recognized as the store URL, checked in order.
/// Absence of all of them (and of `[store].url`) is the signal used by
/// the API layer to degrade store-backed endpoints to 503.
pub const STORE_URL_ENV_ALIASES: &[&str] = &["SRD_DB_URL", "SRD_DATABASE_URL", "DATABASE_URL"];

/// Default store URL used by the ingest CLI when nothing is configured.
pub const DEFAULT_STORE_URL: &str = "sqlite:data/srd.sqlite";

/// Fallback database file when a configured URL carries no path
/// (e.g. a bare `sqlite:`).
pub const FALLBACK_DB_PATH: &str = "data/srd.sqlite";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// Explicit store URL. When absent, the environment aliases are
    /// consulted at load time; see [`Config::load`].
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_class_schema")]
    pub class_schema: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            class_schema: default_class_schema(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/srd/classes")
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}
fn default_class_schema() -> PathBuf {
    PathBuf::from("schemas/srd-class-5e-2014.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Load configuration from a TOML file and resolve the store URL
    /// once, here, from `[store].url` or the recognized environment
    /// aliases. Deep call paths never re-read the environment.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;

        if config.store.url.is_none() {
            config.store.url = store_url_from_env();
        }

        if config.server.bind.is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }

        Ok(config)
    }

    /// Configuration with built-in defaults, used when no config file
    /// exists. Store URL still resolves from the environment aliases.
    pub fn minimal() -> Config {
        Config {
            store: StoreConfig {
                url: store_url_from_env(),
            },
            paths: PathsConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// The store URL the ingest pipeline connects to: configured value
    /// or the fixed local default.
    pub fn ingest_store_url(&self) -> String {
        self.store
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string())
    }
}

fn store_url_from_env() -> Option<String> {
    for key in STORE_URL_ENV_ALIASES {
        if let Ok(val) = std::env::var(key) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}
