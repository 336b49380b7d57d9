use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DATABASE_PATH_ENV: &str = "EVERLETTER_DATABASE_PATH";
pub const AVATAR_BASE_URL_ENV: &str = "EVERLETTER_AVATAR_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// SQLite file. Falls back to `~/.everletter/data/everletter.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    pub avatars: AvatarConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Applies `EVERLETTER_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Applies overrides from any variable source. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(url) = lookup(AVATAR_BASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.avatars.public_base_url = url;
        }
    }

    /// The configured database path, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Root of the object store; avatars land in `<directory>/avatars/`.
    pub directory: PathBuf,
    /// Public URL prefix under which `avatars/<file>` is served.
    pub public_base_url: String,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// User searches shorter than this return nothing.
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_min_query_length() -> usize {
    2
}

fn default_limit() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_length: default_min_query_length(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `info` or `everletter=debug`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
