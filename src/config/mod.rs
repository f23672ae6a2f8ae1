use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file (default: <data_dir>/hrdesk.db)
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded photos and documents are written to (default: <data_dir>/uploads)
    pub dir: Option<PathBuf>,
    /// URL prefix under which stored files are published
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Maximum request body size for file-bearing submissions
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            url_prefix: default_url_prefix(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_url_prefix() -> String {
    "/uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Thresholds applied to employee and timesheet submissions
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_min_salary")]
    pub min_salary: f64,
    #[serde(default = "default_min_age")]
    pub min_age: i32,
    /// Reject employees whose end date precedes their start date
    #[serde(default)]
    pub require_end_after_start: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_salary: default_min_salary(),
            min_age: default_min_age(),
            require_end_after_start: false,
        }
    }
}

fn default_min_salary() -> f64 {
    10_000.0
}

fn default_min_age() -> i32 {
    18
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| self.server.data_dir.join("hrdesk.db"))
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.uploads
            .dir
            .clone()
            .unwrap_or_else(|| self.server.data_dir.join("uploads"))
    }
}
