use serde::Deserialize;
use std::path::{Path, PathBuf};

use contracts::usecases::u500_aggregate_ad_stats::DEFAULT_ROLLBACK_DAYS;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory with the built frontend (index.html, wasm bundle)
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: "dist".to_string(),
        }
    }
}

/// Scheduled rebuild of `ad_stats_daily` from `request_log`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AggregationConfig {
    pub enabled: bool,
    /// Cron expression with seconds: "sec min hour dom month dow"
    pub schedule: String,
    pub rollback_days: u32,
    pub check_interval_seconds: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: "0 30 1 * * *".to_string(),
            rollback_days: DEFAULT_ROLLBACK_DAYS,
            check_interval_seconds: 60,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/ad_stats.db"

[server]
port = 3000
static_dir = "dist"

[aggregation]
enabled = true
schedule = "0 30 1 * * *"
rollback_days = 7
check_interval_seconds = 60
"#;

/// Load configuration from config.toml
///
/// Search order:
/// 1. Next to the executable (copied there by build.rs)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Some(exe_dir) = exe_dir() {
        let config_path = exe_dir.join("config.toml");

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            let contents = std::fs::read_to_string(&config_path)?;
            return parse_config(&contents);
        }
        tracing::warn!("config.toml not found at: {}", config_path.display());
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.aggregation.rollback_days == 0 {
        anyhow::bail!("aggregation.rollback_days must be at least 1");
    }
    Ok(config)
}

/// Database file path; relative paths resolve against the executable directory
pub fn get_database_path(config: &Config) -> PathBuf {
    resolve_path(&config.database.path)
}

/// Static files directory; relative paths resolve against the working directory
pub fn get_static_dir(config: &Config) -> PathBuf {
    PathBuf::from(&config.server.static_dir)
}

fn resolve_path(path_str: &str) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match exe_dir() {
        Some(dir) => dir.join(path),
        None => PathBuf::from(path_str),
    }
}

fn exe_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/ad_stats.db");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.aggregation.rollback_days, 7);
        assert!(config.aggregation.enabled);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("[database]\npath = \"/tmp/x.db\"\n").unwrap();
        assert_eq!(config.server.static_dir, "dist");
        assert_eq!(config.aggregation.schedule, "0 30 1 * * *");
        assert_eq!(get_database_path(&config), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_zero_rollback_rejected() {
        let raw = "[database]\npath = \"a.db\"\n[aggregation]\nrollback_days = 0\n";
        assert!(parse_config(raw).is_err());
    }
}
