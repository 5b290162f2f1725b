//! Configuration loading for docsearch.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/docsearch/config.toml`
//! (platform equivalent via `directories`).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::TypesError;

/// Main application settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Engine base URLs, used round-robin
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Index used when a call passes an empty index name
    #[serde(default = "default_index")]
    pub default_index: String,

    /// Basic auth user
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password (wrapped in a secret once the transport is built)
    #[serde(default)]
    pub password: Option<String>,

    /// Ask the engine for uncompressed responses
    #[serde(default = "default_disable_compression")]
    pub disable_compression: bool,

    /// Search timeout sent to the engine and applied to each request (ms)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Connect timeout (ms)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Transport-level retries on gateway errors and connection failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Request exact hit totals
    #[serde(default = "default_track_total_hits")]
    pub track_total_hits: bool,

    /// Path to the index mapping schema
    #[serde(default = "default_mapping_path")]
    pub mapping_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_index() -> String {
    "my-simple-index".to_string()
}

fn default_disable_compression() -> bool {
    true
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_track_total_hits() -> bool {
    true
}

fn default_mapping_path() -> String {
    "mapping.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            default_index: default_index(),
            username: None,
            password: None,
            disable_compression: default_disable_compression(),
            query_timeout_ms: default_query_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_retries: default_max_retries(),
            track_total_hits: default_track_total_hits(),
            mapping_path: default_mapping_path(),
            log_level: default_log_level(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("hosts", &self.hosts)
            .field("default_index", &self.default_index)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("disable_compression", &self.disable_compression)
            .field("query_timeout_ms", &self.query_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("track_total_hits", &self.track_total_hits)
            .field("mapping_path", &self.mapping_path)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docsearch/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (DOCSEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", "docsearch")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("hosts", default_hosts())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("default_index", default_index())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("query_timeout_ms", default_query_timeout_ms() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // DOCSEARCH_DEFAULT_INDEX, DOCSEARCH_HOSTS=http://a:9200,http://b:9200, ...
        builder = builder.add_source(
            Environment::with_prefix("DOCSEARCH")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("hosts")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.hosts.is_empty() {
            return Err(TypesError::Config("hosts must not be empty".to_string()));
        }
        if self.default_index.trim().is_empty() {
            return Err(TypesError::Config(
                "default_index must not be empty".to_string(),
            ));
        }
        if self.query_timeout_ms == 0 {
            return Err(TypesError::Config("query_timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Engine search timeout.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// TCP/TLS connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.hosts, vec!["http://localhost:9200".to_string()]);
        assert_eq!(settings.default_index, "my-simple-index");
        assert_eq!(settings.query_timeout(), Duration::from_secs(30));
        assert!(settings.track_total_hits);
        assert!(settings.disable_compression);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
hosts = ["http://search-1:9200", "http://search-2:9200"]
default_index = "users"
query_timeout_ms = 5000
max_retries = 0
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.hosts.len(), 2);
        assert_eq!(settings.default_index, "users");
        assert_eq!(settings.query_timeout_ms, 5000);
        assert_eq!(settings.max_retries, 0);
        assert_eq!(settings.mapping_path, "mapping.json");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = Settings::load(Some("/nonexistent/docsearch-config.toml"));
        assert!(matches!(result, Err(TypesError::Config(_))));
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.hosts.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.default_index = " ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.query_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = Settings {
            password: Some("hunter2".to_string()),
            ..Settings::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
