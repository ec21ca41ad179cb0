use crate::constants;
use crate::error::{ParksError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub codes: CodeSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prebuilt dashboard bundle served for any non-API path.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: constants::DEFAULT_PORT,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/parks.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_prefix: "parks.log".to_string(),
            default_filter: "parks_backoffice=info,info".to_string(),
        }
    }
}

/// Limits for the hierarchical code generator.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodeSettings {
    pub max_attempts: usize,
    pub sequence_width: usize,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            max_attempts: constants::MAX_CODE_ATTEMPTS,
            sequence_width: constants::TREE_SEQUENCE_WIDTH,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist, then apply `PARKS_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ParksError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            toml::from_str(&content)?
        } else {
            info!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = env::var("PARKS_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PARKS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ParksError::Config(format!("PARKS_PORT is not a valid port: {port}")))?;
        }
        if let Ok(path) = env::var("PARKS_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("PARKS_LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("PARKS_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.codes.max_attempts == 0 {
            return Err(ParksError::Config(
                "codes.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.codes.sequence_width == 0 {
            return Err(ParksError::Config(
                "codes.sequence_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.codes, CodeSettings::default());
        assert_eq!(config.database.path, PathBuf::from("data/parks.db"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\npath = \"/tmp/x.db\"\n\n[codes]\nmax_attempts = 10"
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.codes.max_attempts, 10);
        assert_eq!(config.codes.sequence_width, constants::TREE_SEQUENCE_WIDTH);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ParksError::Toml(_))));
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[codes]\nmax_attempts = 0").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ParksError::Config(_))));
    }
}
