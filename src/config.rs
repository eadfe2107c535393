use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::SESSIONS_KEY;

/// Project-level config directory, relative to the working directory
const PROJECT_DIR: &str = ".kickcount";

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Where the session log lives
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding `<key>.json`; defaults to ~/.kickcount
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    SESSIONS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key: default_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimerConfig {
    /// Wall-clock length of one timer second, in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 {
    1_000
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

/// Recording-screen activity journal
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct JournalConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Defaults to `<data_dir>/journal`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Sparse overlay read from a config file; only fields present override
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigLayer {
    #[serde(default)]
    storage: StorageLayer,
    #[serde(default)]
    timer: TimerLayer,
    #[serde(default)]
    journal: JournalLayer,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct StorageLayer {
    data_dir: Option<PathBuf>,
    key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct TimerLayer {
    tick_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct JournalLayer {
    enabled: Option<bool>,
    dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.kickcount/config.local.toml) > project (.kickcount/config.toml)
    /// > user (~/.kickcount/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(PROJECT_DIR).join("config.toml");
            if user_config.exists() {
                config.merge(Self::read_layer(&user_config)?);
            }
        }

        let project_config = Path::new(PROJECT_DIR).join("config.toml");
        if project_config.exists() {
            config.merge(Self::read_layer(&project_config)?);
        }

        // Should be gitignored
        let local_config = Path::new(PROJECT_DIR).join("config.local.toml");
        if local_config.exists() {
            config.merge(Self::read_layer(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path, on top of the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge(Self::read_layer(path)?);
        Ok(config)
    }

    fn read_layer(path: &Path) -> Result<ConfigLayer> {
        let content = std::fs::read_to_string(path)?;
        let layer: ConfigLayer = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        tracing::debug!(path = %path.display(), "loaded config layer");
        Ok(layer)
    }

    /// Apply a layer on top of this config; fields the layer sets win
    fn merge(&mut self, other: ConfigLayer) {
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if let Some(key) = other.storage.key {
            self.storage.key = key;
        }
        if let Some(tick_ms) = other.timer.tick_ms {
            self.timer.tick_ms = tick_ms;
        }
        if let Some(enabled) = other.journal.enabled {
            self.journal.enabled = enabled;
        }
        if other.journal.dir.is_some() {
            self.journal.dir = other.journal.dir;
        }
    }

    /// Directory holding the session log
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(PROJECT_DIR)
        })
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.journal
            .dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("journal"))
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        // The key is used verbatim as a file name
        let key = self.storage.key.as_str();
        if key.trim().is_empty() {
            errors.push(ValidationError {
                field: "storage.key".to_string(),
                message: "Must not be empty".to_string(),
            });
        } else if key.trim() != key {
            errors.push(ValidationError {
                field: "storage.key".to_string(),
                message: format!("Invalid key '{}', must not start or end with whitespace", key),
            });
        } else if key.contains(['/', '\\']) || key.starts_with('.') {
            errors.push(ValidationError {
                field: "storage.key".to_string(),
                message: format!("Invalid key '{}', must be a plain file name", key),
            });
        }

        if self.timer.tick_ms == 0 {
            errors.push(ValidationError {
                field: "timer.tick_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.key, "sessions");
        assert_eq!(config.timer.tick_ms, 1000);
        assert!(!config.journal.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[storage]
data_dir = "/tmp/kicks"

[journal]
enabled = true
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/kicks"));
        assert_eq!(config.storage.key, "sessions");
        assert_eq!(config.timer.tick_ms, 1000);
        assert!(config.journal.enabled);
        assert_eq!(config.journal_dir(), PathBuf::from("/tmp/kicks/journal"));
    }

    #[test]
    fn test_later_layer_wins_only_where_set() {
        let mut config = Config::default();
        config.merge(
            toml::from_str(
                r#"
[storage]
key = "dfm"
[timer]
tick_ms = 250
"#,
            )
            .unwrap(),
        );
        config.merge(toml::from_str("[timer]\ntick_ms = 500\n").unwrap());

        assert_eq!(config.storage.key, "dfm");
        assert_eq!(config.timer.tick_ms, 500);
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[timer\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_validate_empty_key() {
        let mut config = Config::default();
        config.storage.key = "  ".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field.contains("storage.key"));
    }

    #[test]
    fn test_validate_key_with_surrounding_whitespace() {
        for key in [" sessions", "sessions ", "sessions\n"] {
            let mut config = Config::default();
            config.storage.key = key.to_string();
            let errors = config.validate().unwrap_err();
            assert_eq!(errors.len(), 1, "key {:?}", key);
            assert!(errors[0].field.contains("storage.key"));
            assert!(errors[0].message.contains("whitespace"));
        }
    }

    #[test]
    fn test_validate_path_like_key() {
        let mut config = Config::default();
        config.storage.key = "../sessions".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("plain file name"));
    }

    #[test]
    fn test_validate_zero_tick() {
        let mut config = Config::default();
        config.timer.tick_ms = 0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].field.contains("tick_ms"));
        assert_eq!(format!("{}", errors[0]), "[timer.tick_ms]: Must be greater than 0");
    }
}
