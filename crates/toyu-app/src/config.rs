//! Configuration management for toyu-ledger
//!
//! Config stored at: ~/.config/toyu-ledger/config.json

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toyu_store::DATABASE_FILE;
use toyu_types::{ConfigError, ExportEncoding, OutputFormat, Result};

const APP_DIR: &str = "toyu-ledger";

/// Longest retention window accepted, about ten years
pub const MAX_RETENTION_DAYS: u32 = 3650;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database file override
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Days an exported record is kept before the startup sweep deletes it
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Where sales CSV files are written
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Where backups are written
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Encoding of the sales CSV (utf8, cp932)
    #[serde(default)]
    pub export_encoding: ExportEncoding,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// How long to wait for another session's lock, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_retention_days() -> u32 {
    30
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_busy_timeout_ms() -> u64 {
    2000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            retention_days: default_retention_days(),
            export_dir: None,
            backup_dir: None,
            export_encoding: ExportEncoding::default(),
            output_format: default_output_format(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Database file, under the user data directory unless overridden
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.database_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(data_dir.join(DATABASE_FILE))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn set_retention_days(&mut self, days: u32) -> Result<()> {
        if days == 0 || days > MAX_RETENTION_DAYS {
            return Err(ConfigError::InvalidValue(format!(
                "retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, days
            ))
            .into());
        }
        self.retention_days = days;
        Ok(())
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let mut config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
            let days = config.retention_days;
            config.set_retention_days(days)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Toyu Ledger Configuration")?;
        writeln!(f, "=========================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Database:        {}",
            self.database_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Retention days:  {}", self.retention_days)?;
        writeln!(f, "Export dir:      {}", self.export_dir().display())?;
        writeln!(f, "Backup dir:      {}", self.backup_dir().display())?;
        writeln!(f, "Export encoding: {}", self.export_encoding)?;
        writeln!(f, "Output format:   {}", self.output_format)?;
        writeln!(f, "Busy timeout:    {} ms", self.busy_timeout_ms)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:     {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use toyu_types::Error;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.busy_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"retention_days": 45, "export_encoding": "cp932"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.retention_days, 45);
        assert_eq!(config.export_encoding, ExportEncoding::Cp932);
        assert_eq!(config.output_format, OutputFormat::Table);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.database_path = Some(dir.path().join("ledger.db"));
        config.set_retention_days(60).unwrap();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_broken_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_out_of_range_retention_in_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"retention_days": 0}"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::InvalidValue(_)))
        ));
    }

    #[test]
    fn test_retention_bounds() {
        let mut config = Config::default();
        assert!(config.set_retention_days(0).is_err());
        assert!(config.set_retention_days(MAX_RETENTION_DAYS + 1).is_err());
        assert_eq!(config.retention_days, 30);
    }
}
