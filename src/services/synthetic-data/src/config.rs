use crate::error::{Result, SyntheticDataError};

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub output_dir: PathBuf,
    pub max_records: usize,
    pub max_upload_bytes: usize,
    pub preview_rows: usize,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            output_dir: PathBuf::from("./output"),
            max_records: 10_000,
            max_upload_bytes: 100 * 1024 * 1024,
            preview_rows: 5,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` uses the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        // Load environment-specific defaults
        let (default_host, default_log_level) = match environment.as_str() {
            "production" => ("0.0.0.0", "info"),
            "staging" => ("0.0.0.0", "debug"),
            _ => ("127.0.0.1", "debug"),
        };
        let defaults = Config::default();

        Ok(Config {
            host: lookup("SYNTHETIC_DATA_HOST").unwrap_or_else(|| default_host.to_string()),
            port: parse_or(&lookup, "SYNTHETIC_DATA_PORT", defaults.port)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| default_log_level.to_string()),
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_records: parse_or(&lookup, "MAX_RECORDS", defaults.max_records)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            preview_rows: parse_or(&lookup, "PREVIEW_ROWS", defaults.preview_rows)?,
            seed: match lookup("SYNTHETIC_SEED") {
                Some(raw) => Some(raw.trim().parse().map_err(|e| {
                    SyntheticDataError::Configuration(format!("Invalid SYNTHETIC_SEED: {}", e))
                })?),
                None => None,
            },
            environment,
        })
    }

    /// Reads a YAML (`.yaml`/`.yml`) or JSON configuration file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let extension = path.extension().and_then(|s| s.to_str());
        if extension == Some("yaml") || extension == Some("yml") {
            serde_yaml::from_str(&content).map_err(|e| {
                SyntheticDataError::Configuration(format!("Failed to parse YAML configuration: {}", e))
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                SyntheticDataError::Configuration(format!("Failed to parse JSON configuration: {}", e))
            })
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(SyntheticDataError::Configuration(
                "Host cannot be empty".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(SyntheticDataError::Configuration(format!(
                "Invalid port: {}",
                self.port
            )));
        }

        if self.max_records == 0 {
            return Err(SyntheticDataError::Configuration(
                "max_records must be at least 1".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(SyntheticDataError::Configuration(
                "max_upload_bytes must be at least 1".to_string(),
            ));
        }

        if self.preview_rows == 0 {
            return Err(SyntheticDataError::Configuration(
                "preview_rows must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| SyntheticDataError::Configuration(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_records, 10_000);
        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.seed, None);
        assert!(config.is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_defaults_and_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("ENVIRONMENT", "production"),
            ("SYNTHETIC_DATA_PORT", "9000"),
            ("SYNTHETIC_SEED", "42"),
            ("OUTPUT_DIR", "/tmp/synthetic"),
        ]))
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/synthetic"));
    }

    #[test]
    fn test_invalid_numbers_are_configuration_errors() {
        let err = Config::from_lookup(lookup_from(&[("MAX_RECORDS", "lots")])).unwrap_err();
        assert!(matches!(err, SyntheticDataError::Configuration(ref m) if m.contains("MAX_RECORDS")));

        let err = Config::from_lookup(lookup_from(&[("SYNTHETIC_DATA_PORT", "70000")])).unwrap_err();
        assert!(matches!(err, SyntheticDataError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = Config {
            max_records: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            port: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_and_json_files() {
        let dir = TempDir::new().unwrap();

        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "port: 9100\nmax_records: 50\nseed: 7\n").unwrap();
        let config = Config::load_file(&yaml).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.max_records, 50);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.preview_rows, 5);

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"host": "0.0.0.0", "preview_rows": 10}"#).unwrap();
        let config = Config::load_file(&json).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.preview_rows, 10);

        let broken = dir.path().join("broken.yml");
        std::fs::write(&broken, "port: [").unwrap();
        assert!(matches!(
            Config::load_file(&broken),
            Err(SyntheticDataError::Configuration(_))
        ));
    }
}
