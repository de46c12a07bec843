//! Client configuration
//!
//! Values are layered, lowest precedence first: built-in defaults, the TOML
//! file under the user's config directory, environment variables (a `.env`
//! file in the working directory is honoured), then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

pub const ENV_API_URL: &str = "ATTENDANCE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "ATTENDANCE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the attendance backend, without a trailing path
    pub api_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// `<config dir>/attendance-cli/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("attendance-cli").join("config.toml"))
    }

    /// Resolve the effective configuration for this process
    pub fn load(overrides: &Overrides) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        config.validate()?;

        debug!("Using backend {} (timeout {}s)", config.api_url, config.timeout_secs);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Apply environment variables through `lookup` so tests need not touch the process env
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().with_context(|| {
                format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, raw
                )
            })?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.api_url {
            self.api_url = url.clone();
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("api_url must start with http:// or https://, got '{}'", self.api_url);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(r#"api_url = "https://attendance.example""#).unwrap();
        assert_eq!(config.api_url, "https://attendance.example");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_env_then_flags_precedence() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://env:5000"),
            (ENV_TIMEOUT_SECS, "5"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_url, "http://env:5000");
        assert_eq!(config.timeout(), Duration::from_secs(5));

        config.apply_overrides(&Overrides {
            api_url: Some("http://flag:8080".into()),
            timeout_secs: None,
        });
        assert_eq!(config.api_url, "http://flag:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_bad_timeout_env_is_reported() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == ENV_TIMEOUT_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let bad_url = Config {
            api_url: "localhost:5000".into(),
            ..Config::default()
        };
        assert!(bad_url.validate().is_err());

        let zero_timeout = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert!(zero_timeout.validate().is_err());
    }
}
