//! Server configuration.
//!
//! Loaded once at process start from a TOML file. Every setting carries a
//! serde default so a partial (or missing) file yields a usable
//! configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level Sift configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiftConfig {
    #[serde(default)]
    pub jobs: JobsSettings,
}

impl SiftConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        let config: SiftConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jobs.expire_after_hours <= 0 {
            return Err(anyhow::anyhow!(
                "jobs.expire_after_hours must be positive, got {}",
                self.jobs.expire_after_hours
            ));
        }

        Ok(())
    }
}

/// Job management settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsSettings {
    /// Hours until a non-terminal job is reported as expired (default: 12)
    #[serde(default = "default_jobs_expire_after_hours")]
    pub expire_after_hours: i64,
}

impl JobsSettings {
    /// Expiration TTL in milliseconds.
    pub fn expire_after_ms(&self) -> i64 {
        self.expire_after_hours * 60 * 60 * 1000
    }
}

impl Default for JobsSettings {
    fn default() -> Self {
        Self {
            expire_after_hours: default_jobs_expire_after_hours(),
        }
    }
}

fn default_jobs_expire_after_hours() -> i64 {
    12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiftConfig::default();
        assert_eq!(config.jobs.expire_after_hours, 12);
        assert_eq!(config.jobs.expire_after_ms(), 12 * 60 * 60 * 1000);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: SiftConfig = toml::from_str("").unwrap();
        assert_eq!(config.jobs.expire_after_hours, 12);

        let config: SiftConfig = toml::from_str("[jobs]\nexpire_after_hours = 2\n").unwrap();
        assert_eq!(config.jobs.expire_after_hours, 2);
    }

    #[test]
    fn test_validate_rejects_non_positive_ttl() {
        let config: SiftConfig = toml::from_str("[jobs]\nexpire_after_hours = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
