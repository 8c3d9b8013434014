//! Configuration management

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Key lifecycle policy.
///
/// Missing fields fall back to their defaults:
///
/// ```toml
/// grace_period_secs = 604800
/// max_chain_length = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// How long a rotated-out key keeps decrypting in-flight messages.
    pub grace_period_secs: u64,
    /// Maximum rotation records kept per identity.
    pub max_chain_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: 7 * 24 * 3600, // one week
            max_chain_length: 1024,
        }
    }
}

impl SecurityConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_period_secs == 0 {
            return Err(ConfigError::Invalid("grace_period_secs must be > 0".to_string()));
        }

        if self.max_chain_length == 0 {
            return Err(ConfigError::Invalid("max_chain_length must be > 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SecurityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grace_period_secs, 604_800);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SecurityConfig::from_toml_str("grace_period_secs = 60").unwrap();
        assert_eq!(config.grace_period_secs, 60);
        assert_eq!(config.max_chain_length, 1024);

        let empty = SecurityConfig::from_toml_str("").unwrap();
        assert_eq!(empty, SecurityConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SecurityConfig::from_toml_str("grace_period_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SecurityConfig::from_toml_str("max_chain_length = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SecurityConfig::from_toml_str("grace_period_secs = \"soon\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "grace_period_secs = 3600\nmax_chain_length = 8").unwrap();

        let config = SecurityConfig::load(file.path()).unwrap();
        assert_eq!(config.grace_period_secs, 3600);
        assert_eq!(config.max_chain_length, 8);

        assert!(matches!(
            SecurityConfig::load("/nonexistent/murmur.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
