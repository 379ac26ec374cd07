//! Configuration module for vetagenda.

use serde::Deserialize;
use std::path::Path;

use crate::auth::credential::{DEFAULT_ITERATIONS, MIN_ITERATIONS};
use crate::auth::validation::MIN_PASSWORD_LENGTH;
use crate::{AgendaError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/vetagenda.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Console only when unset.
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<String> {
    Some("logs/vetagenda.log".to_string())
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// PBKDF2 iteration count for newly derived hashes.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
    /// Accept unsalted SHA-256 hashes from older installations.
    #[serde(default = "default_true")]
    pub allow_legacy_hashes: bool,
    /// Minimum length for new passwords.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// Lifetime of a password-recovery token in minutes.
    #[serde(default = "default_recovery_token_ttl")]
    pub recovery_token_ttl_minutes: i64,
    /// Re-hash legacy or weaker hashes on successful login.
    #[serde(default = "default_true")]
    pub upgrade_on_login: bool,
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_true() -> bool {
    true
}

fn default_min_password_length() -> usize {
    MIN_PASSWORD_LENGTH
}

fn default_recovery_token_ttl() -> i64 {
    30
}

/// Longest accepted recovery token lifetime: one week.
pub const MAX_RECOVERY_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: default_pbkdf2_iterations(),
            allow_legacy_hashes: true,
            min_password_length: default_min_password_length(),
            recovery_token_ttl_minutes: default_recovery_token_ttl(),
            upgrade_on_login: true,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AgendaError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AgendaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `VETAGENDA_DATABASE_PATH`: Override the database file path
    /// - `VETAGENDA_LOG_LEVEL`: Override the log level
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("VETAGENDA_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(level) = std::env::var("VETAGENDA_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The PBKDF2 iteration count is below the accepted minimum
    /// - The minimum password length is zero
    /// - The recovery token lifetime is not positive or exceeds one week
    pub fn validate(&self) -> Result<()> {
        if self.auth.pbkdf2_iterations < MIN_ITERATIONS {
            return Err(AgendaError::Config(format!(
                "auth.pbkdf2_iterations must be at least {MIN_ITERATIONS}"
            )));
        }
        if self.auth.min_password_length == 0 {
            return Err(AgendaError::Config(
                "auth.min_password_length must be at least 1".to_string(),
            ));
        }
        if self.auth.recovery_token_ttl_minutes <= 0 {
            return Err(AgendaError::Config(
                "auth.recovery_token_ttl_minutes must be positive".to_string(),
            ));
        }
        if self.auth.recovery_token_ttl_minutes > MAX_RECOVERY_TOKEN_TTL_MINUTES {
            return Err(AgendaError::Config(format!(
                "auth.recovery_token_ttl_minutes must be at most {MAX_RECOVERY_TOKEN_TTL_MINUTES}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.path, "data/vetagenda.db");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file.as_deref(), Some("logs/vetagenda.log"));

        assert_eq!(config.auth.pbkdf2_iterations, 600_000);
        assert!(config.auth.allow_legacy_hashes);
        assert_eq!(config.auth.min_password_length, 8);
        assert_eq!(config.auth.recovery_token_ttl_minutes, 30);
        assert!(config.auth.upgrade_on_login);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
path = "custom/agenda.sqlite"

[logging]
level = "debug"
file = "custom/agenda.log"

[auth]
pbkdf2_iterations = 200000
allow_legacy_hashes = false
min_password_length = 12
recovery_token_ttl_minutes = 15
upgrade_on_login = false
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.database.path, "custom/agenda.sqlite");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("custom/agenda.log"));
        assert_eq!(config.auth.pbkdf2_iterations, 200_000);
        assert!(!config.auth.allow_legacy_hashes);
        assert_eq!(config.auth.min_password_length, 12);
        assert_eq!(config.auth.recovery_token_ttl_minutes, 15);
        assert!(!config.auth.upgrade_on_login);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[auth]
allow_legacy_hashes = false
"#;

        let config = Config::parse(toml).unwrap();

        assert!(!config.auth.allow_legacy_hashes);
        assert_eq!(config.auth.pbkdf2_iterations, 600_000);
        assert_eq!(config.database.path, "data/vetagenda.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        // All defaults
        assert_eq!(config.database.path, "data/vetagenda.db");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        if let Err(AgendaError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(AgendaError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\npath = \"from-file.db\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.database.path, "from-file.db");
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_path = std::env::var("VETAGENDA_DATABASE_PATH").ok();
        let original_level = std::env::var("VETAGENDA_LOG_LEVEL").ok();

        std::env::set_var("VETAGENDA_DATABASE_PATH", "env/agenda.db");
        // Empty values are ignored
        std::env::set_var("VETAGENDA_LOG_LEVEL", "");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.database.path, "env/agenda.db");
        assert_eq!(config.logging.level, "info");

        match original_path {
            Some(val) => std::env::set_var("VETAGENDA_DATABASE_PATH", val),
            None => std::env::remove_var("VETAGENDA_DATABASE_PATH"),
        }
        match original_level {
            Some(val) => std::env::set_var("VETAGENDA_LOG_LEVEL", val),
            None => std::env::remove_var("VETAGENDA_LOG_LEVEL"),
        }
    }

    #[test]
    fn test_validate_low_iterations() {
        let mut config = Config::default();
        config.auth.pbkdf2_iterations = 1_000;
        assert!(matches!(config.validate(), Err(AgendaError::Config(_))));
    }

    #[test]
    fn test_validate_zero_password_length() {
        let mut config = Config::default();
        config.auth.min_password_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_token_ttl() {
        let mut config = Config::default();
        config.auth.recovery_token_ttl_minutes = 0;
        assert!(config.validate().is_err());

        config.auth.recovery_token_ttl_minutes = MAX_RECOVERY_TOKEN_TTL_MINUTES;
        assert!(config.validate().is_ok());

        config.auth.recovery_token_ttl_minutes = MAX_RECOVERY_TOKEN_TTL_MINUTES + 1;
        assert!(matches!(config.validate(), Err(AgendaError::Config(_))));

        config.auth.recovery_token_ttl_minutes = 1_000_000_000_000;
        assert!(config.validate().is_err());
    }
}
