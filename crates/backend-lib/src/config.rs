// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::AppError;

/// Prefix for environment overrides, e.g. `FOLIO_BIND_ADDR`
pub const ENV_PREFIX: &str = "FOLIO_";

/// Minimum accepted length of the token signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Deployment environment. Controls the `Secure` cookie flag and log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// A secret string that is redacted in `Debug` output and wiped on drop.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Deployment environment
    pub environment: Environment,
    /// Secret used to sign session tokens. Required; there is no default.
    pub jwt_secret: Secret,
    /// Password requirements applied at registration
    pub password_requirements: PasswordRequirements,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            environment: Environment::Development,
            jwt_secret: Secret::default(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment, then validate.
    pub fn load() -> Result<Self, AppError> {
        Self::extract(Self::figment(Path::new("config.toml")))
    }

    /// Load settings from an explicit TOML file and the environment, then validate.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        Self::extract(Self::figment(path.as_ref()))
    }

    /// Layered configuration: defaults, then the file, then `FOLIO_*`
    /// variables, then the bare `JWT_SECRET` variable.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().only(&["JWT_SECRET"]))
    }

    fn extract(figment: Figment) -> Result<Self, AppError> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server must not start with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.is_empty() {
            return Err(AppError::Config(
                "jwt_secret is not set (use FOLIO_JWT_SECRET or JWT_SECRET)".to_string(),
            ));
        }
        if self.jwt_secret.expose().len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "jwt_secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "invalid log level: {}",
                self.log_level
            )));
        }
        if self.password_requirements.min_length < 6 {
            return Err(AppError::Config(
                "password_requirements.min_length must be at least 6".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[cfg(test)]
mod config_tests;
