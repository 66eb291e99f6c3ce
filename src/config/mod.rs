use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::credentials::CREDENTIAL_NAME;
use crate::node::request::BASE_URL;
use crate::node::BatchPolicy;

/// Complete connector configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlingConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Bling API endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout of the HTTP transport (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Token storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_credential_name")]
    pub name: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_credential_name() -> String {
    CREDENTIAL_NAME.to_string()
}

fn default_database() -> String {
    "bling_credentials.db".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            name: default_credential_name(),
            database: default_database(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl BatchConfig {
    pub fn policy(&self) -> BatchPolicy {
        BatchPolicy {
            continue_on_fail: self.continue_on_fail,
        }
    }
}

impl BlingConfig {
    /// Loads `BLING_CONFIG` (if set) and applies `BLING_*` overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("BLING_CONFIG") {
            Ok(path) => load_config(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (environment variable names).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BLING_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("BLING_TIMEOUT_SECONDS") {
            self.api.timeout_seconds = v
                .parse()
                .with_context(|| format!("BLING_TIMEOUT_SECONDS must be a number, got '{}'", v))?;
        }
        if let Some(v) = lookup("BLING_CREDENTIALS_DB") {
            self.credentials.database = v;
        }
        if let Some(v) = lookup("BLING_CREDENTIAL_NAME") {
            self.credentials.name = v;
        }
        if let Some(v) = lookup("BLING_CONTINUE_ON_FAIL") {
            self.batch.continue_on_fail = v
                .parse()
                .with_context(|| format!("BLING_CONTINUE_ON_FAIL must be true or false, got '{}'", v))?;
        }
        Ok(())
    }
}

/// Load configuration from TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BlingConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}
