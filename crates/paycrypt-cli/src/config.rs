//! Configuration loading and validation for the CLI.
//!
//! Key material is read separately through [`paycrypt::DriverConfig::from_env`];
//! this struct only holds what the binary itself needs.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Driver name (`aes` or `rsa`). **Required.**
    pub driver: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from `PAYCRYPT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_source(None)
    }

    fn from_source(source: Option<config::Map<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(paycrypt::config::ENV_PREFIX)
                    .prefix_separator("_")
                    .source(source),
            )
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.driver.trim().is_empty() {
            anyhow::bail!("PAYCRYPT_DRIVER is required and must not be empty");
        }
        if self.log_level.trim().is_empty() {
            anyhow::bail!("PAYCRYPT_LOG_LEVEL must not be empty");
        }
        Ok(())
    }
}
