//! Token-economy configuration loading from config.toml
//!
//! This module holds the operator-tunable pieces of the token economy: the
//! signup bonus granted at account creation and the stub catalog of purchasable
//! token packages. Per-track pricing and the creator revenue split are fixed
//! business rules and live in [`crate::core::settlement`], not here.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the token economy in config.toml
#[derive(Debug, Deserialize, Clone)]
pub struct EconomyConfig {
    /// Tokens granted once per user at account creation
    pub signup_bonus: i64,
    /// Stub catalog of purchasable token packages
    pub packages: Vec<TokenPackage>,
}

/// One purchasable token package (stub - price is display-only)
#[derive(Debug, Deserialize, Clone)]
pub struct TokenPackage {
    /// Identifier callers select a package by (e.g. `"100"`)
    pub id: String,
    /// Tokens credited when this package is purchased
    pub tokens: i64,
    /// Display price in dollars - no payment processor is wired up
    pub price_usd: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            signup_bonus: 50,
            packages: vec![
                TokenPackage { id: "100".to_string(), tokens: 100, price_usd: 4.99 },
                TokenPackage { id: "250".to_string(), tokens: 250, price_usd: 9.99 },
                TokenPackage { id: "500".to_string(), tokens: 500, price_usd: 17.99 },
                TokenPackage { id: "1000".to_string(), tokens: 1000, price_usd: 29.99 },
            ],
        }
    }
}

impl EconomyConfig {
    /// Looks up a package by its caller-facing id.
    #[must_use]
    pub fn package(&self, package_id: &str) -> Option<&TokenPackage> {
        self.packages.iter().find(|p| p.id == package_id)
    }

    /// Validates the loaded configuration.
    ///
    /// # Errors
    /// Returns an error if the bonus is negative or any package grants a
    /// non-positive token amount.
    pub fn validate(&self) -> Result<()> {
        if self.signup_bonus < 0 {
            return Err(Error::Config {
                message: format!("signup_bonus must be non-negative, got {}", self.signup_bonus),
            });
        }
        for package in &self.packages {
            if package.tokens <= 0 {
                return Err(Error::Config {
                    message: format!("package {} must grant a positive token amount", package.id),
                });
            }
        }
        Ok(())
    }
}

/// Loads economy configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The loaded values fail validation
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EconomyConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    let config: EconomyConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads economy configuration from ./config.toml, falling back to the
/// compiled-in defaults when the file does not exist.
pub fn load_or_default() -> Result<EconomyConfig> {
    if Path::new("config.toml").exists() {
        load_config("config.toml")
    } else {
        Ok(EconomyConfig::default())
    }
}
