//! # Configuration
//!
//! Layered application settings.
//!
//! Sources, later ones overriding earlier ones:
//!
//! ```text
//! built-in defaults
//! config/default.toml                      (optional)
//! file named by PRODUCE_MARKET_CONFIG      (optional)
//! PRODUCE_MARKET__<SECTION>__<KEY>         environment variables
//! ```
//!
//! A `.env` file in the working directory is loaded into the environment
//! first when present.
//!
//! # Examples
//!
//! ```
//! use produce_market::config::AppConfig;
//!
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.matching.max_limit, 50);
//! ```

use crate::application::services::order_matcher::{
    DEFAULT_MATCH_LIMIT, MAX_MATCH_LIMIT, MatcherConfig,
};
use crate::domain::value_objects::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::value_objects::reference_price::DEFAULT_THRESHOLD_PERCENT;
use crate::domain::value_objects::PriceThresholdConfig;
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PRODUCE_MARKET";

/// Environment variable naming an extra configuration file.
pub const CONFIG_FILE_ENV: &str = "PRODUCE_MARKET_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The loaded values are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/produce_market".to_string(),
            max_connections: 10,
        }
    }
}

/// Price evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Width of the `normal` band, in percent either side of the average.
    pub threshold_percent: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
        }
    }
}

impl PricingConfig {
    /// Returns the evaluator threshold.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the threshold is not positive.
    pub fn threshold(&self) -> Result<PriceThresholdConfig, ConfigError> {
        PriceThresholdConfig::new(self.threshold_percent).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "pricing.threshold_percent must be positive, got {}",
                self.threshold_percent
            ))
        })
    }
}

/// Matcher limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Limit used when the caller gives none.
    pub default_limit: usize,
    /// Largest accepted limit.
    pub max_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_MATCH_LIMIT,
            max_limit: MAX_MATCH_LIMIT,
        }
    }
}

impl MatchingConfig {
    /// Returns the matcher limits.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` unless `1 <= default_limit <= max_limit`.
    pub fn matcher(&self) -> Result<MatcherConfig, ConfigError> {
        MatcherConfig::new(self.default_limit, self.max_limit).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "matching.default_limit ({}) must be between 1 and matching.max_limit ({})",
                self.default_limit, self.max_limit
            ))
        })
    }
}

/// Negotiation listing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Page size used when a listing gives no pagination.
    pub page_size: u32,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Price evaluation settings.
    pub pricing: PricingConfig,
    /// Matcher limits.
    pub matching: MatchingConfig,
    /// Negotiation listing settings.
    pub negotiation: NegotiationConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads `.env`, then every configured source, then validates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed and
    /// `ConfigError::Invalid` if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(File::with_name(&path));
        }
        let config: Self = builder
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pricing.threshold()?;
        self.matching.matcher()?;
        if self.negotiation.page_size == 0 || self.negotiation.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "negotiation.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
