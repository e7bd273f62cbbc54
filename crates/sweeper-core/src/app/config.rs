//! Cleanup configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of environment overrides (`SWEEPER_INTERVAL_SECS`, ...).
const ENV_PREFIX: &str = "SWEEPER_";

/// Longest accepted cart idle timeout (one year).
const MAX_CART_IDLE_TIMEOUT_SECS: u64 = 365 * 24 * 3600;

/// Configuration of the cleanup passes and the scheduler.
///
/// Every field has a default, so an empty JSON object is a valid config.
/// Values can be overridden from the environment after loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Seconds between two scheduled passes.
    ///
    /// Default: 300 (5 minutes)
    ///
    /// Env: SWEEPER_INTERVAL_SECS
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum pending orders examined by the order expiry stage per pass.
    ///
    /// Default: 100
    ///
    /// Env: SWEEPER_ORDER_BATCH_SIZE
    #[serde(default = "default_order_batch_size")]
    pub order_batch_size: usize,

    /// Maximum payment-pending orders examined by the payment timeout stage per pass.
    ///
    /// Default: 1000
    ///
    /// Env: SWEEPER_PAYMENT_BATCH_SIZE
    #[serde(default = "default_payment_batch_size")]
    pub payment_batch_size: usize,

    /// Inactivity after which an active cart is abandoned.
    ///
    /// Default: 86400 (24 hours)
    ///
    /// Env: SWEEPER_CART_IDLE_TIMEOUT_SECS
    #[serde(default = "default_cart_idle_timeout_secs")]
    pub cart_idle_timeout_secs: u64,

    /// Pending orders inspected when computing `expired_orders` stats.
    ///
    /// Default: 1000
    ///
    /// Env: SWEEPER_STATS_SCAN_LIMIT
    #[serde(default = "default_stats_scan_limit")]
    pub stats_scan_limit: usize,
}

fn default_interval_secs() -> u64 {
    300
}

fn default_order_batch_size() -> usize {
    100
}

fn default_payment_batch_size() -> usize {
    1000
}

fn default_cart_idle_timeout_secs() -> u64 {
    24 * 3600
}

fn default_stats_scan_limit() -> usize {
    1000
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            order_batch_size: default_order_batch_size(),
            payment_batch_size: default_payment_batch_size(),
            cart_idle_timeout_secs: default_cart_idle_timeout_secs(),
            stats_scan_limit: default_stats_scan_limit(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to load config: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: u64 },

    #[error("{field} must be at most {max}, got {value}")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },
}

impl CleanupConfig {
    /// Layers: defaults → JSON file (optional) → `SWEEPER_*` env.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(CleanupConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Json::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Defaults overlaid with an inline JSON document (no env).
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(CleanupConfig::default()))
            .merge(Json::string(raw))
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))
    }

    /// Load from an optional JSON file, apply `SWEEPER_*` overrides, validate.
    ///
    /// An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(missing) = path.filter(|p| !p.is_file()) {
            return Err(ConfigError::MissingFile(missing.to_path_buf()));
        }
        let config: CleanupConfig = Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Extract(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("interval_secs", self.interval_secs),
            ("order_batch_size", self.order_batch_size as u64),
            ("payment_batch_size", self.payment_batch_size as u64),
            ("cart_idle_timeout_secs", self.cart_idle_timeout_secs),
            ("stats_scan_limit", self.stats_scan_limit as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.cart_idle_timeout_secs > MAX_CART_IDLE_TIMEOUT_SECS {
            return Err(ConfigError::TooLarge {
                field: "cart_idle_timeout_secs",
                value: self.cart_idle_timeout_secs,
                max: MAX_CART_IDLE_TIMEOUT_SECS,
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cart_idle_timeout(&self) -> chrono::Duration {
        i64::try_from(self.cart_idle_timeout_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
