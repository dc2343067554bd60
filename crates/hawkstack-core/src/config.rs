//! Configuration management for HawkStack.
//!
//! All configuration is driven by environment variables.

use std::str::FromStr;

use tracing::debug;

use crate::error::{HawkStackError, HawkStackResult};
use crate::types::Algorithm;

/// Global configuration for HawkStack clients and servers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HawkConfig {
    /// Accepted distance, in seconds, between a request timestamp and the server clock.
    pub timestamp_skew_secs: u64,
    /// Period of the background nonce sweep.
    pub nonce_sweep_interval_secs: u64,
    /// Offset added to the local clock when a client stamps requests.
    pub localtime_offset_secs: i64,
    /// Algorithm used when credentials do not name one.
    pub default_algorithm: Algorithm,
    /// Random bytes per generated nonce.
    pub nonce_bytes: usize,
    /// Log level.
    pub log_level: String,
}

impl Default for HawkConfig {
    fn default() -> Self {
        Self {
            timestamp_skew_secs: 60,
            nonce_sweep_interval_secs: 30,
            localtime_offset_secs: 0,
            default_algorithm: Algorithm::default(),
            nonce_bytes: 10,
            log_level: "info".to_owned(),
        }
    }
}

impl HawkConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`HawkStackError::Config`] if a variable is set to an unparseable value.
    pub fn from_env() -> HawkStackResult<Self> {
        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        debug!(
            skew_secs = config.timestamp_skew_secs,
            sweep_interval_secs = config.nonce_sweep_interval_secs,
            algorithm = %config.default_algorithm,
            "Loaded Hawk configuration from environment"
        );
        Ok(config)
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`HawkStackError::Config`] if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> HawkStackResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("HAWK_TIMESTAMP_SKEW_SECS") {
            config.timestamp_skew_secs = parse_var("HAWK_TIMESTAMP_SKEW_SECS", &v)?;
        }
        if let Some(v) = lookup("HAWK_NONCE_SWEEP_INTERVAL_SECS") {
            config.nonce_sweep_interval_secs = parse_var("HAWK_NONCE_SWEEP_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("HAWK_LOCALTIME_OFFSET_SECS") {
            config.localtime_offset_secs = parse_var("HAWK_LOCALTIME_OFFSET_SECS", &v)?;
        }
        if let Some(v) = lookup("HAWK_DEFAULT_ALGORITHM") {
            config.default_algorithm = Algorithm::from_str(&v)
                .map_err(|e| HawkStackError::Config(format!("HAWK_DEFAULT_ALGORITHM: {e}")))?;
        }
        if let Some(v) = lookup("HAWK_NONCE_BYTES") {
            config.nonce_bytes = parse_var("HAWK_NONCE_BYTES", &v)?;
            if config.nonce_bytes == 0 {
                return Err(HawkStackError::Config(
                    "HAWK_NONCE_BYTES must be at least 1".to_owned(),
                ));
            }
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// The skew window as signed seconds, saturating at `i64::MAX`.
    #[must_use]
    pub fn skew_window(&self) -> i64 {
        i64::try_from(self.timestamp_skew_secs).unwrap_or(i64::MAX)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> HawkStackResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HawkStackError::Config(format!("{name}: invalid value {value:?}")))
}
