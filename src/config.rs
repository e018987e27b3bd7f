//! Environment-driven configuration

use crate::aggregation::{AggregatorOptions, MalformedPolicy, MissingValuePolicy};
use crate::core::scheduler::cron_expression;
use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./Data";
pub const DEFAULT_RISK_FEED_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_FEED_URL: &str = "ws://127.0.0.1:8080/risk-data";

/// Runtime environment name (`production`, `sandbox`, ...)
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// Service configuration resolved from the process environment
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// 0 disables scheduled refresh
    pub snapshot_refresh_seconds: u64,
    pub risk_feed_interval_seconds: u64,
    pub aggregator: AggregatorOptions,
    pub feed_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            snapshot_refresh_seconds: 0,
            risk_feed_interval_seconds: DEFAULT_RISK_FEED_INTERVAL_SECONDS,
            aggregator: AggregatorOptions::default(),
            feed_url: DEFAULT_FEED_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let malformed = match lookup("MALFORMED_POLICY") {
            Some(v) => parse_value::<MalformedPolicy>("MALFORMED_POLICY", &v)?,
            None => defaults.aggregator.malformed,
        };
        let missing_value = match lookup("MISSING_VALUE_POLICY") {
            Some(v) => parse_value::<MissingValuePolicy>("MISSING_VALUE_POLICY", &v)?,
            None => defaults.aggregator.missing_value,
        };

        Ok(Self {
            environment: lookup("APP_ENV").unwrap_or(defaults.environment),
            port: match lookup("PORT") {
                Some(v) => parse_value("PORT", &v)?,
                None => defaults.port,
            },
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            snapshot_refresh_seconds: match lookup("SNAPSHOT_REFRESH_SECONDS") {
                Some(v) => {
                    let secs: u64 = parse_value("SNAPSHOT_REFRESH_SECONDS", &v)?;
                    if secs > 0 {
                        cron_expression(secs)?;
                    }
                    secs
                }
                None => defaults.snapshot_refresh_seconds,
            },
            risk_feed_interval_seconds: match lookup("RISK_FEED_INTERVAL_SECONDS") {
                Some(v) => {
                    let secs: u64 = parse_value("RISK_FEED_INTERVAL_SECONDS", &v)?;
                    if secs == 0 {
                        return Err(ConfigError::InvalidValue {
                            key: "RISK_FEED_INTERVAL_SECONDS",
                            value: v,
                            reason: "must be at least 1".to_string(),
                        });
                    }
                    secs
                }
                None => defaults.risk_feed_interval_seconds,
            },
            aggregator: AggregatorOptions {
                malformed,
                missing_value,
            },
            feed_url: lookup("FEED_URL").unwrap_or(defaults.feed_url),
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
