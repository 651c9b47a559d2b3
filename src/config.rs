use std::time::Duration;

use picks_league_app::AppConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    ZeroSeconds(&'static str),
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub app: AppConfig,
    pub standings_cache_ttl: Duration,
}

fn seconds_from_env(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidSeconds { name, value }),
        Err(_) => Ok(default),
    }
}

fn nonzero_seconds_from_env(
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let value = seconds_from_env(name, default)?;
    if value.is_zero() {
        return Err(ConfigError::ZeroSeconds(name));
    }
    Ok(value)
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        Ok(Self {
            app: AppConfig {
                recompute_interval: nonzero_seconds_from_env(
                    "RECOMPUTE_INTERVAL_SECS",
                    defaults.recompute_interval,
                )?,
                odds_cache_ttl: seconds_from_env("ODDS_CACHE_TTL_SECS", defaults.odds_cache_ttl)?,
            },
            standings_cache_ttl: seconds_from_env(
                "STANDINGS_CACHE_TTL_SECS",
                Duration::from_secs(60 * 60),
            )?,
        })
    }
}
