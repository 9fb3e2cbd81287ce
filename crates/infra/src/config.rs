//! Configuration loading and representation.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, read from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres connection string. `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    /// Scheduled duplicate scan period; `None` disables the background runner.
    pub scan_interval: Option<Duration>,
    /// Display name stamped by the scheduled scan actor.
    pub system_actor: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            api_host: "0.0.0.0".to_owned(),
            api_port: 8080,
            scan_interval: None,
            system_actor: "system".to_owned(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let api_port = match get("API_PORT") {
            Some(raw) => parse::<u16>("API_PORT", raw)?,
            None => defaults.api_port,
        };

        let scan_interval = match get("DEDUP_SCAN_INTERVAL_SECS") {
            Some(raw) => match parse::<u64>("DEDUP_SCAN_INTERVAL_SECS", raw)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            api_host: get("API_HOST").unwrap_or(defaults.api_host),
            api_port,
            scan_interval,
            system_actor: get("DEDUP_SYSTEM_ACTOR").unwrap_or(defaults.system_actor),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.api_host.parse().map_err(|_| ConfigError::Invalid {
            key: "API_HOST",
            value: self.api_host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.api_port))
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.socket_address().unwrap().port(), 8080);
    }

    #[test]
    fn values_are_read_and_zero_interval_disables_scans() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/mixerp"),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "9000"),
            ("DEDUP_SCAN_INTERVAL_SECS", "900"),
            ("DEDUP_SYSTEM_ACTOR", "nightly"),
        ]))
        .unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/mixerp"));
        assert_eq!(cfg.socket_address().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.scan_interval, Some(Duration::from_secs(900)));
        assert_eq!(cfg.system_actor, "nightly");

        let off = AppConfig::from_lookup(lookup(&[("DEDUP_SCAN_INTERVAL_SECS", "0")])).unwrap();
        assert_eq!(off.scan_interval, None);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("API_PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "API_PORT", value: "eighty".to_string() });

        let err = AppConfig::from_lookup(lookup(&[("DEDUP_SCAN_INTERVAL_SECS", "-5")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DEDUP_SCAN_INTERVAL_SECS", .. }));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(cfg.database_url.is_none());
    }
}
