//! Service configuration, read once at startup.
//!
//! `EBIRD_API_KEY` is required; everything else has a default. The config is
//! built from a lookup function so tests never touch the process environment.

use crate::concurrency::DEFAULT_WORKERS;
use crate::error::{KestrelError, Result};
use std::time::Duration;

pub const DEFAULT_EBIRD_API_BASE: &str = "https://api.ebird.org/v2";
pub const DEFAULT_GEOCODE_API_BASE: &str = "https://api.zippopotam.us/us";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub ebird_api_base: String,
    pub geocode_api_base: String,
    pub request_timeout: Duration,
    pub concurrency: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[hidden]")
            .field("ebird_api_base", &self.ebird_api_base)
            .field("geocode_api_base", &self.geocode_api_base)
            .field("request_timeout", &self.request_timeout)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = value("EBIRD_API_KEY")
            .ok_or_else(|| KestrelError::Config("EBIRD_API_KEY is not set".to_string()))?;

        let timeout_secs = match value("KESTREL_TIMEOUT_SECS") {
            Some(raw) => parse_positive(&raw, "KESTREL_TIMEOUT_SECS")? as u64,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let concurrency = match value("KESTREL_CONCURRENCY") {
            Some(raw) => parse_positive(&raw, "KESTREL_CONCURRENCY")?,
            None => DEFAULT_WORKERS,
        };

        Ok(Self {
            api_key,
            ebird_api_base: value("EBIRD_API_BASE")
                .unwrap_or_else(|| DEFAULT_EBIRD_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            geocode_api_base: value("GEOCODE_API_BASE")
                .unwrap_or_else(|| DEFAULT_GEOCODE_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
            concurrency,
        })
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers.max(1);
        self
    }
}

fn parse_positive(raw: &str, key: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(KestrelError::Config(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
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
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, KestrelError::Config(_)));

        let err = Config::from_lookup(lookup(&[("EBIRD_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, KestrelError::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("EBIRD_API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.ebird_api_base, DEFAULT_EBIRD_API_BASE);
        assert_eq!(config.geocode_api_base, DEFAULT_GEOCODE_API_BASE);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.concurrency, 5);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("EBIRD_API_KEY", "secret"),
            ("EBIRD_API_BASE", "http://localhost:9000/v2/"),
            ("KESTREL_TIMEOUT_SECS", "3"),
            ("KESTREL_CONCURRENCY", "8"),
        ]))
        .unwrap();
        assert_eq!(config.ebird_api_base, "http://localhost:9000/v2");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.concurrency, 8);

        let config = config.with_concurrency(0).with_timeout(30);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("EBIRD_API_KEY", "secret"),
            ("KESTREL_CONCURRENCY", "zero"),
        ]))
        .unwrap_err();
        assert!(matches!(err, KestrelError::Config(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let config = Config::from_lookup(lookup(&[("EBIRD_API_KEY", "secret")])).unwrap();
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
