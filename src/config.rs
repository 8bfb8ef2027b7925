use crate::pipeline::LoadLimits;
use anyhow::{bail, Context, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOP_N: usize = 10;

/// Client configuration, read from the environment (and a `.env` file if
/// present). Command-line flags are layered on top in `main`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub limits: LoadLimits,
    pub top_n: usize,
    pub user_id: Option<i64>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            limits: LoadLimits::default(),
            top_n: DEFAULT_TOP_N,
            user_id: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to defaults; set but
    /// unparseable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let limits = LoadLimits {
            reviews: parse_var(&lookup, "FEELYA_REVIEW_LIMIT")?.unwrap_or(defaults.limits.reviews),
            products: parse_var(&lookup, "FEELYA_PRODUCT_LIMIT")?
                .unwrap_or(defaults.limits.products),
        };

        let config = Config {
            api_url: lookup("FEELYA_API_URL").unwrap_or(defaults.api_url),
            request_timeout: parse_var(&lookup, "FEELYA_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            limits,
            top_n: parse_var(&lookup, "FEELYA_TOP_N")?.unwrap_or(defaults.top_n),
            user_id: parse_var(&lookup, "FEELYA_USER_ID")?,
            log_filter: lookup("FEELYA_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_filter),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url)
            .with_context(|| format!("FEELYA_API_URL is not a valid URL: {}", self.api_url))?;
        if self.limits.reviews == 0 || self.limits.products == 0 {
            bail!("review and product limits must be greater than zero");
        }
        if self.top_n == 0 {
            bail!("FEELYA_TOP_N must be greater than zero");
        }
        if self.request_timeout.is_zero() {
            bail!("FEELYA_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.limits.reviews, 100);
        assert_eq!(config.limits.products, 50);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_overrides_from_env() {
        let config = Config::from_lookup(lookup_from(&[
            ("FEELYA_API_URL", "https://feelya.example/api/v1"),
            ("FEELYA_TIMEOUT_SECS", "3"),
            ("FEELYA_REVIEW_LIMIT", "20"),
            ("FEELYA_USER_ID", "42"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://feelya.example/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.limits.reviews, 20);
        assert_eq!(config.limits.products, 50);
        assert_eq!(config.user_id, Some(42));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_bad_number_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("FEELYA_TOP_N", "lots")])).unwrap_err();
        assert!(err.to_string().contains("FEELYA_TOP_N"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("FEELYA_PRODUCT_LIMIT", "0")])).is_err());
    }

    #[test]
    fn test_malformed_url_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("FEELYA_API_URL", "not a url")])).is_err());
    }
}
