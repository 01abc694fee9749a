use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::RiskWatchError;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_DELAY_SECS: u64 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_START_DATE: &str = "2026-02-17";

/// Tunables for the scheduler, runner and research adapter.
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Entities per batch. Always at least 1.
    pub batch_size: usize,
    /// Pause between consecutive research calls.
    pub inter_call_delay: Duration,
    /// Hard upper bound on a single research call.
    pub remote_timeout: Duration,
    /// Week 1 of the rotation starts on this date.
    pub anchor_date: NaiveDate,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            inter_call_delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            remote_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            anchor_date: NaiveDate::from_ymd_opt(2026, 2, 17).unwrap_or_default(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub rotation: RotationConfig,
    /// Explicit batch index override; `None` derives the batch from the clock.
    pub week: Option<usize>,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, RiskWatchError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RiskWatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gemini_api_key = get("GEMINI_API_KEY")
            .ok_or_else(|| RiskWatchError::Config("GEMINI_API_KEY environment variable is required".into()))?;

        let batch_size: usize = parse_or(get("COMPANIES_PER_WEEK"), "COMPANIES_PER_WEEK", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 {
            return Err(RiskWatchError::Config("COMPANIES_PER_WEEK must be at least 1".into()));
        }

        let delay_secs: u64 = parse_or(get("REQUEST_DELAY_SECS"), "REQUEST_DELAY_SECS", DEFAULT_DELAY_SECS)?;
        let timeout_secs: u64 = parse_or(get("REMOTE_TIMEOUT_SECS"), "REMOTE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(RiskWatchError::Config("REMOTE_TIMEOUT_SECS must be at least 1".into()));
        }

        let start_date = get("START_DATE").unwrap_or_else(|| DEFAULT_START_DATE.to_string());
        let anchor_date = NaiveDate::parse_from_str(&start_date, "%Y-%m-%d")
            .map_err(|e| RiskWatchError::Config(format!("START_DATE '{start_date}' is not YYYY-MM-DD: {e}")))?;

        let week: usize = parse_or(get("WEEK"), "WEEK", 0)?;

        Ok(Self {
            gemini_api_key,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            rotation: RotationConfig {
                batch_size,
                inter_call_delay: Duration::from_secs(delay_secs),
                remote_timeout: Duration::from_secs(timeout_secs),
                anchor_date,
            },
            week: (week > 0).then_some(week),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string())),
        })
    }

    /// Log every setting, secrets reduced to a short prefix.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(8).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  GEMINI_API_KEY: {}", preview(&self.gemini_api_key));
        tracing::info!("  GEMINI_MODEL: {}", self.gemini_model);
        tracing::info!("  COMPANIES_PER_WEEK: {}", self.rotation.batch_size);
        tracing::info!("  REQUEST_DELAY_SECS: {}", self.rotation.inter_call_delay.as_secs());
        tracing::info!("  REMOTE_TIMEOUT_SECS: {}", self.rotation.remote_timeout.as_secs());
        tracing::info!("  START_DATE: {}", self.rotation.anchor_date);
        match self.week {
            Some(week) => tracing::info!("  WEEK: {week}"),
            None => tracing::info!("  WEEK: <derived from date>"),
        }
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, RiskWatchError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| RiskWatchError::Config(format!("{key} must be a number, got '{raw}': {e}"))),
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "AIza-secret")])).unwrap();
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.rotation.batch_size, 10);
        assert_eq!(config.rotation.inter_call_delay, Duration::from_secs(10));
        assert_eq!(config.rotation.remote_timeout, Duration::from_secs(120));
        assert_eq!(config.rotation.anchor_date, NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert_eq!(config.week, None);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn missing_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn week_zero_means_derive_from_date() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("WEEK", "0")])).unwrap();
        assert_eq!(config.week, None);
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("WEEK", "4")])).unwrap();
        assert_eq!(config.week, Some(4));
    }

    #[test]
    fn rejects_zero_batch_size_and_bad_numbers() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("COMPANIES_PER_WEEK", "0")])).unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("REQUEST_DELAY_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("REQUEST_DELAY_SECS"));
    }

    #[test]
    fn rejects_malformed_start_date() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("START_DATE", "17/02/2026")])).unwrap_err();
        assert!(err.to_string().contains("START_DATE"));
    }
}
