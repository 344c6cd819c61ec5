//! Process configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present;
//! variables already set in the environment win.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const REQUIRED: [&str; 2] = ["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Http,
    Chromium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub check_interval: Duration,
    pub jitter_max: Duration,
    pub fallback_delay: Duration,
    pub notify_delay: Duration,
    pub retention_days: u32,
    pub cleanup_every: u64,
    pub recycle_every: u64,
    /// `None` keeps the seen-job store in memory only.
    pub seen_file: Option<PathBuf>,
    pub target_location: String,
    pub search_keywords: String,
    pub search_base_url: Option<String>,
    pub engine: EngineKind,
    pub browser_cache_dir: Option<PathBuf>,
    pub chrome_executable: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        let number = |name: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(raw) => raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
                    name,
                    value: raw.clone(),
                    reason: err.to_string(),
                }),
            }
        };

        let retention_days = number("RETENTION_DAYS", 3)?;
        let retention_days = u32::try_from(retention_days).map_err(|err| ConfigError::Invalid {
            name: "RETENTION_DAYS",
            value: retention_days.to_string(),
            reason: err.to_string(),
        })?;

        let engine = match get("RENDER_ENGINE").map(|v| v.to_ascii_lowercase()) {
            None => EngineKind::Http,
            Some(v) if v == "http" => EngineKind::Http,
            Some(v) if v == "chromium" => EngineKind::Chromium,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "RENDER_ENGINE",
                    value: other,
                    reason: "expected `http` or `chromium`".to_string(),
                })
            }
        };

        Ok(Self {
            telegram_token: get("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: get("TELEGRAM_CHAT_ID").unwrap_or_default(),
            check_interval: Duration::from_secs(number("CHECK_INTERVAL_SECS", 60)?),
            jitter_max: Duration::from_secs(number("JITTER_MAX_SECS", 60)?),
            fallback_delay: Duration::from_secs(number("FALLBACK_DELAY_SECS", 10)?),
            notify_delay: Duration::from_millis(number("NOTIFY_DELAY_MS", 1000)?),
            retention_days,
            cleanup_every: number("CLEANUP_EVERY", 10)?,
            recycle_every: number("RECYCLE_EVERY", 30)?,
            seen_file: get("SEEN_FILE").map(PathBuf::from),
            target_location: get("TARGET_LOCATION").unwrap_or_else(|| "France".to_string()),
            search_keywords: get("SEARCH_KEYWORDS")
                .unwrap_or_else(|| "alternance cybersécurité".to_string()),
            search_base_url: get("SEARCH_BASE_URL"),
            engine,
            browser_cache_dir: get("BROWSER_CACHE_DIR").map(PathBuf::from),
            chrome_executable: get("CHROME_EXECUTABLE").map(PathBuf::from),
            log_file: get("LOG_FILE").map(PathBuf::from),
        })
    }
}

/// Loads `.env` from the working directory if there is one.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const SECRETS: [(&str, &str); 2] = [
        ("TELEGRAM_BOT_TOKEN", "123:ABC"),
        ("TELEGRAM_CHAT_ID", "-1001"),
    ];

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = AppConfig::from_lookup(lookup(&SECRETS)).unwrap();

        assert_eq!(config.telegram_token, "123:ABC");
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.jitter_max, Duration::from_secs(60));
        assert_eq!(config.fallback_delay, Duration::from_secs(10));
        assert_eq!(config.notify_delay, Duration::from_secs(1));
        assert_eq!(config.retention_days, 3);
        assert_eq!(config.cleanup_every, 10);
        assert_eq!(config.recycle_every, 30);
        assert_eq!(config.seen_file, None);
        assert_eq!(config.target_location, "France");
        assert_eq!(config.engine, EngineKind::Http);
    }

    #[test]
    fn every_missing_secret_is_named() {
        let err = AppConfig::from_lookup(lookup(&[("TELEGRAM_CHAT_ID", "  ")])).unwrap_err();

        assert_eq!(
            err,
            ConfigError::MissingVars(vec!["TELEGRAM_BOT_TOKEN", "TELEGRAM_CHAT_ID"])
        );
        assert_eq!(
            err.to_string(),
            "missing required environment variables: TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_ID"
        );
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let mut vars = SECRETS.to_vec();
        vars.push(("CHECK_INTERVAL_SECS", "soon"));

        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "CHECK_INTERVAL_SECS", .. }));
    }

    #[test]
    fn overrides_are_read() {
        let mut vars = SECRETS.to_vec();
        vars.extend([
            ("RECYCLE_EVERY", "5"),
            ("SEEN_FILE", "state/seen_jobs.json"),
            ("RENDER_ENGINE", "Chromium"),
            ("TARGET_LOCATION", "Lyon"),
        ]);

        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.recycle_every, 5);
        assert_eq!(config.seen_file, Some(PathBuf::from("state/seen_jobs.json")));
        assert_eq!(config.engine, EngineKind::Chromium);
        assert_eq!(config.target_location, "Lyon");
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("RENDER_ENGINE", "webkit"));

        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "RENDER_ENGINE", .. }));
    }
}
