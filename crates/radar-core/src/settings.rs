//! # Runtime Settings
//!
//! Environment-driven configuration shared by the API server and the CLI.
//! Every variable is optional and falls back to the platform defaults. A
//! JSON file can overlay any subset of fields (`radar --config FILE`).
//!
//! | Variable | Default |
//! |---|---|
//! | `RADAR_APP_NAME` | `PolicyRadar` |
//! | `RADAR_APP_VERSION` | `1.0.0` |
//! | `DATABASE_URL` | unset (in-memory mode) |
//! | `RADAR_API_HOST` | `0.0.0.0` |
//! | `RADAR_API_PORT` | `8000` |
//! | `RADAR_AUTH_TOKEN` | unset (auth disabled) |
//! | `RADAR_PREDICTION_HORIZON_MONTHS` | `12` |
//! | `RADAR_CONFIDENCE_THRESHOLD` | `0.7` |
//! | `RADAR_IMPACT_ACCURACY_TARGET` | `0.85` |
//! | `RADAR_BATCH_SIZE` | `1000` |
//! | `RADAR_MAX_WORKERS` | `4` |
//! | `RADAR_CACHE_TTL_SECONDS` | `3600` |
//! | `RADAR_LOG_LEVEL` | `info` |
//! | `RADAR_RATE_LIMIT_PER_MINUTE` | `1000` |
//! | `RADAR_METRICS_ENABLED` | `true` |
//! | `RADAR_DATA_DIR` | unset |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::RadarError;

/// Resolved runtime settings.
///
/// Custom `Debug` redacts `auth_token` and the credentials part of
/// `database_url`.
#[derive(Clone, PartialEq)]
pub struct Settings {
    /// Service name shown in banners.
    pub app_name: String,
    /// Service version.
    pub app_version: String,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Bind address.
    pub api_host: String,
    /// Bind port.
    pub api_port: u16,
    /// Static bearer token. `None` disables auth.
    pub auth_token: Option<String>,
    /// Default forecast horizon.
    pub prediction_horizon_months: u32,
    /// Default interval confidence for predictions.
    pub confidence_threshold: f64,
    /// Target impact accuracy, tracked on the dashboard.
    pub impact_accuracy_target: f64,
    /// Rows per batch for bulk ingestion.
    pub batch_size: usize,
    /// Worker threads for batch assessment.
    pub max_workers: usize,
    /// Analytics cache TTL.
    pub cache_ttl_seconds: u64,
    /// Default log filter.
    pub log_level: String,
    /// Requests per client per minute.
    pub rate_limit_per_minute: u32,
    /// Whether `/metrics` and request metrics are enabled.
    pub metrics_enabled: bool,
    /// Dataset directory to bootstrap from.
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "PolicyRadar".to_string(),
            app_version: "1.0.0".to_string(),
            database_url: None,
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
            auth_token: None,
            prediction_horizon_months: 12,
            confidence_threshold: 0.7,
            impact_accuracy_target: 0.85,
            batch_size: 1000,
            max_workers: 4,
            cache_ttl_seconds: 3600,
            log_level: "info".to_string(),
            rate_limit_per_minute: 1000,
            metrics_enabled: true,
            data_dir: None,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_host", &self.api_host)
            .field("api_port", &self.api_port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("prediction_horizon_months", &self.prediction_horizon_months)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("impact_accuracy_target", &self.impact_accuracy_target)
            .field("batch_size", &self.batch_size)
            .field("max_workers", &self.max_workers)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("log_level", &self.log_level)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("metrics_enabled", &self.metrics_enabled)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

/// Partial settings read from a JSON file. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsOverlay {
    app_name: Option<String>,
    app_version: Option<String>,
    database_url: Option<String>,
    api_host: Option<String>,
    api_port: Option<u16>,
    auth_token: Option<String>,
    prediction_horizon_months: Option<u32>,
    confidence_threshold: Option<f64>,
    impact_accuracy_target: Option<f64>,
    batch_size: Option<usize>,
    max_workers: Option<usize>,
    cache_ttl_seconds: Option<u64>,
    log_level: Option<String>,
    rate_limit_per_minute: Option<u32>,
    metrics_enabled: Option<bool>,
    data_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, RadarError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup.
    ///
    /// Used by [`Settings::from_env`]; tests pass a map instead of mutating
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RadarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let text = |key: &str, default: String| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or(default)
        };
        let opt = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let settings = Self {
            app_name: text("RADAR_APP_NAME", d.app_name),
            app_version: text("RADAR_APP_VERSION", d.app_version),
            database_url: opt("DATABASE_URL"),
            api_host: text("RADAR_API_HOST", d.api_host),
            api_port: parsed(&lookup, "RADAR_API_PORT", d.api_port)?,
            auth_token: opt("RADAR_AUTH_TOKEN"),
            prediction_horizon_months: parsed(
                &lookup,
                "RADAR_PREDICTION_HORIZON_MONTHS",
                d.prediction_horizon_months,
            )?,
            confidence_threshold: parsed(
                &lookup,
                "RADAR_CONFIDENCE_THRESHOLD",
                d.confidence_threshold,
            )?,
            impact_accuracy_target: parsed(
                &lookup,
                "RADAR_IMPACT_ACCURACY_TARGET",
                d.impact_accuracy_target,
            )?,
            batch_size: parsed(&lookup, "RADAR_BATCH_SIZE", d.batch_size)?,
            max_workers: parsed(&lookup, "RADAR_MAX_WORKERS", d.max_workers)?,
            cache_ttl_seconds: parsed(&lookup, "RADAR_CACHE_TTL_SECONDS", d.cache_ttl_seconds)?,
            log_level: text("RADAR_LOG_LEVEL", d.log_level),
            rate_limit_per_minute: parsed(
                &lookup,
                "RADAR_RATE_LIMIT_PER_MINUTE",
                d.rate_limit_per_minute,
            )?,
            metrics_enabled: match opt("RADAR_METRICS_ENABLED") {
                Some(v) => parse_bool("RADAR_METRICS_ENABLED", &v)?,
                None => d.metrics_enabled,
            },
            data_dir: opt("RADAR_DATA_DIR").map(PathBuf::from),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load from the environment, then overlay a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, RadarError> {
        Self::from_env()?.overlay_json_file(path)
    }

    /// Overlay the fields present in a JSON file onto `self`.
    pub fn overlay_json_file(self, path: &Path) -> Result<Self, RadarError> {
        let raw = std::fs::read_to_string(path)?;
        let overlay: SettingsOverlay = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "applying settings overlay");
        let merged = self.apply(overlay);
        merged.validate()?;
        Ok(merged)
    }

    fn apply(mut self, o: SettingsOverlay) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if let Some(v) = o.$field { self.$field = v; } )*
            };
        }
        take!(
            app_name,
            app_version,
            api_host,
            api_port,
            prediction_horizon_months,
            confidence_threshold,
            impact_accuracy_target,
            batch_size,
            max_workers,
            cache_ttl_seconds,
            log_level,
            rate_limit_per_minute,
            metrics_enabled
        );
        if o.database_url.is_some() {
            self.database_url = o.database_url;
        }
        if o.auth_token.is_some() {
            self.auth_token = o.auth_token;
        }
        if o.data_dir.is_some() {
            self.data_dir = o.data_dir;
        }
        self
    }

    fn validate(&self) -> Result<(), RadarError> {
        if !(0.0..1.0).contains(&self.confidence_threshold) || self.confidence_threshold <= 0.0 {
            return Err(RadarError::Config(format!(
                "confidence_threshold must be in (0, 1), got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.impact_accuracy_target) {
            return Err(RadarError::Config(format!(
                "impact_accuracy_target must be in [0, 1], got {}",
                self.impact_accuracy_target
            )));
        }
        if self.prediction_horizon_months == 0 {
            return Err(RadarError::Config(
                "prediction_horizon_months must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 || self.max_workers == 0 {
            return Err(RadarError::Config(
                "batch_size and max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, RadarError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RadarError::Config(format!("{key}: cannot parse \"{raw}\""))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, RadarError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RadarError::Config(format!("{key}: expected a boolean, got \"{other}\""))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Settings, RadarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = from_map(&[]).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.bind_addr(), "0.0.0.0:8000");
        assert!(s.metrics_enabled);
    }

    #[test]
    fn env_values_override() {
        let s = from_map(&[
            ("RADAR_API_PORT", "9100"),
            ("RADAR_AUTH_TOKEN", "analyst:s3cret"),
            ("RADAR_METRICS_ENABLED", "false"),
            ("RADAR_CACHE_TTL_SECONDS", "60"),
            ("RADAR_DATA_DIR", "/tmp/radar"),
        ])
        .unwrap();
        assert_eq!(s.api_port, 9100);
        assert_eq!(s.auth_token.as_deref(), Some("analyst:s3cret"));
        assert!(!s.metrics_enabled);
        assert_eq!(s.cache_ttl_seconds, 60);
        assert_eq!(s.data_dir, Some(PathBuf::from("/tmp/radar")));
    }

    #[test]
    fn unparseable_number_is_config_error() {
        let err = from_map(&[("RADAR_API_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, RadarError::Config(ref m) if m.contains("RADAR_API_PORT")));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        assert!(from_map(&[("RADAR_CONFIDENCE_THRESHOLD", "1.5")]).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let s = from_map(&[
            ("RADAR_AUTH_TOKEN", "top-secret"),
            ("DATABASE_URL", "postgres://u:pw@localhost/radar"),
        ])
        .unwrap();
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("top-secret"));
        assert!(!dbg.contains("pw@"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn json_overlay_applies_present_fields_only() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"api_port": 9000, "log_level": "debug"}}"#).unwrap();
        let s = Settings::default().overlay_json_file(file.path()).unwrap();
        assert_eq!(s.api_port, 9000);
        assert_eq!(s.log_level, "debug");
        assert_eq!(s.app_name, "PolicyRadar");
    }

    #[test]
    fn json_overlay_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"api_prot": 9000}}"#).unwrap();
        assert!(Settings::default().overlay_json_file(file.path()).is_err());
    }
}
