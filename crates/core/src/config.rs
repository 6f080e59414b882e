use std::env;

use serde::{Deserialize, Serialize};

use crate::result::Severity;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_service: DataServiceConfig,
    pub validation: ValidationConfig,
    pub email: EmailConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            data_service: DataServiceConfig::from_env(),
            validation: ValidationConfig::from_env(),
            email: EmailConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  data service: url={}", self.data_service.base_url);
        tracing::info!(
            "  validation:   sigma={}, window={}, concurrency={}, cache={}",
            self.validation.outlier_sigma,
            self.validation.outlier_window,
            self.validation.run_all_concurrency,
            self.validation.cache_capacity,
        );
        tracing::info!(
            "  email:        host={}, recipients={}",
            self.email.smtp_host,
            self.email.recipients.len(),
        );
    }
}

// ── Data service ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataServiceConfig {
    /// Base URL of the PostgREST-style data service.
    pub base_url: String,
    pub api_key: Option<String>,
    pub fetch_timeout_secs: u64,
}

impl DataServiceConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("DATA_SERVICE_URL", "http://localhost:3000"),
            api_key: env_opt("DATA_SERVICE_KEY"),
            fetch_timeout_secs: env_u64("FETCH_TIMEOUT_SECS", 30),
        }
    }
}

// ── Validation engine ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Deviation multiplier for the statistical outlier check.
    pub outlier_sigma: f64,
    /// Trailing window length for the outlier check.
    pub outlier_window: usize,
    /// Default window when daily prices are validated without a range.
    pub daily_lookback_days: u32,
    /// Default window when quarterly financials are validated without a range.
    pub quarterly_lookback_days: u32,
    /// Bound on the local result cache.
    pub cache_capacity: usize,
    /// Minimum anomaly severity that triggers a notification.
    pub notify_threshold: Severity,
    /// Concurrency cap for the all-tables fan-out.
    pub run_all_concurrency: usize,
    pub notify_timeout_secs: u64,
}

impl ValidationConfig {
    fn from_env() -> Self {
        let notify_threshold = env_or("NOTIFY_THRESHOLD", "warning")
            .parse()
            .unwrap_or(Severity::Warning);
        Self {
            outlier_sigma: env_f64("OUTLIER_SIGMA", 3.0),
            outlier_window: env_usize("OUTLIER_WINDOW", 20),
            daily_lookback_days: env_u32("DAILY_LOOKBACK_DAYS", 7),
            quarterly_lookback_days: env_u32("QUARTERLY_LOOKBACK_DAYS", 365),
            cache_capacity: env_usize("RESULT_CACHE_CAPACITY", 50),
            notify_threshold,
            run_all_concurrency: env_usize("RUN_ALL_CONCURRENCY", 4).max(1),
            notify_timeout_secs: env_u64("NOTIFY_TIMEOUT_SECS", 20),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            outlier_sigma: 3.0,
            outlier_window: 20,
            daily_lookback_days: 7,
            quarterly_lookback_days: 365,
            cache_capacity: 50,
            notify_threshold: Severity::Warning,
            run_all_concurrency: 4,
            notify_timeout_secs: 20,
        }
    }
}

// ── Email ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_tls: bool,
    pub from: String,
    /// Alert recipients for anomalous runs.
    pub recipients: Vec<String>,
    /// Recipients for the daily summary variant.
    pub daily_summary_recipients: Vec<String>,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            smtp_host: env_or("SMTP_HOST", "localhost"),
            smtp_port: env_u16("SMTP_PORT", 587),
            smtp_tls: env_or("SMTP_TLS", "true") == "true",
            from: env_or("FROM_EMAIL", "alerts@localhost"),
            recipients: env_list("DEFAULT_EMAIL_RECIPIENTS"),
            daily_summary_recipients: env_list("DAILY_SUMMARY_RECIPIENTS"),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.recipients.is_empty()
    }

    /// Config for all-tables summary runs: the dedicated summary list when
    /// one is set, otherwise the default alert recipients.
    pub fn for_daily_summary(&self) -> EmailConfig {
        if self.daily_summary_recipients.is_empty() {
            self.clone()
        } else {
            EmailConfig {
                recipients: self.daily_summary_recipients.clone(),
                ..self.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_defaults_are_documented_values() {
        let cfg = ValidationConfig::default();
        assert_eq!(cfg.outlier_sigma, 3.0);
        assert_eq!(cfg.outlier_window, 20);
        assert_eq!(cfg.daily_lookback_days, 7);
        assert_eq!(cfg.quarterly_lookback_days, 365);
        assert_eq!(cfg.notify_threshold, Severity::Warning);
    }

    #[test]
    fn severity_parses_from_config_string() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("catastrophic".parse::<Severity>().is_err());
    }

    #[test]
    fn daily_summary_falls_back_to_default_recipients() {
        let mut cfg = EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_tls: true,
            from: "alerts@localhost".to_string(),
            recipients: vec!["team@example.com".to_string()],
            daily_summary_recipients: Vec::new(),
        };
        assert_eq!(cfg.for_daily_summary().recipients, cfg.recipients);

        cfg.daily_summary_recipients = vec!["digest@example.com".to_string()];
        assert_eq!(
            cfg.for_daily_summary().recipients,
            vec!["digest@example.com".to_string()]
        );
    }
}
