use std::env;
use std::path::PathBuf;

use crate::error::AppError;
use crate::i18n::Locale;
use crate::models::user::UserIdentity;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub default_locale: Locale,
    pub notification_timeout_ms: u64,
    pub summary_delay_ms: u64,
    pub summary_path: String,
    /// Sender identity used when the client has no usable `userData`.
    pub fallback_user: UserIdentity,
    pub geocoder_fixtures: Option<PathBuf>,
    pub wizard_idle_ttl_secs: u64,
    pub wizard_prune_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            default_locale: Locale::Ar,
            notification_timeout_ms: 5_000,
            summary_delay_ms: 800,
            summary_path: "/pick-and-order/summary".to_string(),
            fallback_user: UserIdentity {
                name: "أحمد محمد".to_string(),
                phone: "+966501234567".to_string(),
            },
            geocoder_fixtures: None,
            wizard_idle_ttl_secs: 3_600,
            wizard_prune_interval_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            default_locale: parse_or_default("DEFAULT_LOCALE", defaults.default_locale)?,
            notification_timeout_ms: parse_or_default(
                "NOTIFICATION_TIMEOUT_MS",
                defaults.notification_timeout_ms,
            )?,
            summary_delay_ms: parse_or_default("SUMMARY_DELAY_MS", defaults.summary_delay_ms)?,
            summary_path: env::var("SUMMARY_PATH").unwrap_or(defaults.summary_path),
            fallback_user: UserIdentity {
                name: env::var("FALLBACK_USER_NAME").unwrap_or(defaults.fallback_user.name),
                phone: env::var("FALLBACK_USER_PHONE").unwrap_or(defaults.fallback_user.phone),
            },
            geocoder_fixtures: env::var("GEOCODER_FIXTURES").ok().map(PathBuf::from),
            wizard_idle_ttl_secs: parse_or_default(
                "WIZARD_IDLE_TTL_SECS",
                defaults.wizard_idle_ttl_secs,
            )?,
            wizard_prune_interval_secs: parse_or_default(
                "WIZARD_PRUNE_INTERVAL_SECS",
                defaults.wizard_prune_interval_secs,
            )?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
