use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub payment_success_rate: f64,
    pub provider_failure_rate: f64,
    pub simulate_latency: bool,
    pub live_tracking: bool,
    pub dismiss_after: Duration,
    pub suggest_debounce: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            payment_success_rate: 0.95,
            provider_failure_rate: 0.0,
            simulate_latency: true,
            live_tracking: true,
            dismiss_after: Duration::from_secs(3),
            suggest_debounce: Duration::from_millis(500),
            gemini_api_key: None,
            gemini_model: "gemini-3-flash-preview".to_string(),
            gemini_endpoint: "https://generativelanguage.googleapis.com".to_string(),
            store_path: None,
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
            payment_success_rate: parse_rate("PAYMENT_SUCCESS_RATE", defaults.payment_success_rate)?,
            provider_failure_rate: parse_rate("PROVIDER_FAILURE_RATE", defaults.provider_failure_rate)?,
            simulate_latency: parse_or_default("SIMULATE_LATENCY", defaults.simulate_latency)?,
            live_tracking: parse_or_default("LIVE_TRACKING", defaults.live_tracking)?,
            dismiss_after: Duration::from_secs(parse_or_default("DISMISS_AFTER_SECS", 3)?),
            suggest_debounce: Duration::from_millis(parse_or_default("SUGGEST_DEBOUNCE_MS", 500)?),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_endpoint: non_empty("GEMINI_ENDPOINT").unwrap_or(defaults.gemini_endpoint),
            store_path: non_empty("STORE_PATH").map(PathBuf::from),
        })
    }

    /// Simulated round-trip of the fare aggregation call.
    pub fn market_latency(&self) -> Duration {
        self.latency(1200)
    }

    pub fn payment_latency(&self) -> Duration {
        self.latency(2000)
    }

    pub fn provider_latency(&self) -> Duration {
        self.latency(1500)
    }

    fn latency(&self, millis: u64) -> Duration {
        if self.simulate_latency {
            Duration::from_millis(millis)
        } else {
            Duration::ZERO
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty() && raw != "undefined")
}

fn parse_rate(key: &str, default: f64) -> Result<f64, AppError> {
    let rate: f64 = parse_or_default(key, default)?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(AppError::Internal(format!(
            "invalid {key}: {rate} is outside [0, 1]"
        )));
    }
    Ok(rate)
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
