use std::env;

use chrono::{NaiveTime, Weekday};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub calendar_api_url: String,
    pub calendar_api_key: String,
    pub clinic: ClinicConfig,
}

/// Clinic-level scheduling and review policy knobs.
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub closed_weekday: Weekday,
    pub review_token_ttl_days: i64,
    pub duplicate_submission_grace_minutes: i64,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            closed_weekday: Weekday::Sun,
            review_token_ttl_days: 30,
            duplicate_submission_grace_minutes: 5,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("CLINIC_JWT_SECRET").unwrap_or_else(|_| {
                warn!("CLINIC_JWT_SECRET not set, using empty value");
                String::new()
            }),
            calendar_api_url: env::var("CALENDAR_API_URL").unwrap_or_else(|_| {
                warn!("CALENDAR_API_URL not set, calendar events disabled");
                String::new()
            }),
            calendar_api_key: env::var("CALENDAR_API_KEY").unwrap_or_else(|_| {
                warn!("CALENDAR_API_KEY not set, using empty value");
                String::new()
            }),
            clinic: ClinicConfig::from_env(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    pub fn is_calendar_configured(&self) -> bool {
        !self.calendar_api_url.is_empty() && !self.calendar_api_key.is_empty()
    }
}

impl ClinicConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            opening_time: parse_time_var("CLINIC_OPENING_TIME", defaults.opening_time),
            closing_time: parse_time_var("CLINIC_CLOSING_TIME", defaults.closing_time),
            closed_weekday: parse_weekday_var("CLINIC_CLOSED_WEEKDAY", defaults.closed_weekday),
            review_token_ttl_days: parse_i64_var(
                "REVIEW_TOKEN_TTL_DAYS",
                defaults.review_token_ttl_days,
            ),
            duplicate_submission_grace_minutes: parse_i64_var(
                "DUPLICATE_SUBMISSION_GRACE_MINUTES",
                defaults.duplicate_submission_grace_minutes,
            ),
        }
    }
}

fn parse_time_var(key: &str, default: NaiveTime) -> NaiveTime {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").unwrap_or_else(|_| {
            warn!("{} is not a valid HH:MM time, using default", key);
            default
        }),
        Err(_) => default,
    }
}

fn parse_weekday_var(key: &str, default: Weekday) -> Weekday {
    match env::var(key) {
        Ok(raw) => raw.parse::<Weekday>().unwrap_or_else(|_| {
            warn!("{} is not a valid weekday name, using default", key);
            default
        }),
        Err(_) => default,
    }
}

fn parse_i64_var(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(raw) => raw.parse::<i64>().unwrap_or_else(|_| {
            warn!("{} is not a valid integer, using default", key);
            default
        }),
        Err(_) => default,
    }
}
