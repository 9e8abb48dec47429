use std::env;

use anyhow::Context;
use chrono::{FixedOffset, Offset, Utc};

/// Restaurant local time is India Standard Time unless configured otherwise.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: Option<String>,
    pub utc_offset: FixedOffset,
    pub payment_webhook_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = non_empty_var("JWT_SECRET");
        if jwt_secret.is_none() {
            tracing::warn!("JWT_SECRET is not set; authenticated routes will fail");
        }
        let offset_minutes = match env::var("RESTAURANT_UTC_OFFSET_MINUTES") {
            Ok(raw) => raw
                .parse::<i32>()
                .with_context(|| format!("invalid RESTAURANT_UTC_OFFSET_MINUTES `{raw}`"))?,
            Err(_) => DEFAULT_UTC_OFFSET_MINUTES,
        };
        let utc_offset = utc_offset_from_minutes(offset_minutes)?;

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            utc_offset,
            payment_webhook_secret: non_empty_var("PAYMENT_WEBHOOK_SECRET"),
        })
    }

    /// Configuration for tests and tools that only need a database.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: None,
            utc_offset: default_utc_offset(),
            payment_webhook_secret: None,
        }
    }
}

pub fn utc_offset_from_minutes(minutes: i32) -> anyhow::Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("UTC offset of {minutes} minutes is out of range"))
}

fn default_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
        .unwrap_or_else(|| Utc.fix())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
