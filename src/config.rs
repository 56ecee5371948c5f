use std::{env, time::Duration};

use anyhow::Context;

use crate::geo::OpenRouteConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub body_limit_bytes: usize,
    pub openroute: OpenRouteConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_or("APP_PORT", 3000);
        let jwt_ttl_hours = parsed_or("JWT_TTL_HOURS", 24);
        let body_limit_bytes = parsed_or("BODY_LIMIT_BYTES", 5 * 1024 * 1024);

        let openroute = OpenRouteConfig {
            base_url: env::var("ORS_BASE_URL")
                .unwrap_or_else(|_| "https://api.openrouteservice.org".to_string()),
            api_key: env::var("ORS_API_KEY").unwrap_or_default(),
            directions_path: env::var("ORS_DIRECTIONS_PATH")
                .unwrap_or_else(|_| "/v2/directions/driving-car".to_string()),
            geocode_path: env::var("ORS_GEOCODE_PATH")
                .unwrap_or_else(|_| "/geocode/search".to_string()),
            timeout: Duration::from_secs(parsed_or("ORS_TIMEOUT_SECS", 10)),
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours,
            body_limit_bytes,
            openroute,
        })
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
