use std::env;

use dotenvy::dotenv;

use crate::scoring::DEFAULT_DAYS_WHEN_URGENT;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_root_path: String,
    pub host: String,
    pub port: u16,
    /// Urgency window passed to the scoring engine.
    pub days_when_urgent: f64,
    /// How often open tasks get rescored. Zero turns the ticker off.
    pub rescore_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_root_path: "./data".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3069,
            days_when_urgent: DEFAULT_DAYS_WHEN_URGENT,
            rescore_interval_secs: 300,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Self::default();

        let database_root_path =
            env::var("DATABASE_ROOT_PATH").unwrap_or(defaults.database_root_path);

        let host = env::var("HOST").unwrap_or(defaults.host);

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>()?,
            Err(_) => defaults.port,
        };

        let days_when_urgent = match env::var("DAYS_WHEN_URGENT") {
            Ok(raw) => raw.parse::<f64>()?,
            Err(_) => defaults.days_when_urgent,
        };
        if !(days_when_urgent > 0.0) {
            return Err(format!("DAYS_WHEN_URGENT must be positive, got {days_when_urgent}").into());
        }

        let rescore_interval_secs = match env::var("RESCORE_INTERVAL_SECS") {
            Ok(raw) => raw.parse::<u64>()?,
            Err(_) => defaults.rescore_interval_secs,
        };

        Ok(Self {
            database_root_path,
            host,
            port,
            days_when_urgent,
            rescore_interval_secs,
        })
    }
}
