//! Application configuration management.
//!
//! Configuration is loaded from environment variables with the `envy` crate,
//! after an optional `.env` file has been read by `dotenvy`.

use serde::Deserialize;
use url::Url;

use crate::models::access_key::{Plan, PlanLimits};

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it the
///   service keeps keys and counters in process memory only.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `FREE_DAILY_LIMIT` / `PRO_DAILY_LIMIT` (optional): daily quotas per plan
/// - `ADMIN_KEY` (optional): shared secret for the admin listing
/// - `GENERATION_URL`, `GENERATION_TOKEN` (optional): text-generation endpoint
/// - `USAGE_RETENTION_DAYS` (optional): prune usage counters older than this
/// - `CORS_ALLOWED_ORIGINS` (optional): comma-separated browser origins
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: i64,

    #[serde(default = "default_pro_daily_limit")]
    pub pro_daily_limit: i64,

    /// Static shared secret compared for equality. Not suitable for
    /// production access control.
    pub admin_key: Option<String>,

    pub generation_url: Option<Url>,

    pub generation_token: Option<String>,

    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    #[serde(default = "default_generation_max_new_tokens")]
    pub generation_max_new_tokens: u32,

    #[serde(default = "default_generation_temperature")]
    pub generation_temperature: f32,

    pub usage_retention_days: Option<u32>,

    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_free_daily_limit() -> i64 {
    Plan::DEFAULT_FREE_DAILY_LIMIT
}

fn default_pro_daily_limit() -> i64 {
    Plan::DEFAULT_PRO_DAILY_LIMIT
}

fn default_generation_timeout_secs() -> u64 {
    60
}

fn default_generation_max_new_tokens() -> u32 {
    500
}

fn default_generation_temperature() -> f32 {
    0.6
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed into
    /// its expected type (e.g. a non-numeric `SERVER_PORT`).
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }

    /// Daily limits per plan, as configured.
    pub fn plan_limits(&self) -> PlanLimits {
        PlanLimits {
            free: self.free_daily_limit,
            pro: self.pro_daily_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_variables_are_missing() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();

        assert!(config.database_url.is_none());
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.free_daily_limit, 10);
        assert_eq!(config.pro_daily_limit, 999_999);
        assert!(config.admin_key.is_none());
        assert!(config.generation_url.is_none());
        assert!(config.usage_retention_days.is_none());
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    fn parses_overrides() {
        let vars = vec![
            ("SERVER_PORT".to_string(), "8080".to_string()),
            ("FREE_DAILY_LIMIT".to_string(), "3".to_string()),
            ("ADMIN_KEY".to_string(), "s3cret".to_string()),
            (
                "GENERATION_URL".to_string(),
                "http://localhost:9000/generate".to_string(),
            ),
            ("USAGE_RETENTION_DAYS".to_string(), "30".to_string()),
            (
                "CORS_ALLOWED_ORIGINS".to_string(),
                "https://app.example.com,http://localhost:3000".to_string(),
            ),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.plan_limits().free, 3);
        assert_eq!(config.plan_limits().pro, 999_999);
        assert_eq!(config.admin_key.as_deref(), Some("s3cret"));
        assert_eq!(
            config.generation_url.map(|u| u.to_string()),
            Some("http://localhost:9000/generate".to_string())
        );
        assert_eq!(config.usage_retention_days, Some(30));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://app.example.com", "http://localhost:3000"]
        );
    }

    #[test]
    fn rejects_malformed_generation_url() {
        let vars = vec![("GENERATION_URL".to_string(), "not a url".to_string())];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }
}
