use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_QUERIES_DIR: &str = "queries";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "no data source configured: set SUPABASE_URL and SUPABASE_API_KEY, or DATABASE_URL, or both"
    )]
    NoSource,

    #[error("SUPABASE_URL and SUPABASE_API_KEY must be set together ({0} is missing)")]
    PartialGateway(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration, resolved once at startup
///
/// Everything the data-access layer needs is read here and passed down
/// explicitly; no module looks at the environment after this point.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the hosted REST gateway (`SUPABASE_URL`)
    pub supabase_url: Option<String>,

    /// API key for the gateway (`SUPABASE_API_KEY`)
    pub supabase_api_key: Option<String>,

    /// Connection string for the direct database variant (`DATABASE_URL`)
    pub database_url: Option<String>,

    /// Listen address for the web server (`DASHBOARD_ADDR`)
    pub addr: String,

    /// Directory holding the catalog SQL files (`DASHBOARD_QUERIES_DIR`)
    pub queries_dir: String,

    /// Time-to-live for cached table fetches (`DASHBOARD_CACHE_TTL_SECS`)
    pub cache_ttl: Duration,
}

impl DashboardConfig {
    /// Reads the configuration from the environment
    ///
    /// At least one data source must be configured. The gateway pair is
    /// all-or-nothing; a URL without a key (or vice versa) is rejected
    /// rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = non_empty_var("SUPABASE_URL");
        let supabase_api_key = non_empty_var("SUPABASE_API_KEY");
        let database_url = non_empty_var("DATABASE_URL");

        match (&supabase_url, &supabase_api_key) {
            (Some(_), None) => return Err(ConfigError::PartialGateway("SUPABASE_API_KEY")),
            (None, Some(_)) => return Err(ConfigError::PartialGateway("SUPABASE_URL")),
            _ => {}
        }

        if supabase_url.is_none() && database_url.is_none() {
            return Err(ConfigError::NoSource);
        }

        let cache_ttl_secs = match non_empty_var("DASHBOARD_CACHE_TTL_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "DASHBOARD_CACHE_TTL_SECS",
                value: raw,
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        Ok(DashboardConfig {
            supabase_url,
            supabase_api_key,
            database_url,
            addr: non_empty_var("DASHBOARD_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            queries_dir: non_empty_var("DASHBOARD_QUERIES_DIR")
                .unwrap_or_else(|| DEFAULT_QUERIES_DIR.to_string()),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }

    pub fn has_gateway(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_api_key.is_some()
    }

    pub fn has_direct(&self) -> bool {
        self.database_url.is_some()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
