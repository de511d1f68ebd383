use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    // Plant backend
    pub backend_base_url: String,
    pub probe_path: String,
    pub request_timeout_seconds: u64,
    pub sensor_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,

    // Connectivity monitor
    pub check_interval_seconds: u64,
    pub retry_interval_seconds: u64,
    pub max_retries: u32,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_entries: u64,

    // Sensor stabilization
    pub stale_window_seconds: u64,
    pub jump_warn_pct: f64,
    pub sensor_tags: Vec<String>,

    // Poll scheduler
    pub base_tick_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,
}

/// Plant sensor tags polled by default: pressure (PT), temperature (TT),
/// level (LT) and flow (FT) transmitters on biodigesters 040 and 050.
const DEFAULT_SENSOR_TAGS: &str = "040PT01,050PT01,040TT01,050TT01,040LT01,050LT01,040FT01,050FT01";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Plant backend
            backend_base_url: env::var("SIBIA_BACKEND_URL")
                .map_err(|_| ConfigError::Missing("SIBIA_BACKEND_URL"))?,
            probe_path: env::var("SIBIA_PROBE_PATH").unwrap_or_else(|_| "/ping".to_string()),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            sensor_timeout_seconds: env::var("SENSOR_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            probe_timeout_seconds: env::var("PROBE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Connectivity monitor
            check_interval_seconds: env::var("CHECK_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            retry_interval_seconds: env::var("RETRY_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            max_retries: env::var("MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),

            // Caching
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(1024),

            // Sensor stabilization
            stale_window_seconds: env::var("STALE_WINDOW_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            jump_warn_pct: env::var("JUMP_WARN_PCT")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20.0),
            sensor_tags: env::var("SIBIA_SENSOR_TAGS")
                .unwrap_or_else(|_| DEFAULT_SENSOR_TAGS.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            // Poll scheduler
            base_tick_seconds: env::var("BASE_TICK_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // API settings
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
