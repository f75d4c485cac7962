use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// HS256 secret for access and reset tokens
    pub jwt_secret: Option<String>,

    /// Interviewer credentials
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,

    /// Public origin used to build password reset links
    #[serde(default = "default_app_domain")]
    pub app_domain: String,

    /// Code-execution sandbox (Piston compatible)
    #[serde(default = "default_sandbox_api_url")]
    pub sandbox_api_url: String,

    #[serde(default = "default_sandbox_timeout_secs")]
    pub sandbox_timeout_secs: u64,

    /// Largest source accepted by the execution proxy
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,

    /// Chat webhook, never exposed to clients
    pub slack_webhook_url: Option<String>,

    /// Candidates may not join sessions older than this
    #[serde(default = "default_session_max_age_minutes")]
    pub session_max_age_minutes: i64,

    #[serde(default = "default_duplicate_login_window_secs")]
    pub duplicate_login_window_secs: u64,

    #[serde(default = "default_duplicate_login_idle_secs")]
    pub duplicate_login_idle_secs: u64,

    #[serde(default = "default_activity_log_limit")]
    pub activity_log_limit: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "prod" || self.environment.to_lowercase() == "production"
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn session_max_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_max_age_minutes)
    }

    pub fn sandbox_timeout(&self) -> Duration {
        Duration::from_secs(self.sandbox_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            log_level: default_log_level(),
            service_name: default_service_name(),
            jwt_secret: None,
            admin_email: None,
            admin_password_hash: None,
            token_ttl_hours: default_token_ttl_hours(),
            reset_token_ttl_minutes: default_reset_token_ttl_minutes(),
            app_domain: default_app_domain(),
            sandbox_api_url: default_sandbox_api_url(),
            sandbox_timeout_secs: default_sandbox_timeout_secs(),
            max_source_bytes: default_max_source_bytes(),
            slack_webhook_url: None,
            session_max_age_minutes: default_session_max_age_minutes(),
            duplicate_login_window_secs: default_duplicate_login_window_secs(),
            duplicate_login_idle_secs: default_duplicate_login_idle_secs(),
            activity_log_limit: default_activity_log_limit(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "opencollab".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_reset_token_ttl_minutes() -> i64 {
    60
}

fn default_app_domain() -> String {
    "http://localhost:3000".to_string()
}

fn default_sandbox_api_url() -> String {
    "https://emkc.org/api/v2/piston".to_string()
}

fn default_sandbox_timeout_secs() -> u64 {
    30
}

fn default_max_source_bytes() -> usize {
    100_000
}

fn default_session_max_age_minutes() -> i64 {
    120
}

fn default_duplicate_login_window_secs() -> u64 {
    5 * 60
}

fn default_duplicate_login_idle_secs() -> u64 {
    30 * 60
}

fn default_activity_log_limit() -> usize {
    100
}
