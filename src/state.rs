use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::clients::chat_webhook_client::ChatWebhookClient;
use crate::clients::sandbox_client::SandboxClient;
use crate::config::Config;
use crate::error::ApiError;
use crate::services::auth_service::{random_hex, TokenService};
use crate::services::login_tracker::LoginTracker;
use crate::store::RealtimeStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: RealtimeStore,
    pub tokens: TokenService,
    /// Salt for client address hashes.
    pub ip_salt: String,
    pub login_tracker: LoginTracker,
    pub sandbox: SandboxClient,
    pub chat: ChatWebhookClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        Self::with_store(config, RealtimeStore::new())
    }

    pub fn with_store(config: Config, store: RealtimeStore) -> Result<Self, ApiError> {
        let secret = match config.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => secret.to_string(),
            None => {
                warn!("JWT_SECRET not set, using a random secret; tokens will not survive a restart");
                random_hex(32)
            }
        };
        let tokens = TokenService::new(
            &secret,
            chrono::Duration::hours(config.token_ttl_hours),
            chrono::Duration::minutes(config.reset_token_ttl_minutes),
        );
        let login_tracker = LoginTracker::new(
            Duration::from_secs(config.duplicate_login_window_secs),
            Duration::from_secs(config.duplicate_login_idle_secs),
        );
        let sandbox = SandboxClient::new(&config.sandbox_api_url, config.sandbox_timeout())?;
        let chat = ChatWebhookClient::new(config.slack_webhook_url.clone())?;
        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            ip_salt: secret,
            login_tracker,
            sandbox,
            chat,
        })
    }
}
