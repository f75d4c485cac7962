use axum::http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

use crate::error::ApiError;

pub const NOT_CONFIGURED: &str = "Slack integration not configured. Please contact administrator.";

/// Posts messages to the team-chat incoming webhook.
#[derive(Debug, Clone)]
pub struct ChatWebhookClient {
    client: Client,
    webhook_url: Option<String>,
}

impl ChatWebhookClient {
    pub fn new(webhook_url: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build webhook client: {}", e)))?;
        Ok(Self { client, webhook_url: webhook_url.filter(|url| !url.trim().is_empty()) })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub fn ensure_configured(&self) -> Result<&str, ApiError> {
        self.webhook_url.as_deref().ok_or_else(|| ApiError::NotConfigured(NOT_CONFIGURED.to_string()))
    }

    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), ApiError> {
        let url = self.ensure_configured()?;
        let response = self.client.post(url).json(payload).send().await.map_err(|e| {
            error!("Webhook request failed: {}", e);
            ApiError::Internal(format!("Webhook request failed: {}", e))
        })?;
        if !response.status().is_success() {
            let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let details = response.text().await.unwrap_or_default();
            error!("Slack API error ({}): {}", status, details);
            return Err(ApiError::Upstream { status, message: "Failed to send to Slack".to_string(), details });
        }
        info!("Message delivered to the chat webhook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_webhook_is_not_configured() {
        let client = ChatWebhookClient::new(Some("  ".to_string())).unwrap();
        assert!(!client.is_configured());
        let err = client.ensure_configured().unwrap_err();
        assert_eq!(err.to_string(), NOT_CONFIGURED);
        assert!(ChatWebhookClient::new(Some("http://hooks.example/x".into())).unwrap().is_configured());
    }
}
