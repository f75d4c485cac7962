use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response for an error
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
    /// Upstream response body, when the failure was proxied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
