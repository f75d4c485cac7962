use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Request payload for recording a session tracking event
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackSessionRequest {
    #[serde(default)]
    pub session_code: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// `join`, `leave`, `end`, `login_attempt`, ...
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SecurityFlag {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub detail: String,
}

/// Tracking record stored under `sessions/{code}/tracking`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRecord {
    pub session_code: String,
    pub user_id: String,
    pub user_name: String,
    pub event_type: String,
    /// Salted hash of the primary client IP.
    pub ip: String,
    pub ip_count: usize,
    pub all_ips: Vec<String>,
    pub user_agent: String,
    pub language: String,
    pub timestamp: i64,
    #[serde(rename = "timestampISO")]
    pub timestamp_iso: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub security_flags: Vec<SecurityFlag>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSummary {
    pub session_code: String,
    pub user_id: String,
    pub event_type: String,
    pub ip: String,
    pub device: String,
    pub security_flags: usize,
    pub timestamp: i64,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackSessionResponse {
    pub success: bool,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracked: Option<TrackedSummary>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginAction {
    Login,
    Heartbeat,
    Logout,
    Check,
}

impl LoginAction {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "login" => Some(Self::Login),
            "heartbeat" => Some(Self::Heartbeat),
            "logout" => Some(Self::Logout),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

/// Request payload for the duplicate-login check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateLoginRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub session_code: Option<String>,
    /// One of `login`, `heartbeat`, `logout`, `check`.
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginSessionInfo {
    pub login_time: i64,
    pub last_activity: i64,
    pub device: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateLoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<LoginSessionInfo>,
}
