use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use super::{PreservedParticipant, PresenceRecord};

// Store values may hold null where a collection is expected
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Termination latch stored under `sessions/{code}/terminated`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TerminationRecord {
    pub terminated: bool,
    #[serde(default)]
    pub terminated_by: String,
    #[serde(default)]
    pub terminated_at: i64,
}

/// Snapshot of the shared document taken when a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinalCode {
    pub content: String,
    pub language: String,
    pub saved_at: i64,
    pub line_count: usize,
    pub character_count: usize,
    pub saved_by: String,
}

/// Shared editor settings, each field last-write-wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// A session subtree as read from the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub created: Option<i64>,
    pub created_by: Option<String>,
    pub creator_id: Option<String>,
    pub status: Option<String>,
    pub terminated: Option<TerminationRecord>,
    pub settings: Option<Settings>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub users: BTreeMap<String, PresenceRecord>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub preserved_participants: BTreeMap<String, PreservedParticipant>,
    pub final_code: Option<FinalCode>,
}

impl SessionRecord {
    pub fn is_terminated(&self) -> bool {
        self.terminated.as_ref().is_some_and(|t| t.terminated)
    }
}

/// Response for creating a session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub created: i64,
}

/// One row of the interviewer dashboard
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub code: String,
    pub created: i64,
    pub created_by: String,
    pub participants: Vec<String>,
    pub participant_count: usize,
    pub is_terminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<i64>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateSessionResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Editor content captured by the caller ending a session
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalCodeInput {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Request payload for ending a session
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    #[serde(default)]
    pub terminated_by: Option<String>,
    #[serde(default)]
    pub final_code: Option<FinalCodeInput>,
}

/// Response returned after ending a session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResponse {
    pub success: bool,
    pub already_terminated: bool,
    pub terminated: TerminationRecord,
}

/// Response returned after deleting sessions
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub deleted: usize,
}
