use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Periodic summary, overwrites the previous one.
    Summary,
    /// Summary written when the candidate leaves; takes precedence on read.
    Final,
    /// One behavioural event, appended to the capped log.
    Log,
}

/// Request payload for saving activity data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivitySaveRequest {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySaveResponse {
    pub success: bool,
    pub message: String,
    pub session_code: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    #[schema(value_type = Option<Object>)]
    pub summary: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub final_summary: Option<Value>,
    #[schema(value_type = Vec<Object>)]
    pub logs: Vec<Value>,
}
