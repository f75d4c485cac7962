use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SlackField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SlackAttachment {
    pub color: String,
    pub title: String,
    pub fields: Vec<SlackField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// Message posted to the chat webhook
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SlackMessage {
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<SlackAttachment>,
}

/// Request payload for forwarding a message to the chat webhook
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SlackSendRequest {
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SlackSendResponse {
    pub success: bool,
    pub message: String,
}

/// Request payload for exporting session feedback to chat
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlackExportRequest {
    /// Overrides the candidate name derived from the participant list.
    #[serde(default)]
    pub candidate_name: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SlackExportResponse {
    pub success: bool,
    pub message: SlackMessage,
}
