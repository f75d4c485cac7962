use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for running code in the sandbox
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, alias = "source")]
    pub code: Option<String>,
    #[serde(default)]
    pub stdin: Option<String>,
}

/// Result of a sandbox run
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
    pub signal: Option<String>,
    pub compile_output: String,
}
