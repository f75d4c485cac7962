use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::error::ApiError;
use crate::models::ExecuteResponse;

const COMPILE_TIMEOUT_MS: i64 = 10_000;
const RUN_TIMEOUT_MS: i64 = 3_000;

/// Editor language ids that the sandbox names differently.
pub fn sandbox_language(editor_language: &str) -> &str {
    match editor_language {
        "c_cpp" => "cpp",
        other => other,
    }
}

#[derive(Debug, Serialize)]
struct SandboxFile<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct SandboxRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<SandboxFile<'a>>,
    stdin: &'a str,
    args: Vec<String>,
    compile_timeout: i64,
    run_timeout: i64,
    compile_memory_limit: i64,
    run_memory_limit: i64,
}

#[derive(Debug, Default, Deserialize)]
struct SandboxStage {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    signal: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SandboxResult {
    #[serde(default)]
    run: Option<SandboxStage>,
    #[serde(default)]
    compile: Option<SandboxStage>,
}

/// Forwards code to a Piston-compatible execution API.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    base_url: String,
}

impl SandboxClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build sandbox client: {}", e)))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub async fn execute(&self, language: &str, code: &str, stdin: &str) -> Result<ExecuteResponse, ApiError> {
        let language = sandbox_language(language);
        let request = SandboxRequest {
            language,
            version: "*",
            files: vec![SandboxFile { content: code }],
            stdin,
            args: Vec::new(),
            compile_timeout: COMPILE_TIMEOUT_MS,
            run_timeout: RUN_TIMEOUT_MS,
            compile_memory_limit: -1,
            run_memory_limit: -1,
        };
        let url = format!("{}/execute", self.base_url);
        info!("Executing {} bytes of {} in the sandbox", code.len(), language);

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!("Sandbox request failed: {}", e);
            ApiError::Internal(format!("Sandbox request failed: {}", e))
        })?;
        if !response.status().is_success() {
            let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            let details = response.text().await.unwrap_or_default();
            error!("Sandbox API error ({}): {}", status, details);
            return Err(ApiError::Upstream { status, message: "Code execution failed".to_string(), details });
        }
        let result: SandboxResult = response
            .json()
            .await
            .map_err(|e| ApiError::Internal(format!("Invalid sandbox response: {}", e)))?;

        let run = result.run.unwrap_or_default();
        let compile = result.compile.unwrap_or_default();
        Ok(ExecuteResponse {
            success: true,
            output: run.output.unwrap_or_default(),
            stdout: run.stdout.unwrap_or_default(),
            stderr: run.stderr.unwrap_or_default(),
            exit_code: run.code,
            signal: run.signal,
            compile_output: compile.output.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_language_ids_are_mapped() {
        assert_eq!(sandbox_language("c_cpp"), "cpp");
        assert_eq!(sandbox_language("python"), "python");
        assert_eq!(sandbox_language("elixir"), "elixir");
    }

    #[test]
    fn request_body_matches_sandbox_format() {
        let request = SandboxRequest {
            language: "python",
            version: "*",
            files: vec![SandboxFile { content: "print(1+1)" }],
            stdin: "",
            args: Vec::new(),
            compile_timeout: COMPILE_TIMEOUT_MS,
            run_timeout: RUN_TIMEOUT_MS,
            compile_memory_limit: -1,
            run_memory_limit: -1,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["files"][0]["content"], "print(1+1)");
        assert_eq!(body["version"], "*");
        assert_eq!(body["run_timeout"], 3000);
        assert_eq!(body["compile_memory_limit"], -1);
    }
}
