use axum::{extract::State, Json};

use crate::error::{ApiError, ApiResult};
use crate::models::{ExecuteRequest, ExecuteResponse};
use crate::state::AppState;

/// Run a snippet in the sandbox and relay its output
pub async fn execute_code(
    State(state): State<AppState>,
    Json(body): Json<ExecuteRequest>,
) -> ApiResult<Json<ExecuteResponse>> {
    let (Some(language), Some(code)) = (
        body.language.filter(|l| !l.is_empty()),
        body.code.filter(|c| !c.is_empty()),
    ) else {
        return Err(ApiError::Validation("Language and code are required".to_string()));
    };
    let max = state.config.max_source_bytes;
    if code.len() > max {
        return Err(ApiError::Validation(format!("Code too large (max {}KB)", max / 1000)));
    }
    let result = state.sandbox.execute(&language, &code, body.stdin.as_deref().unwrap_or_default()).await?;
    Ok(Json(result))
}
