use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::auth::auth::ensure_interviewer;
use crate::error::{ApiError, ApiResult};
use crate::models::{SlackExportRequest, SlackExportResponse, SlackSendRequest, SlackSendResponse};
use crate::services::auth_service::Claims;
use crate::services::feedback_export::{candidate_name, feedback_message};
use crate::session::lifecycle::read_session;
use crate::session::records::{get_activity, get_notes};
use crate::session::SessionError;
use crate::state::AppState;

/// Forward a message to the chat webhook
pub async fn send_to_slack(
    State(state): State<AppState>,
    Json(body): Json<SlackSendRequest>,
) -> ApiResult<Json<SlackSendResponse>> {
    state.chat.ensure_configured()?;
    let payload = body
        .payload
        .filter(|p| p.get("text").and_then(Value::as_str).is_some_and(|t| !t.is_empty()))
        .ok_or_else(|| ApiError::Validation("Invalid payload".to_string()))?;
    state.chat.send(&payload).await?;
    Ok(Json(SlackSendResponse { success: true, message: "Successfully sent to Slack".to_string() }))
}

/// Post the interview feedback for one session to the chat webhook
pub async fn export_session_to_slack(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    body: Option<Json<SlackExportRequest>>,
) -> ApiResult<Json<SlackExportResponse>> {
    let actor = ensure_interviewer(&claims)?;
    state.chat.ensure_configured()?;
    let session = read_session(&state.store, &code)?.ok_or_else(|| SessionError::NotFound(code.clone()))?;

    let candidate = body
        .and_then(|Json(b)| b.candidate_name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| candidate_name(&session));
    let notes = get_notes(&state.store, &code, &actor)?;
    let activity = get_activity(&state.store, &code, &actor)?;
    let message = feedback_message(&code, &candidate, notes.as_ref(), activity.summary.as_ref());

    state.chat.send(&message).await?;
    info!("Feedback for session '{}' exported by '{}'", code, claims.email);
    Ok(Json(SlackExportResponse { success: true, message }))
}
