use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::auth::ensure_interviewer;
use crate::error::ApiResult;
use crate::models::{
    CreateSessionResponse, DeleteSessionResponse, EndSessionRequest, EndSessionResponse, Role,
    SessionListResponse, ValidateSessionResponse,
};
use crate::services::auth_service::Claims;
use crate::session::lifecycle::{create_session, delete_all_sessions, delete_session, list_sessions, validate_session, Creator};
use crate::session::termination::end_session;
use crate::session::{SessionError, DASHBOARD_TERMINATOR};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default)]
    archived: bool,
}

#[derive(Deserialize)]
pub struct ValidateSessionQuery {
    #[serde(default)]
    role: Role,
}

/// Create a session under a fresh code
pub async fn create_session_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    ensure_interviewer(&claims)?;
    let creator = Creator { name: claims.email.clone(), id: claims.user_id.clone() };
    let (code, created) = create_session(&state.store, &creator)?;
    Ok((StatusCode::OK, Json(CreateSessionResponse { success: true, session_id: code, created })))
}

/// Dashboard listing of active or ended sessions
pub async fn list_sessions_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListSessionsQuery>,
) -> ApiResult<Json<SessionListResponse>> {
    ensure_interviewer(&claims)?;
    Ok(Json(SessionListResponse { sessions: list_sessions(&state.store, query.archived) }))
}

/// Whether a participant with `role` may join
pub async fn validate_session_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ValidateSessionQuery>,
) -> ApiResult<Json<ValidateSessionResponse>> {
    let now = Utc::now().timestamp_millis();
    match validate_session(&state.store, &code, query.role, state.config.session_max_age(), now) {
        Ok(_) => Ok(Json(ValidateSessionResponse { valid: true, error: None })),
        Err(e @ (SessionError::Store(_) | SessionError::Malformed(_))) => Err(e.into()),
        Err(e) => {
            info!("Session '{}' rejected for {}: {}", code, query.role, e);
            Ok(Json(ValidateSessionResponse { valid: false, error: Some(e.to_string()) }))
        }
    }
}

/// End a session from the dashboard
pub async fn end_session_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    body: Option<Json<EndSessionRequest>>,
) -> ApiResult<Json<EndSessionResponse>> {
    let actor = ensure_interviewer(&claims)?;
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let terminated_by = request
        .terminated_by
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DASHBOARD_TERMINATOR.to_string());
    let outcome = end_session(&state.store, &code, &actor, &terminated_by, request.final_code)?;
    Ok(Json(EndSessionResponse {
        success: true,
        already_terminated: outcome.already_terminated,
        terminated: outcome.record,
    }))
}

/// Permanently delete one session
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> ApiResult<Json<DeleteSessionResponse>> {
    ensure_interviewer(&claims)?;
    if !delete_session(&state.store, &code)? {
        return Err(SessionError::NotFound(code).into());
    }
    Ok(Json(DeleteSessionResponse { success: true, deleted: 1 }))
}

/// Permanently delete every session
pub async fn delete_all_sessions_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<DeleteSessionResponse>> {
    ensure_interviewer(&claims)?;
    let deleted = delete_all_sessions(&state.store);
    warn!("'{}' deleted all sessions ({})", claims.email, deleted);
    Ok(Json(DeleteSessionResponse { success: true, deleted }))
}
