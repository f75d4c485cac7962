use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::auth::auth::ensure_interviewer;
use crate::error::ApiResult;
use crate::models::{ActivityResponse, ActivitySaveRequest, ActivitySaveResponse};
use crate::services::auth_service::Claims;
use crate::session::records::{get_activity, save_activity};
use crate::state::AppState;
use crate::store::rules::Actor;

/// Store candidate activity; open to candidates without a token
pub async fn save_activity_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<ActivitySaveRequest>,
) -> ApiResult<Json<ActivitySaveResponse>> {
    save_activity(&state.store, &code, &Actor::standard(), body.kind, body.data, state.config.activity_log_limit)?;
    Ok(Json(ActivitySaveResponse {
        success: true,
        message: "Activity data saved".to_string(),
        session_code: code,
    }))
}

pub async fn get_activity_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> ApiResult<Json<ActivityResponse>> {
    let actor = ensure_interviewer(&claims)?;
    Ok(Json(get_activity(&state.store, &code, &actor)?))
}
