use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::auth::auth::ensure_interviewer;
use crate::error::ApiResult;
use crate::models::{NotesResponse, UpdateNotesRequest};
use crate::services::auth_service::Claims;
use crate::session::records::{get_notes, update_notes};
use crate::state::AppState;

pub async fn get_notes_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> ApiResult<Json<NotesResponse>> {
    let actor = ensure_interviewer(&claims)?;
    Ok(Json(NotesResponse { notes: get_notes(&state.store, &code, &actor)? }))
}

/// Merge a partial update into the interviewer notes
pub async fn update_notes_handler(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    Json(body): Json<UpdateNotesRequest>,
) -> ApiResult<Json<NotesResponse>> {
    let actor = ensure_interviewer(&claims)?;
    let notes = update_notes(&state.store, &code, &actor, &claims.email, body)?;
    Ok(Json(NotesResponse { notes: Some(notes) }))
}
