use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{
    activity::{get_activity_handler, save_activity_handler},
    auth::{login, logout, reset_password, update_password, verify},
    code_execute::execute_code,
    diagnostics::diagnostics,
    notes::{get_notes_handler, update_notes_handler},
    sessions::{
        create_session_handler, delete_all_sessions_handler, delete_session_handler, end_session_handler,
        list_sessions_handler, validate_session_handler,
    },
    slack::{export_session_to_slack, send_to_slack},
    tracking::{check_duplicate_login, track_session},
};
use crate::routes::auth_middleware::auth_middleware;
use crate::state::AppState;
use crate::ws::live_session;

/// Create API routes
pub fn create_api_routes(state: AppState) -> Router<AppState> {
    let public = Router::<AppState>::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/update-password", post(update_password))
        .route("/sessions/:code/validate", get(validate_session_handler))
        .route("/sessions/:code/live", get(live_session))
        .route("/activity/:code", post(save_activity_handler))
        .route("/track-session", post(track_session))
        .route("/check-duplicate-login", post(check_duplicate_login))
        .route("/code/execute", post(execute_code))
        .route("/slack/send", post(send_to_slack));

    let protected = Router::<AppState>::new()
        .route("/auth/verify", get(verify))
        .route(
            "/sessions",
            get(list_sessions_handler).post(create_session_handler).delete(delete_all_sessions_handler),
        )
        .route("/sessions/:code", delete(delete_session_handler))
        .route("/sessions/:code/end", post(end_session_handler))
        .route("/sessions/:code/notes", get(get_notes_handler).put(update_notes_handler))
        .route("/sessions/:code/export/slack", post(export_session_to_slack))
        .route("/activity/:code", get(get_activity_handler))
        .route("/v1/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware)); // Applies to all routes added above

    public.merge(protected)
}
