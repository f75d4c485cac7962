use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Interviewer login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token issued", body = LoginResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn login_doc() {}

/// Verify an access token
#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "auth",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn verify_doc() {}

/// Logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse)
    )
)]
#[allow(dead_code)]
pub async fn logout_doc() {}

/// Request a password reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Reset requested", body = ResetPasswordResponse),
        (status = 400, description = "Email missing", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn reset_password_doc() {}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/update-password",
    tag = "auth",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password hash generated", body = UpdatePasswordResponse),
        (status = 400, description = "Weak password or missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid or expired reset token", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn update_password_doc() {}

/// Create a session
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Session created", body = CreateSessionResponse),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn create_session_doc() {}

/// List sessions
#[utoipa::path(
    get,
    path = "/api/sessions",
    tag = "sessions",
    params(("archived" = Option<bool>, Query, description = "List ended sessions instead of active ones")),
    responses(
        (status = 200, description = "Sessions", body = SessionListResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn list_sessions_doc() {}

/// Delete every session
#[utoipa::path(
    delete,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Sessions deleted", body = DeleteSessionResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn delete_all_sessions_doc() {}

/// Check whether a participant may join
#[utoipa::path(
    get,
    path = "/api/sessions/{code}/validate",
    tag = "sessions",
    params(
        ("code" = String, Path, description = "Session code"),
        ("role" = Option<Role>, Query, description = "Joining role, defaults to candidate")
    ),
    responses(
        (status = 200, description = "Validation result", body = ValidateSessionResponse)
    )
)]
#[allow(dead_code)]
pub async fn validate_session_doc() {}

/// End a session
#[utoipa::path(
    post,
    path = "/api/sessions/{code}/end",
    tag = "sessions",
    params(("code" = String, Path, description = "Session code")),
    request_body = EndSessionRequest,
    responses(
        (status = 200, description = "Session ended (or already ended)", body = EndSessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn end_session_doc() {}

/// Delete a session
#[utoipa::path(
    delete,
    path = "/api/sessions/{code}",
    tag = "sessions",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Session deleted", body = DeleteSessionResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn delete_session_doc() {}

/// Read interviewer notes
#[utoipa::path(
    get,
    path = "/api/sessions/{code}/notes",
    tag = "sessions",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Notes, null when none were written", body = NotesResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn get_notes_doc() {}

/// Update interviewer notes
#[utoipa::path(
    put,
    path = "/api/sessions/{code}/notes",
    tag = "sessions",
    params(("code" = String, Path, description = "Session code")),
    request_body = UpdateNotesRequest,
    responses(
        (status = 200, description = "Merged notes", body = NotesResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn update_notes_doc() {}

/// Export interview feedback to chat
#[utoipa::path(
    post,
    path = "/api/sessions/{code}/export/slack",
    tag = "integrations",
    params(("code" = String, Path, description = "Session code")),
    request_body = SlackExportRequest,
    responses(
        (status = 200, description = "Feedback posted", body = SlackExportResponse),
        (status = 500, description = "Webhook not configured", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn export_slack_doc() {}

/// Save candidate activity
#[utoipa::path(
    post,
    path = "/api/activity/{code}",
    tag = "activity",
    params(("code" = String, Path, description = "Session code")),
    request_body = ActivitySaveRequest,
    responses(
        (status = 200, description = "Activity stored", body = ActivitySaveResponse),
        (status = 404, description = "Session not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn save_activity_doc() {}

/// Read candidate activity
#[utoipa::path(
    get,
    path = "/api/activity/{code}",
    tag = "activity",
    params(("code" = String, Path, description = "Session code")),
    responses(
        (status = 200, description = "Activity overview", body = ActivityResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn get_activity_doc() {}

/// Record a tracking event
#[utoipa::path(
    post,
    path = "/api/track-session",
    tag = "activity",
    request_body = TrackSessionRequest,
    responses(
        (status = 200, description = "Event tracked or skipped", body = TrackSessionResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn track_session_doc() {}

/// Duplicate login check
#[utoipa::path(
    post,
    path = "/api/check-duplicate-login",
    tag = "activity",
    request_body = DuplicateLoginRequest,
    responses(
        (status = 200, description = "Action applied", body = DuplicateLoginResponse),
        (status = 400, description = "Missing fields or invalid action", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn check_duplicate_login_doc() {}

/// Run code in the sandbox
#[utoipa::path(
    post,
    path = "/api/code/execute",
    tag = "integrations",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Execution result", body = ExecuteResponse),
        (status = 400, description = "Missing fields or source too large", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn execute_code_doc() {}

/// Forward a message to chat
#[utoipa::path(
    post,
    path = "/api/slack/send",
    tag = "integrations",
    request_body = SlackSendRequest,
    responses(
        (status = 200, description = "Message delivered", body = SlackSendResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 500, description = "Webhook not configured", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn send_slack_doc() {}

/// Service diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Diagnostics", body = DiagnosticsResponse)
    ),
    security(("bearer" = []))
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        login_doc,
        verify_doc,
        logout_doc,
        reset_password_doc,
        update_password_doc,
        create_session_doc,
        list_sessions_doc,
        delete_all_sessions_doc,
        validate_session_doc,
        end_session_doc,
        delete_session_doc,
        get_notes_doc,
        update_notes_doc,
        export_slack_doc,
        save_activity_doc,
        get_activity_doc,
        track_session_doc,
        check_duplicate_login_doc,
        execute_code_doc,
        send_slack_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse, ErrorResponse, DiagnosticsResponse,
            LoginRequest, LoginResponse, UserInfo, VerifyResponse, LogoutResponse,
            ResetPasswordRequest, ResetPasswordResponse, UpdatePasswordRequest, UpdatePasswordResponse,
            Role, Participant, PreservedParticipant, TerminationRecord, FinalCode, Settings,
            CreateSessionResponse, SessionSummary, SessionListResponse, ValidateSessionResponse,
            FinalCodeInput, EndSessionRequest, EndSessionResponse, DeleteSessionResponse,
            NotesRating, InterviewerNotes, UpdateNotesRequest, NotesResponse,
            ActivityKind, ActivitySaveRequest, ActivitySaveResponse, ActivityResponse,
            TrackSessionRequest, SecurityFlag, TrackingRecord, TrackedSummary, TrackSessionResponse,
            LoginAction, DuplicateLoginRequest, LoginSessionInfo, DuplicateLoginResponse,
            ExecuteRequest, ExecuteResponse,
            SlackField, SlackAttachment, SlackMessage, SlackSendRequest, SlackSendResponse,
            SlackExportRequest, SlackExportResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Interviewer authentication"),
        (name = "sessions", description = "Session lifecycle and interviewer records"),
        (name = "activity", description = "Candidate activity and tracking"),
        (name = "integrations", description = "Code execution and chat export"),
        (name = "diagnostics", description = "Service diagnostics")
    )
)]
pub struct ApiDoc;
