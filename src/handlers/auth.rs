use axum::{extract::{Extension, State}, http::StatusCode, Json};
use tracing::{error, info, warn};

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{ApiError, ApiResult, AuthError};
use crate::models::{
    LoginRequest, LoginResponse, LogoutResponse, ResetPasswordRequest, ResetPasswordResponse,
    UpdatePasswordRequest, UpdatePasswordResponse, UserInfo, VerifyResponse,
};
use crate::services::auth_service::Claims;
use crate::state::AppState;

const CREDENTIALS_NOT_CONFIGURED: &str = "Interviewer credentials are not configured (ADMIN_EMAIL, ADMIN_PASSWORD_HASH)";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Exchange the interviewer credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let (Some(email), Some(password)) = (non_empty(body.email), non_empty(body.password)) else {
        return Err(ApiError::Validation("Email and password required".to_string()));
    };
    let (Some(admin_email), Some(admin_hash)) =
        (state.config.admin_email.as_deref(), state.config.admin_password_hash.as_deref())
    else {
        return Err(ApiError::NotConfigured(CREDENTIALS_NOT_CONFIGURED.to_string()));
    };

    if email != admin_email {
        warn!("Login attempt for unknown account");
        return Err(AuthError::InvalidCredentials.into());
    }
    let valid = verify_password(&password, admin_hash).map_err(|e| {
        error!("Stored admin password hash is unusable: {}", e);
        ApiError::Internal("Login failed".to_string())
    })?;
    if !valid {
        warn!("Login attempt with a wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let (token, _claims) = state.tokens.issue_access_token(&email)?;
    info!("Interviewer '{}' logged in", email);
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token,
            user: UserInfo { email, is_admin: true, user_id: None },
        }),
    ))
}

/// Echo the identity of a valid access token
pub async fn verify(Extension(claims): Extension<Claims>) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        user: UserInfo { email: claims.email, is_admin: claims.is_admin, user_id: Some(claims.user_id) },
    })
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse { success: true, message: "Logged out successfully".to_string() })
}

/// Issue a password-reset token for the interviewer account
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ResetPasswordResponse>> {
    let Some(email) = non_empty(body.email) else {
        return Err(ApiError::Validation("Email required".to_string()));
    };
    let Some(admin_email) = state.config.admin_email.as_deref() else {
        return Err(ApiError::NotConfigured(CREDENTIALS_NOT_CONFIGURED.to_string()));
    };
    if email != admin_email {
        // Same answer as for the real account.
        return Ok(Json(ResetPasswordResponse {
            success: true,
            message: "If the email exists, a reset link has been sent".to_string(),
            reset_url: None,
        }));
    }

    let token = state.tokens.issue_reset_token(&email)?;
    let reset_url = format!("{}/reset-password?token={}", state.config.app_domain.trim_end_matches('/'), token);
    info!("Password reset token issued");
    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Reset token generated (email service not configured)".to_string(),
        reset_url: (!state.config.is_production()).then_some(reset_url),
    }))
}

/// Validate a reset token and hash the new password
pub async fn update_password(
    State(state): State<AppState>,
    Json(body): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<UpdatePasswordResponse>> {
    let (Some(token), Some(new_password)) = (non_empty(body.token), non_empty(body.new_password)) else {
        return Err(ApiError::Validation("Token and new password required".to_string()));
    };
    validate_password_strength(&new_password).map_err(ApiError::Validation)?;
    let Some(admin_email) = state.config.admin_email.as_deref() else {
        return Err(ApiError::NotConfigured(CREDENTIALS_NOT_CONFIGURED.to_string()));
    };
    state.tokens.validate_reset(&token, admin_email)?;

    let new_hash = hash_password(&new_password).map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;
    info!("Interviewer password updated; store the new hash as ADMIN_PASSWORD_HASH");
    Ok(Json(UpdatePasswordResponse {
        success: true,
        message: "Password updated successfully".to_string(),
        new_hash: (!state.config.is_production()).then_some(new_hash),
    }))
}
