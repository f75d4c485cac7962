use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::models::ErrorResponse;
use crate::session::SessionError;
use crate::store::{rules::AccessDenied, StoreError};

/// Authentication failures, all rendered as 401.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,
}

/// Error returned by every HTTP handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: String,
    },

    #[error("{0}")]
    NotConfigured(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => *status,
            ApiError::NotConfigured(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            ApiError::Upstream { details, .. } => Some(details.clone()),
            ApiError::NotConfigured(msg) => {
                error!("Service not configured: {}", msg);
                None
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                None
            }
            _ => None,
        };
        (
            status,
            Json(ErrorResponse {
                code: status.as_u16(),
                status: status.to_string(),
                error: self.to_string(),
                details,
            }),
        )
            .into_response()
    }
}

impl From<AccessDenied> for ApiError {
    fn from(e: AccessDenied) -> Self {
        ApiError::Forbidden(e.0)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => ApiError::NotFound(e.to_string()),
            SessionError::InvalidCode(_)
            | SessionError::AlreadyExists(_)
            | SessionError::NotCreated
            | SessionError::Expired
            | SessionError::Terminated => ApiError::Validation(e.to_string()),
            SessionError::Forbidden(msg) => ApiError::Forbidden(msg),
            SessionError::ReadOnly => ApiError::Forbidden(e.to_string()),
            SessionError::Store(inner) => inner.into(),
            SessionError::Malformed(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(AuthError::TokenExpired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotConfigured("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        let upstream = ApiError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: "Code execution failed".into(),
            details: "boom".into(),
        };
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(upstream.to_string(), "Code execution failed");
    }

    #[test]
    fn session_errors_map_to_http_errors() {
        assert_eq!(ApiError::from(SessionError::NotFound("1".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(SessionError::Terminated).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(SessionError::ReadOnly).status(), StatusCode::FORBIDDEN);
    }
}
