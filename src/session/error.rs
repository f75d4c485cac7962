use crate::store::{rules::AccessDenied, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session code '{0}'")]
    InvalidCode(String),

    #[error("Session code not found. Please verify the code with your interviewer.")]
    NotFound(String),

    #[error("Session '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid session. This session was not created by an interviewer.")]
    NotCreated,

    #[error("This session has expired. Please request a new session code from your interviewer.")]
    Expired,

    #[error("This interview session has already ended.")]
    Terminated,

    #[error("{0}")]
    Forbidden(String),

    #[error("Session has ended; the editor is read-only")]
    ReadOnly,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed session data: {0}")]
    Malformed(String),
}

impl From<AccessDenied> for SessionError {
    fn from(e: AccessDenied) -> Self {
        SessionError::Forbidden(e.0)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Malformed(e.to_string())
    }
}
