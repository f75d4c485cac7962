use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::error::{ApiError, AuthError};
use crate::services::auth_service::get_auth_token;
use crate::state::AppState;

/// Require a valid access token and expose its claims to downstream handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Get the auth token from the request
    let token = get_auth_token(req.headers())?;

    // 2. Validate it
    let claims = state.tokens.validate(&token)?;

    // 3. Password-reset tokens only unlock the update-password endpoint
    if claims.token_type.is_some() {
        warn!("Rejected a '{}' token on a protected route", claims.token_type.as_deref().unwrap_or_default());
        return Err(AuthError::InvalidToken.into());
    }
    debug!("Access token validated for '{}'", claims.email);

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
