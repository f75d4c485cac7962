use crate::error::ApiError;
use crate::services::auth_service::Claims;
use crate::store::rules::Actor;

pub fn is_interviewer(claims: &Claims) -> bool {
    claims.is_admin
}

/// The caller's identity inside the store rules.
pub fn actor_for(claims: &Claims) -> Actor {
    if is_interviewer(claims) {
        Actor::elevated()
    } else {
        Actor::standard()
    }
}

pub fn ensure_interviewer(claims: &Claims) -> Result<Actor, ApiError> {
    if is_interviewer(claims) {
        return Ok(Actor::elevated());
    }
    Err(ApiError::Forbidden("Admin access required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(is_admin: bool) -> Claims {
        Claims {
            email: "a@example.com".into(),
            is_admin,
            user_id: "admin-1".into(),
            token_type: None,
            nonce: None,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn only_admins_are_interviewers() {
        assert!(ensure_interviewer(&claims(true)).unwrap().is_elevated());
        assert!(matches!(ensure_interviewer(&claims(false)), Err(ApiError::Forbidden(_))));
        assert!(!actor_for(&claims(false)).is_elevated());
    }
}
