use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, AuthError};

pub const AUTH_COOKIE: &str = "auth_token";
pub const RESET_TOKEN_TYPE: &str = "password-reset";

/// Claims carried by access and password-reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub user_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

// Get the auth token from the Authorization header or the auth_token cookie
pub fn get_auth_token(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidToken)?;
        let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        return Ok(token.to_string());
    }
    let cookie_header = headers
        .get(header::COOKIE)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;
    cookie::Cookie::split_parse(cookie_header)
        .flatten()
        .find(|c| c.name() == AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AuthError::MissingToken)
}

/// Issues and validates HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, reset_ttl: Duration) -> Self {
        Self { secret: secret.to_string(), access_ttl, reset_ttl }
    }

    /// Access token for the interviewer account.
    pub fn issue_access_token(&self, email: &str) -> Result<(String, Claims), ApiError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            is_admin: true,
            user_id: format!("admin-{}", now.timestamp_millis()),
            token_type: None,
            nonce: None,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        Ok((self.sign(&claims)?, claims))
    }

    pub fn issue_reset_token(&self, email: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            email: email.to_string(),
            is_admin: false,
            user_id: String::new(),
            token_type: Some(RESET_TOKEN_TYPE.to_string()),
            nonce: Some(random_hex(16)),
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::default(), claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation) {
            Ok(data) => {
                debug!("Token validated for '{}'", data.claims.email);
                Ok(data.claims)
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(AuthError::TokenExpired),
            Err(e) => {
                warn!("Token validation failed: {}", e);
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Accept only password-reset tokens issued for `admin_email`.
    pub fn validate_reset(&self, token: &str, admin_email: &str) -> Result<Claims, AuthError> {
        let claims = self.validate(token)?;
        if claims.token_type.as_deref() != Some(RESET_TOKEN_TYPE) || claims.email != admin_email {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}
