//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - End-user authentication via an HS256 JWT from the auth provider
//! - `AdminAuth` - Admin authentication for universe management

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use rankrent_core::UserId;
use rankrent_engine::Session;

use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated user extracted from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
}

impl AuthUser {
    /// The engine session for this user.
    #[must_use]
    pub const fn session(&self) -> Session {
        Session::new(self.user_id)
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let auth_header = parts
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(ApiError::Unauthorized)?;

            // Test tokens ("test-token:<uuid>") are only honoured in test builds
            // or with the "test-auth" feature.
            #[cfg(any(test, feature = "test-auth"))]
            if let Some(user_id_str) = token.strip_prefix("test-token:") {
                let user_id = user_id_str
                    .parse::<UserId>()
                    .map_err(|_| ApiError::Unauthorized)?;
                return Ok(AuthUser { user_id });
            }

            let claims = validate_jwt(
                token,
                state.config.auth_jwt_secret.as_deref(),
                &state.config.auth_audience,
            )?;

            let user_id = claims
                .sub
                .parse::<UserId>()
                .map_err(|_| ApiError::Unauthorized)?;

            Ok(AuthUser { user_id })
        })
    }
}

/// Admin authentication via the `X-Admin-Key` header.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let admin_key = parts
                .headers
                .get("x-admin-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            let expected_key = state
                .config
                .admin_api_key
                .as_ref()
                .ok_or(ApiError::Unauthorized)?;

            if !crate::crypto::constant_time_eq(admin_key, expected_key) {
                return Err(ApiError::Forbidden);
            }

            let admin_id = parts
                .headers
                .get("x-admin-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("admin")
                .to_string();

            tracing::info!(admin_id = %admin_id, "Admin authenticated");

            Ok(AdminAuth { admin_id })
        })
    }
}

/// JWT claims issued by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Audience.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Validate an HS256 token against the shared secret and audience.
fn validate_jwt(token: &str, secret: Option<&str>, audience: &str) -> Result<JwtClaims, ApiError> {
    let Some(secret) = secret else {
        tracing::warn!("Rejecting bearer token: AUTH_JWT_SECRET is not configured");
        return Err(ApiError::Unauthorized);
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    decode::<JwtClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            ApiError::Unauthorized
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, aud: &str) -> String {
        let claims = JwtClaims {
            sub: sub.into(),
            aud: Some(serde_json::Value::String(aud.into())),
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: Some(chrono::Utc::now().timestamp()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let user_id = UserId::generate().to_string();
        let claims = validate_jwt(&token("s3cret", &user_id, "rankrent"), Some("s3cret"), "rankrent")
            .unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn wrong_secret_or_audience_is_rejected() {
        let jwt = token("s3cret", "user", "rankrent");
        assert!(validate_jwt(&jwt, Some("other"), "rankrent").is_err());
        assert!(validate_jwt(&jwt, Some("s3cret"), "another-app").is_err());
    }

    #[test]
    fn missing_secret_rejects_everything() {
        let jwt = token("s3cret", "user", "rankrent");
        assert!(matches!(
            validate_jwt(&jwt, None, "rankrent"),
            Err(ApiError::Unauthorized)
        ));
    }
}
