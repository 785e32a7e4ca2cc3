//! Authentication extractor.

use std::time::Duration;

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use feedpost_core::ports::{AuthError, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cache key marking a token as logged out.
pub fn revoked_token_key(token_id: Uuid) -> String {
    format!("revoked-token:{token_id}")
}

/// Authenticated caller, taken from a valid, unrevoked Bearer token.
///
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub token_id: Uuid,
    /// Expiry of the presented token, unix seconds.
    pub expires_at: i64,
}

impl Identity {
    /// Time until the presented token is rejected on its own.
    ///
    /// `exp` is in whole seconds and validation only fails once it is
    /// strictly in the past, so the token lives through the whole `exp`
    /// second.
    pub fn remaining_lifetime(&self) -> Duration {
        let secs = self.expires_at.saturating_sub(Utc::now().timestamp());
        Duration::from_secs(u64::try_from(secs).unwrap_or(0) + 1)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            roles: claims.roles,
            token_id: claims.token_id,
            expires_at: claims.exp,
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AppError::Internal("Server configuration error".to_string()));
            };

            let claims = state.tokens.validate_token(&token?)?;
            if state.cache.contains(&revoked_token_key(claims.token_id)).await {
                return Err(AuthError::TokenRevoked.into());
            }

            Ok(Identity::from(claims))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(expires_at: i64) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            roles: vec![],
            token_id: Uuid::new_v4(),
            expires_at,
        }
    }

    #[test]
    fn test_remaining_lifetime_covers_the_expiry_second() {
        let now = Utc::now().timestamp();

        let lifetime = identity(now + 60).remaining_lifetime();
        assert!(lifetime >= Duration::from_secs(60));
        assert!(lifetime <= Duration::from_secs(61));

        // Expiring this very second: still accepted, so still revocable.
        assert!(identity(now).remaining_lifetime() >= Duration::from_secs(1));
    }

    #[test]
    fn test_revoked_token_key() {
        let id = Uuid::nil();
        assert_eq!(
            revoked_token_key(id),
            "revoked-token:00000000-0000-0000-0000-000000000000"
        );
    }
}
