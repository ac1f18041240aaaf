use crate::startup::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use service_core::error::AppError;
use uuid::Uuid;

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
///
/// Identity is delegated: the token is validated against the configured
/// signing secret, and the subject claim is the owning-user id every
/// orchestrator call is scoped to.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthenticated(anyhow::anyhow!("Not authenticated")))?;

        let claims = state.auth.validate_access_token(token).map_err(|_| {
            AppError::Unauthenticated(anyhow::anyhow!("Invalid or expired token"))
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AppError::Unauthenticated(anyhow::anyhow!("Invalid subject claim"))
        })?;

        // Add to tracing span for observability
        tracing::Span::current().record("user_id", claims.sub.as_str());

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}
