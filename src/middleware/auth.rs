use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;
use workdesk_auth::{Principal, UserRole, verify_token};
use workdesk_core::AppError;

use crate::state::AppState;

/// Extractor that validates the bearer JWT and yields the authenticated principal.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user_id
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> Option<UserRole> {
        self.0.role
    }

    pub fn is_administrator(&self) -> bool {
        self.0.is_administrator()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;
        let principal = Principal::try_from(claims)?;

        Ok(AuthUser(principal))
    }
}

/// Like [`AuthUser`], but a missing or invalid token means "no user" instead
/// of a rejection. Used where being signed out is a normal outcome.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Principal>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = AuthUser::from_request_parts(parts, state)
            .await
            .ok()
            .map(|AuthUser(principal)| principal);
        Ok(MaybeAuthUser(principal))
    }
}
