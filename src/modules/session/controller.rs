use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::session::service::SessionService;
use crate::state::AppState;

/// Sign out: tear down the user's permission store
///
/// Any retry still pending for the user is cancelled and their permissions
/// are discarded. Signing out without an open session is not an error.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Session",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> StatusCode {
    SessionService::logout(&state, auth_user.user_id()).await;
    StatusCode::NO_CONTENT
}
