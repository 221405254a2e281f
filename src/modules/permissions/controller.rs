use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;
use workdesk_core::AppError;

use crate::access::PermissionSnapshotResponse;
use crate::middleware::auth::AuthUser;
use crate::modules::permissions::model::SnapshotQuery;
use crate::modules::permissions::service::PermissionService;
use crate::state::AppState;

/// Current permission snapshot for the signed-in user
#[utoipa::path(
    get,
    path = "/api/me/permissions",
    params(SnapshotQuery),
    responses(
        (status = 200, description = "Permission snapshot", body = PermissionSnapshotResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn get_my_permissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<PermissionSnapshotResponse>, AppError> {
    let snapshot =
        PermissionService::get_snapshot(&state, auth_user.user_id(), query.wait).await?;
    Ok(Json(snapshot.to_response()))
}

/// Re-run the permission fetch (with retries) and return the result
///
/// A fetch that fails after all retries still answers 200: the snapshot
/// carries the error and empty permissions.
#[utoipa::path(
    post,
    path = "/api/me/permissions/refetch",
    responses(
        (status = 200, description = "Snapshot after the fetch sequence ended", body = PermissionSnapshotResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Session was closed while fetching")
    ),
    tag = "Permissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn refetch_my_permissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<PermissionSnapshotResponse>, AppError> {
    let snapshot = PermissionService::refetch(&state, auth_user.user_id()).await?;
    Ok(Json(snapshot.to_response()))
}
