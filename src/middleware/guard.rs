//! Route guard middleware for Axum
//!
//! Wraps [`crate::access::evaluate`] for HTTP: resolves the principal from the
//! bearer token, opens (or reuses) their permission store, waits a bounded
//! time for it to settle, and turns the outcome into a response.
//!
//! The page a request needs is its path relative to the router the guard is
//! layered on, so `/app/employees` under a router nested at `/app` requires
//! page `/employees`.

use std::time::Instant;

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::access::{AuthState, GuardOutcome, GuardRequirement, PermissionSnapshot, evaluate};
use crate::metrics::{track_guard_outcome, track_guard_wait};
use crate::middleware::auth::MaybeAuthUser;
use crate::state::AppState;

/// What the client should offer the user after a refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    GoBack,
    Reload,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GuardRejection {
    pub error: String,
    pub action: RecoveryAction,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoadingResponse {
    pub status: String,
}

/// Middleware requiring page access for the request path.
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use crate::middleware::guard::require_page_access;
///
/// let pages = Router::new()
///     .route("/{page}", get(page_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_page_access));
/// ```
pub async fn require_page_access(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let requirement = GuardRequirement::page(req.uri().path());
    guard(state, requirement, req, next).await
}

/// Middleware for elevated-only areas: restricted roles are refused before
/// any permission check, then page access applies as usual.
pub async fn require_elevated_access(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let requirement = GuardRequirement::page(req.uri().path()).elevated();
    guard(state, requirement, req, next).await
}

async fn guard(state: AppState, requirement: GuardRequirement, req: Request, next: Next) -> Response {
    let location = original_location(&req);
    let (mut parts, body) = req.into_parts();

    let MaybeAuthUser(user) = match MaybeAuthUser::from_request_parts(&mut parts, &state).await {
        Ok(user) => user,
        Err(never) => match never {},
    };

    let snapshot = match &user {
        Some(principal) => {
            let store = state.sessions.open(principal.user_id).await;
            let started = Instant::now();
            let snapshot = store.settled(state.access_config.guard_wait()).await;
            track_guard_wait(started.elapsed());
            snapshot
        }
        None => PermissionSnapshot::default(),
    };

    let auth = AuthState {
        user,
        loading: false,
    };
    let outcome = evaluate(&auth, &snapshot, &requirement, &location);
    track_guard_outcome(outcome.kind());

    if !outcome.is_allowed() {
        info!(
            location = %location,
            outcome = outcome.kind(),
            user_id = ?auth.user.as_ref().map(|user| user.user_id),
            "Route guard refused request"
        );
        return outcome_response(outcome, &state.access_config.login_path);
    }

    debug!(location = %location, "Route guard allowed request");
    parts.extensions.insert(snapshot);
    next.run(Request::from_parts(parts, body)).await
}

/// Full path and query as the client sent it, before any nesting stripped it.
fn original_location(req: &Request) -> String {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(req.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// `<login_path>?redirect=<location>`, with the location percent-encoded.
pub fn login_redirect_target(login_path: &str, return_to: &str) -> String {
    format!("{login_path}?redirect={}", urlencoding::encode(return_to))
}

/// Maps a refusing guard outcome to its HTTP response.
pub fn outcome_response(outcome: GuardOutcome, login_path: &str) -> Response {
    match outcome {
        GuardOutcome::Loading => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(LoadingResponse {
                    status: "loading".to_string(),
                }),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
            response
        }
        GuardOutcome::Unauthenticated { return_to } => {
            Redirect::to(&login_redirect_target(login_path, &return_to)).into_response()
        }
        GuardOutcome::RoleRejected { role } => rejection(
            StatusCode::FORBIDDEN,
            format!("This area is not available to the {role} role"),
            RecoveryAction::GoBack,
        ),
        GuardOutcome::PermissionError { message } => rejection(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Unable to load permissions: {message}"),
            RecoveryAction::Reload,
        ),
        GuardOutcome::AccessDenied { page } => rejection(
            StatusCode::FORBIDDEN,
            format!("Access restricted: you do not have access to {page}"),
            RecoveryAction::GoBack,
        ),
        GuardOutcome::Allowed => StatusCode::NO_CONTENT.into_response(),
    }
}

fn rejection(status: StatusCode, error: String, action: RecoveryAction) -> Response {
    (status, Json(GuardRejection { error, action })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use workdesk_auth::UserRole;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_login_redirect_encodes_location() {
        assert_eq!(
            login_redirect_target("/login", "/app/leave?tab=pending&page=2"),
            "/login?redirect=%2Fapp%2Fleave%3Ftab%3Dpending%26page%3D2"
        );
    }

    #[tokio::test]
    async fn test_loading_response() {
        let response = outcome_response(GuardOutcome::Loading, "/login");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
        assert_eq!(body_json(response).await["status"], "loading");
    }

    #[tokio::test]
    async fn test_unauthenticated_redirects() {
        let response = outcome_response(
            GuardOutcome::Unauthenticated {
                return_to: "/app/employees".to_string(),
            },
            "/signin",
        );
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/signin?redirect=%2Fapp%2Femployees"
        );
    }

    #[tokio::test]
    async fn test_role_rejected_offers_go_back() {
        let response = outcome_response(
            GuardOutcome::RoleRejected {
                role: UserRole::Employee,
            },
            "/login",
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["action"], "go_back");
        assert!(body["error"].as_str().unwrap().contains("employee"));
    }

    #[tokio::test]
    async fn test_permission_error_offers_reload() {
        let response = outcome_response(
            GuardOutcome::PermissionError {
                message: "connection reset by peer".to_string(),
            },
            "/login",
        );
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["action"], "reload");
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("connection reset by peer")
        );
    }

    #[tokio::test]
    async fn test_access_denied_offers_go_back() {
        let response = outcome_response(
            GuardOutcome::AccessDenied {
                page: "/settings".to_string(),
            },
            "/login",
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["action"], "go_back");
        assert!(body["error"].as_str().unwrap().contains("/settings"));
    }
}
