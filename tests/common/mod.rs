use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;
use workdesk::access::RecordingTimer;
use workdesk::access::testing::ScriptedSource;
use workdesk::state::AppState;
use workdesk_auth::{UserRole, create_access_token};
use workdesk_config::{AccessConfig, CorsConfig, JwtConfig};
use workdesk_core::{ModuleKey, PageAction, PermissionRow};

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".to_string(),
        access_token_expiry: 3600,
    }
}

#[allow(dead_code)]
pub fn test_access_config() -> AccessConfig {
    AccessConfig {
        guard_wait_ms: 5_000,
        ..AccessConfig::default()
    }
}

/// State backed by `source`, with retries recorded instead of slept.
#[allow(dead_code)]
pub fn test_state(source: ScriptedSource) -> AppState {
    test_state_with(source, test_access_config())
}

pub fn test_state_with(source: ScriptedSource, access_config: AccessConfig) -> AppState {
    AppState::new(
        test_jwt_config(),
        access_config,
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        Arc::new(source),
        Arc::new(RecordingTimer::new()),
    )
}

pub fn token_for(user_id: Uuid, role: Option<UserRole>) -> String {
    create_access_token(user_id, "someone@example.com", role, &test_jwt_config()).unwrap()
}

#[allow(dead_code)]
pub fn view_rows(modules: &[ModuleKey]) -> Vec<PermissionRow> {
    modules
        .iter()
        .map(|module| PermissionRow::page_action(PageAction::view(*module), true))
        .collect()
}

#[allow(dead_code)]
pub fn every_view_row() -> Vec<PermissionRow> {
    view_rows(&ModuleKey::ALL)
}

pub fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Sends `request` and decodes the body as JSON (`Null` when empty or not JSON).
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}
