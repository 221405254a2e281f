mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    every_view_row, request, send, test_access_config, test_state, test_state_with, token_for,
    view_rows,
};
use uuid::Uuid;
use workdesk::access::testing::ScriptedSource;
use workdesk::router::init_router;
use workdesk_auth::UserRole;
use workdesk_config::AccessConfig;
use workdesk_core::{Action, BranchAccess, ModuleKey, PageAction, PermissionRow};

#[tokio::test]
async fn test_unauthenticated_request_redirects_to_login() {
    let app = init_router(test_state(ScriptedSource::new()));

    let response = send(app, request("GET", "/app/employees?tab=active", None)).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers["location"],
        "/login?redirect=%2Fapp%2Femployees%3Ftab%3Dactive"
    );
}

#[tokio::test]
async fn test_invalid_token_counts_as_signed_out() {
    let app = init_router(test_state(ScriptedSource::new()));

    let response = send(app, request("GET", "/app/employees", Some("not-a-jwt"))).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert!(
        response.headers["location"]
            .to_str()
            .unwrap()
            .starts_with("/login?redirect=")
    );
}

#[tokio::test]
async fn test_redirect_uses_configured_login_path() {
    let config = AccessConfig {
        login_path: "/auth/sign-in".to_string(),
        ..test_access_config()
    };
    let app = init_router(test_state_with(ScriptedSource::new(), config));

    let response = send(app, request("GET", "/app/admin/settings", None)).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers["location"],
        "/auth/sign-in?redirect=%2Fapp%2Fadmin%2Fsettings"
    );
}

#[tokio::test]
async fn test_employee_rejected_from_admin_area_despite_grants() {
    let source = ScriptedSource::new().with_permissions(every_view_row());
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Employee));

    let response = send(app, request("GET", "/app/admin/settings", Some(&token))).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["action"], "go_back");
}

#[tokio::test]
async fn test_employee_allowed_on_regular_page() {
    let source = ScriptedSource::new().with_permissions(view_rows(&[ModuleKey::Leave]));
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Employee));

    let response = send(app, request("GET", "/app/leave", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["page"], "/leave");
    assert_eq!(response.body["module"], "leave");
}

#[tokio::test]
async fn test_manager_allowed_in_admin_area_with_page_access() {
    let source = ScriptedSource::new().with_permissions(view_rows(&[ModuleKey::Settings]));
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Manager));

    let response = send(app, request("GET", "/app/admin/settings", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["page"], "/settings");
}

#[tokio::test]
async fn test_admin_renders_despite_fetch_failure() {
    let source = ScriptedSource::new()
        .with_permissions(every_view_row())
        .failing_permissions(usize::MAX);
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Admin));

    let response = send(app, request("GET", "/app/employees", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["page"], "/employees");
    // The failed fetch left no rows behind.
    assert_eq!(response.body["actions"], serde_json::json!([]));
}

#[tokio::test]
async fn test_fetch_failure_offers_reload_to_non_admin() {
    let source = ScriptedSource::new()
        .with_permissions(every_view_row())
        .failing_branch_access(usize::MAX);
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::HrManager));

    let response = send(app, request("GET", "/app/employees", Some(&token))).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["action"], "reload");
}

#[tokio::test]
async fn test_reload_recovers_once_backend_is_healthy() {
    let source = ScriptedSource::new()
        .with_permissions(view_rows(&[ModuleKey::Employees]))
        .failing_permissions(usize::MAX);
    let control = source.control();
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Manager));

    let response = send(app.clone(), request("GET", "/app/employees", Some(&token))).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["action"], "reload");

    control.fail_permissions(0);
    let response = send(app, request("GET", "/app/employees", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["page"], "/employees");
    assert_eq!(control.permission_calls(), 5);
}

#[tokio::test]
async fn test_page_access_derived_from_module_view() {
    let source = ScriptedSource::new()
        .with_permissions(vec![
            PermissionRow::page_action(PageAction::view(ModuleKey::Recruitment), true),
            PermissionRow::page_action(PageAction::new(ModuleKey::Recruitment, Action::Create), true),
        ])
        .with_branches(vec![BranchAccess::new("north"), BranchAccess::new("central")]);
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::HrManager));

    let response = send(app, request("GET", "/app/applications", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["module"], "recruitment");
    assert_eq!(response.body["actions"], serde_json::json!(["view", "create"]));
    assert_eq!(
        response.body["branches"],
        serde_json::json!(["central", "north"])
    );
}

#[tokio::test]
async fn test_missing_page_access_is_denied() {
    let source = ScriptedSource::new().with_permissions(view_rows(&[ModuleKey::Employees]));
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Manager));

    let response = send(app, request("GET", "/app/reports", Some(&token))).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["action"], "go_back");
}

#[tokio::test]
async fn test_explicit_page_access_denial_wins_over_module_view() {
    let source = ScriptedSource::new().with_permissions(vec![
        PermissionRow::page_action(PageAction::view(ModuleKey::Employees), true),
        PermissionRow::page_access("/employees", false),
    ]);
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Manager));

    let response = send(app, request("GET", "/app/employees", Some(&token))).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_uses_dashboard_module() {
    let source = ScriptedSource::new().with_permissions(view_rows(&[ModuleKey::Dashboard]));
    let app = init_router(test_state(source));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Employee));

    let response = send(app, request("GET", "/app", Some(&token))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["page"], "/");
    assert_eq!(response.body["module"], "dashboard");
}

#[tokio::test]
async fn test_store_still_loading_answers_loading() {
    let config = AccessConfig {
        guard_wait_ms: 0,
        ..test_access_config()
    };
    let source = ScriptedSource::new()
        .with_permissions(every_view_row())
        .with_latency(Duration::from_secs(60));
    let app = init_router(test_state_with(source, config));
    let token = token_for(Uuid::new_v4(), Some(UserRole::Admin));

    let response = send(app, request("GET", "/app/employees", Some(&token))).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers["retry-after"], "1");
    assert_eq!(response.body["status"], "loading");
}
