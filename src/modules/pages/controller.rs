use axum::{Extension, Json, extract::Path};
use tracing::instrument;

use crate::access::PermissionSnapshot;
use crate::middleware::guard::GuardRejection;
use crate::modules::pages::model::PageView;

/// Dashboard
#[utoipa::path(
    get,
    path = "/app",
    responses(
        (status = 200, description = "Page rendered", body = PageView),
        (status = 303, description = "Not signed in; redirected to login"),
        (status = 403, description = "Access restricted", body = GuardRejection),
        (status = 503, description = "Permissions loading or unavailable", body = GuardRejection)
    ),
    tag = "Pages",
    security(("bearer_auth" = []))
)]
#[instrument(skip(snapshot))]
pub async fn show_dashboard(Extension(snapshot): Extension<PermissionSnapshot>) -> Json<PageView> {
    Json(PageView::new("/", &snapshot))
}

/// A guarded HR page, e.g. `/app/employees`
#[utoipa::path(
    get,
    path = "/app/{page}",
    params(("page" = String, Path, description = "Page name, e.g. employees")),
    responses(
        (status = 200, description = "Page rendered", body = PageView),
        (status = 303, description = "Not signed in; redirected to login"),
        (status = 403, description = "Access restricted", body = GuardRejection),
        (status = 503, description = "Permissions loading or unavailable", body = GuardRejection)
    ),
    tag = "Pages",
    security(("bearer_auth" = []))
)]
#[instrument(skip(snapshot))]
pub async fn show_page(
    Path(page): Path<String>,
    Extension(snapshot): Extension<PermissionSnapshot>,
) -> Json<PageView> {
    Json(PageView::new(format!("/{page}"), &snapshot))
}

/// An elevated-only page, e.g. `/app/admin/settings`
#[utoipa::path(
    get,
    path = "/app/admin/{page}",
    params(("page" = String, Path, description = "Page name, e.g. settings")),
    responses(
        (status = 200, description = "Page rendered", body = PageView),
        (status = 303, description = "Not signed in; redirected to login"),
        (status = 403, description = "Restricted role or access restricted", body = GuardRejection),
        (status = 503, description = "Permissions loading or unavailable", body = GuardRejection)
    ),
    tag = "Pages",
    security(("bearer_auth" = []))
)]
#[instrument(skip(snapshot))]
pub async fn show_admin_page(
    Path(page): Path<String>,
    Extension(snapshot): Extension<PermissionSnapshot>,
) -> Json<PageView> {
    Json(PageView::new(format!("/{page}"), &snapshot))
}
