use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use workdesk_core::{Action, BranchAccess, ModuleKey, PermissionRow};

use crate::access::{FetchState, PermissionSnapshotResponse};
use crate::middleware::guard::{GuardRejection, LoadingResponse, RecoveryAction};
use crate::modules::pages::model::PageView;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::permissions::controller::get_my_permissions,
        crate::modules::permissions::controller::refetch_my_permissions,
        crate::modules::session::controller::logout,
        crate::modules::pages::controller::show_dashboard,
        crate::modules::pages::controller::show_page,
        crate::modules::pages::controller::show_admin_page,
    ),
    components(
        schemas(
            PermissionSnapshotResponse,
            PermissionRow,
            BranchAccess,
            FetchState,
            PageView,
            ModuleKey,
            Action,
            GuardRejection,
            RecoveryAction,
            LoadingResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Permissions", description = "The signed-in user's permission snapshot"),
        (name = "Session", description = "Sign-out and permission store teardown"),
        (name = "Pages", description = "Permission-guarded HR pages")
    ),
    info(
        title = "Workdesk Access API",
        version = "0.1.0",
        description = "Permission loading and route guarding for the Workdesk HR application",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
