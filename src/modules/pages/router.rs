use axum::{Router, middleware, routing::get};

use super::controller::{show_admin_page, show_dashboard, show_page};
use crate::middleware::guard::{require_elevated_access, require_page_access};
use crate::state::AppState;

/// Guarded HR pages. Everything under `/admin` is elevated-only.
pub fn init_pages_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(show_dashboard))
        .route("/{page}", get(show_page))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_page_access,
        ))
        .nest(
            "/admin",
            Router::new()
                .route("/{page}", get(show_admin_page))
                .route_layer(middleware::from_fn_with_state(
                    state,
                    require_elevated_access,
                )),
        )
}
