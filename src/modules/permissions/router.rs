use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{get_my_permissions, refetch_my_permissions};
use crate::state::AppState;

pub fn init_permissions_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_permissions))
        .route("/refetch", post(refetch_my_permissions))
}
