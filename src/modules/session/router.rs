use axum::{Router, routing::post};

use super::controller::logout;
use crate::state::AppState;

pub fn init_session_router() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}
