//! Middleware modules for request processing.
//!
//! # Modules
//!
//! - [`auth`]: Bearer token extractors producing the authenticated principal
//! - [`guard`]: Route guard middleware for permission-checked pages
//!
//! # Guard Flow
//!
//! 1. Client requests a page with `Authorization: Bearer <token>`
//! 2. `MaybeAuthUser` resolves the principal, or none if the token is missing or invalid
//! 3. The principal's permission store is opened and given time to settle
//! 4. The route guard decides; refusals become redirects, 403s or 503s
//! 5. Allowed requests reach the handler with the `PermissionSnapshot` in extensions
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware, routing::get};
//! use crate::middleware::guard::{require_elevated_access, require_page_access};
//!
//! let pages = Router::new()
//!     .route("/{page}", get(show_page))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_page_access))
//!     .nest(
//!         "/admin",
//!         Router::new()
//!             .route("/{page}", get(show_page))
//!             .route_layer(middleware::from_fn_with_state(state.clone(), require_elevated_access)),
//!     );
//! ```

pub mod auth;
pub mod guard;
