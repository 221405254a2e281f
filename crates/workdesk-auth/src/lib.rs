//! # Workdesk Auth
//!
//! Authentication types and JWT utilities for Workdesk.
//!
//! - [`claims`]: Access token claims
//! - [`jwt`]: Token creation and verification
//! - [`roles`]: Role claims and the authenticated [`Principal`]
//!
//! # Example
//!
//! ```ignore
//! use workdesk_auth::{Principal, create_access_token, verify_token};
//! use workdesk_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "ada@example.com", Some(UserRole::Admin), &config)?;
//! let principal = Principal::try_from(verify_token(&token, &config)?)?;
//! assert!(principal.is_administrator());
//! ```

pub mod claims;
pub mod jwt;
pub mod roles;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use roles::{Principal, UserRole};
