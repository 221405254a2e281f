//! # Workdesk Config
//!
//! Configuration types for Workdesk, loaded from environment variables:
//!
//! - [`access`]: Permission fetch retry and guard redirect settings
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`jwt`]: JWT authentication configuration
//!
//! # Example
//!
//! ```ignore
//! use workdesk_config::{AccessConfig, CorsConfig, JwtConfig};
//!
//! let access_config = AccessConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let jwt_config = JwtConfig::from_env();
//! ```

pub mod access;
pub mod cors;
pub mod jwt;

// Re-export commonly used types at crate root
pub use access::AccessConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;
