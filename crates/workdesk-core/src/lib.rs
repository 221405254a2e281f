//! # Workdesk Core
//!
//! Core types, errors, and access resolution for Workdesk.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`permissions`]: Permission rows and the typed module/action vocabulary
//! - [`resolver`]: Fail-closed access decisions over loaded rows
//! - [`source`]: The remote store trait permission rows are fetched from
//!
//! # Example
//!
//! ```ignore
//! use workdesk_core::{PermissionRow, PermissionSet};
//! use workdesk_core::permissions::{ModuleKey, PageAction};
//!
//! let perms = PermissionSet::from_rows(
//!     vec![PermissionRow::page_action(PageAction::view(ModuleKey::Employees), true)],
//!     Vec::new(),
//! );
//! assert!(perms.has_page_access("/employees"));
//! assert!(!perms.has_page_access("/settings"));
//! ```

pub mod errors;
pub mod permissions;
pub mod resolver;
pub mod source;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use permissions::{
    Action, BranchAccess, ModuleKey, PageAction, PermissionRow, PermissionType, module_for_path,
};
pub use resolver::PermissionSet;
pub use source::{FetchError, FetchResult, PermissionSource};
