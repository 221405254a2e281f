//! The remote store permission rows are loaded from.
//!
//! Infrastructure crates (e.g. `workdesk-db`) implement [`PermissionSource`];
//! the access store only sees this trait.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::permissions::{BranchAccess, PermissionRow};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch permissions: {0}")]
    Permissions(#[source] anyhow::Error),

    #[error("Failed to fetch branch access: {0}")]
    BranchAccess(#[source] anyhow::Error),

    #[error("Permission fetch cancelled")]
    Cancelled,
}

pub type FetchResult<T> = Result<T, FetchError>;

#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// All permission rows for a user, in no particular order.
    async fn fetch_permissions(&self, user_id: Uuid) -> FetchResult<Vec<PermissionRow>>;

    /// All branch-access rows for a user.
    async fn fetch_branch_access(&self, user_id: Uuid) -> FetchResult<Vec<BranchAccess>>;
}
