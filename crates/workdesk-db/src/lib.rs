//! # Workdesk DB
//!
//! Database pool initialization and the Postgres-backed [`PermissionSource`].
//!
//! # Example
//!
//! ```ignore
//! use workdesk_db::{PgPermissionSource, init_db_pool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = init_db_pool().await?;
//!     let source = PgPermissionSource::new(pool);
//!     let rows = source.fetch_permissions(user_id).await?;
//!     Ok(())
//! }
//! ```

use std::env;

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;
use workdesk_core::{BranchAccess, FetchError, FetchResult, PermissionRow, PermissionSource};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Initializes a PostgreSQL connection pool from `DATABASE_URL`.
///
/// The returned pool is cheaply cloneable and should be created once at
/// startup.
pub async fn init_db_pool() -> anyhow::Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Runs the embedded migrations against `pool`.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")
}

/// Reads permission and branch-access rows from the `user_permissions` and
/// `user_branch_access` tables.
#[derive(Clone, Debug)]
pub struct PgPermissionSource {
    pool: PgPool,
}

impl PgPermissionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionSource for PgPermissionSource {
    #[instrument(skip(self))]
    async fn fetch_permissions(&self, user_id: Uuid) -> FetchResult<Vec<PermissionRow>> {
        let rows: Vec<(String, String, bool)> = sqlx::query_as(
            r#"SELECT permission_type, permission_key, granted
            FROM user_permissions WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FetchError::Permissions(e.into()))?;

        Ok(rows
            .into_iter()
            .map(|(permission_type, permission_key, granted)| PermissionRow {
                permission_type,
                permission_key,
                granted,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_branch_access(&self, user_id: Uuid) -> FetchResult<Vec<BranchAccess>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"SELECT branch_id::text FROM user_branch_access WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FetchError::BranchAccess(e.into()))?;

        Ok(rows
            .into_iter()
            .map(|(branch_id,)| BranchAccess { branch_id })
            .collect())
    }
}
