use tracing::warn;
use uuid::Uuid;
use workdesk_core::{AppError, FetchError};

use crate::access::PermissionSnapshot;
use crate::state::AppState;

pub struct PermissionService;

impl PermissionService {
    /// The user's snapshot, optionally after waiting for an in-flight fetch
    /// to settle.
    pub async fn get_snapshot(
        state: &AppState,
        user_id: Uuid,
        wait: bool,
    ) -> Result<PermissionSnapshot, AppError> {
        let store = state.sessions.open(user_id).await;

        let snapshot = if wait {
            store.settled(state.access_config.guard_wait()).await
        } else {
            store.snapshot()
        };

        Ok(snapshot)
    }

    /// Runs a full fetch sequence. Running out of retries is not an error
    /// here: the returned snapshot carries it.
    pub async fn refetch(state: &AppState, user_id: Uuid) -> Result<PermissionSnapshot, AppError> {
        let store = state.sessions.open(user_id).await;

        match store.refetch().await {
            Ok(()) => {}
            Err(FetchError::Cancelled) => {
                return Err(AppError::unavailable(FetchError::Cancelled));
            }
            Err(e) => {
                warn!(error = %e, "Refetch ended without permissions");
            }
        }

        Ok(store.snapshot())
    }
}
