//! Per-user permission store.
//!
//! A [`PermissionStore`] owns one user's permission and branch-access rows.
//! It is created when the user authenticates, loads its rows through a
//! [`PermissionSource`] with the retry machine from [`super::retry`], and is
//! torn down on sign-out. Readers get immutable [`PermissionSnapshot`]s; each
//! successful load replaces the whole snapshot.
//!
//! A store whose last sequence failed, or whose rows are older than the
//! configured maximum age, is reloaded by [`PermissionStore::spawn_refetch`]
//! the next time its user makes a request.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use workdesk_core::{
    Action, BranchAccess, FetchError, ModuleKey, PermissionRow, PermissionSet, PermissionSource,
    PermissionType,
};

use super::retry::{FetchMachine, FetchState, RetryPolicy, RetryTimer, Step};
use crate::metrics::{
    track_permission_fetch_attempt, track_permission_fetch_failure, track_permission_fetch_retry,
};

/// Read-only view of a store at one point in time.
#[derive(Debug, Clone)]
pub struct PermissionSnapshot {
    permissions: Arc<PermissionSet>,
    pub fetch_state: FetchState,
    pub error: Option<String>,
    loaded_at: Option<Instant>,
}

impl Default for PermissionSnapshot {
    fn default() -> Self {
        Self {
            permissions: Arc::new(PermissionSet::empty()),
            fetch_state: FetchState::Idle,
            error: None,
            loaded_at: None,
        }
    }
}

impl PermissionSnapshot {
    /// A loaded snapshot, as produced by a successful fetch.
    pub fn loaded(permissions: PermissionSet) -> Self {
        Self {
            permissions: Arc::new(permissions),
            fetch_state: FetchState::Success,
            error: None,
            loaded_at: Some(Instant::now()),
        }
    }

    /// A snapshot after retries ran out: no rows, error set.
    pub fn failed(fetch_state: FetchState, error: impl Into<String>) -> Self {
        Self {
            permissions: Arc::new(PermissionSet::empty()),
            fetch_state,
            error: Some(error.into()),
            loaded_at: None,
        }
    }

    /// True until the current fetch sequence reaches a terminal state.
    pub fn loading(&self) -> bool {
        !self.fetch_state.is_terminal()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the next request should start a new fetch sequence: the last
    /// one failed, or its rows are at least `max_age` old.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.fetch_state {
            FetchState::Failed { .. } => true,
            FetchState::Success => self
                .loaded_at
                .is_none_or(|loaded_at| loaded_at.elapsed() >= max_age),
            _ => false,
        }
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn has_permission(&self, permission_type: PermissionType, key: &str) -> bool {
        self.permissions.has_permission(permission_type, key)
    }

    pub fn has_page_access(&self, path: &str) -> bool {
        self.permissions.has_page_access(path)
    }

    pub fn has_feature_access(&self, feature: &str) -> bool {
        self.permissions.has_feature_access(feature)
    }

    pub fn has_page_action(&self, module: ModuleKey, action: Action) -> bool {
        self.permissions.has_page_action(module, action)
    }

    pub fn accessible_branches(&self) -> HashSet<String> {
        self.permissions.accessible_branches()
    }

    pub fn to_response(&self) -> PermissionSnapshotResponse {
        PermissionSnapshotResponse {
            permissions: self.permissions.rows(),
            branch_access: self.permissions.branch_rows(),
            loading: self.loading(),
            error: self.error.clone(),
            fetch_state: self.fetch_state.clone(),
        }
    }
}

/// Wire form of a [`PermissionSnapshot`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PermissionSnapshotResponse {
    pub permissions: Vec<PermissionRow>,
    pub branch_access: Vec<BranchAccess>,
    pub loading: bool,
    pub error: Option<String>,
    pub fetch_state: FetchState,
}

pub struct PermissionStore {
    user_id: Uuid,
    source: Arc<dyn PermissionSource>,
    timer: Arc<dyn RetryTimer>,
    policy: RetryPolicy,
    snapshot: watch::Sender<PermissionSnapshot>,
    fetch_lock: Mutex<()>,
    refresh_queued: AtomicBool,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for PermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionStore")
            .field("user_id", &self.user_id)
            .field("policy", &self.policy)
            .field("torn_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl PermissionStore {
    pub fn new(
        user_id: Uuid,
        source: Arc<dyn PermissionSource>,
        timer: Arc<dyn RetryTimer>,
        policy: RetryPolicy,
    ) -> Self {
        let (snapshot, _) = watch::channel(PermissionSnapshot::default());
        Self {
            user_id,
            source,
            timer,
            policy,
            snapshot,
            fetch_lock: Mutex::new(()),
            refresh_queued: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn snapshot(&self) -> PermissionSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PermissionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits up to `timeout` for the current fetch sequence to settle and
    /// returns the latest snapshot either way.
    pub async fn settled(&self, timeout: Duration) -> PermissionSnapshot {
        let mut rx = self.subscribe();
        let wait = rx.wait_for(|snapshot| !snapshot.loading());
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(snapshot)) => snapshot.clone(),
            _ => self.snapshot(),
        }
    }

    /// Queues a fetch sequence on a background task unless one is already
    /// queued. The snapshot reads as loading from this call on, so a
    /// following [`settled`](Self::settled) waits for the new sequence.
    /// Returns whether a sequence was queued.
    pub fn spawn_refetch(self: &Arc<Self>) -> bool {
        if self.shutdown.is_cancelled() || self.refresh_queued.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.commit(|snapshot| snapshot.fetch_state = FetchState::Idle);

        let store = self.clone();
        tokio::spawn(async move {
            // Failures are recorded on the snapshot and logged by `refetch`.
            let _ = store.refetch().await;
        });
        true
    }

    /// Loads rows from the source, retrying per the store's policy.
    ///
    /// Sequences never overlap: a second caller waits for the first to
    /// finish and then runs its own. On success both collections are
    /// replaced together; after the last retry fails both are cleared and
    /// the error is recorded.
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn refetch(&self) -> Result<(), FetchError> {
        let _sequence = self.fetch_lock.lock().await;
        self.refresh_queued.store(false, Ordering::SeqCst);
        if self.shutdown.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let mut machine = FetchMachine::new(self.policy);
        let mut attempt = machine.start();
        self.publish_state(machine.state());

        loop {
            track_permission_fetch_attempt();
            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Err(FetchError::Cancelled),
                outcome = self.fetch_once() => outcome,
            };

            let err = match outcome {
                Ok(permissions) => {
                    machine.succeed();
                    let rows = permissions.len();
                    if !self.commit(|snapshot| *snapshot = PermissionSnapshot::loaded(permissions)) {
                        return Err(FetchError::Cancelled);
                    }
                    info!(attempt, rows, "Permissions loaded");
                    return Ok(());
                }
                Err(err) => err,
            };

            match machine.fail(err.to_string()) {
                Step::RetryAfter(delay) => {
                    track_permission_fetch_retry();
                    warn!(
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Permission fetch failed, retrying"
                    );
                    self.publish_state(machine.state());

                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => return Err(FetchError::Cancelled),
                        _ = self.timer.sleep(delay) => {}
                    }

                    attempt = machine.resume();
                    self.publish_state(machine.state());
                }
                Step::GiveUp => {
                    track_permission_fetch_failure();
                    error!(
                        attempt,
                        error = %err,
                        "Permission fetch failed after all retry attempts"
                    );
                    let failed = PermissionSnapshot::failed(machine.state().clone(), err.to_string());
                    self.commit(|snapshot| *snapshot = failed);
                    return Err(err);
                }
            }
        }
    }

    /// Cancels any pending retry and drops to the empty snapshot. Nothing
    /// the store was doing mutates it afterwards.
    pub fn teardown(&self) {
        self.shutdown.cancel();
        self.snapshot.send_replace(PermissionSnapshot::default());
        info!(user_id = %self.user_id, "Permission store torn down");
    }

    async fn fetch_once(&self) -> Result<PermissionSet, FetchError> {
        let (permissions, branch_access) = tokio::join!(
            self.source.fetch_permissions(self.user_id),
            self.source.fetch_branch_access(self.user_id),
        );
        Ok(PermissionSet::from_rows(permissions?, branch_access?))
    }

    fn publish_state(&self, state: &FetchState) {
        let state = state.clone();
        self.commit(|snapshot| snapshot.fetch_state = state);
    }

    /// Applies `update` unless the store has been torn down. The check runs
    /// under the channel lock, so it cannot interleave with `teardown`.
    fn commit(&self, update: impl FnOnce(&mut PermissionSnapshot)) -> bool {
        let mut applied = false;
        self.snapshot.send_if_modified(|snapshot| {
            if self.shutdown.is_cancelled() {
                return false;
            }
            update(snapshot);
            applied = true;
            true
        });
        applied
    }
}

impl Drop for PermissionStore {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
