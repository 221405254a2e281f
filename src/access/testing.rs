//! In-memory [`PermissionSource`] for tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;
use workdesk_core::{BranchAccess, FetchError, FetchResult, PermissionRow, PermissionSource};

#[derive(Debug, Default)]
struct SourceState {
    permissions: Mutex<Vec<PermissionRow>>,
    branches: Mutex<Vec<BranchAccess>>,
    permission_failures: AtomicUsize,
    branch_failures: AtomicUsize,
    permission_calls: AtomicUsize,
    branch_calls: AtomicUsize,
    latency_ms: AtomicU64,
    permissions_in_flight: AtomicUsize,
    max_permissions_in_flight: AtomicUsize,
}

/// Serves fixed rows, failing the first `n` calls of either kind on request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    state: Arc<SourceState>,
}

/// Shared handle for adjusting a [`ScriptedSource`] after it has been handed
/// to a store.
#[derive(Debug, Clone)]
pub struct SourceControl {
    state: Arc<SourceState>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permissions(self, rows: Vec<PermissionRow>) -> Self {
        self.control().set_permissions(rows);
        self
    }

    pub fn with_branches(self, rows: Vec<BranchAccess>) -> Self {
        if let Ok(mut branches) = self.state.branches.lock() {
            *branches = rows;
        }
        self
    }

    pub fn failing_permissions(self, times: usize) -> Self {
        self.control().fail_permissions(times);
        self
    }

    pub fn failing_branch_access(self, times: usize) -> Self {
        self.control().fail_branch_access(times);
        self
    }

    /// Delays every fetch by `latency` on the tokio clock.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
        self
    }

    pub fn control(&self) -> SourceControl {
        SourceControl {
            state: self.state.clone(),
        }
    }
}

impl SourceControl {
    pub fn set_permissions(&self, rows: Vec<PermissionRow>) {
        if let Ok(mut permissions) = self.state.permissions.lock() {
            *permissions = rows;
        }
    }

    pub fn fail_permissions(&self, times: usize) {
        self.state.permission_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_branch_access(&self, times: usize) {
        self.state.branch_failures.store(times, Ordering::SeqCst);
    }

    pub fn permission_calls(&self) -> usize {
        self.state.permission_calls.load(Ordering::SeqCst)
    }

    pub fn branch_access_calls(&self) -> usize {
        self.state.branch_calls.load(Ordering::SeqCst)
    }

    /// Highest number of permission fetches observed running at once.
    pub fn max_permission_fetches_in_flight(&self) -> usize {
        self.state.max_permissions_in_flight.load(Ordering::SeqCst)
    }
}

impl SourceState {
    async fn delay(&self) {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }
}

/// Decrements a failure budget, returning whether this call should fail.
fn take_failure(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl PermissionSource for ScriptedSource {
    async fn fetch_permissions(&self, _user_id: Uuid) -> FetchResult<Vec<PermissionRow>> {
        self.state.permission_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.state.permissions_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_permissions_in_flight
            .fetch_max(running, Ordering::SeqCst);
        self.state.delay().await;
        self.state.permissions_in_flight.fetch_sub(1, Ordering::SeqCst);
        if take_failure(&self.state.permission_failures) {
            return Err(FetchError::Permissions(anyhow!("connection reset by peer")));
        }
        Ok(self
            .state
            .permissions
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }

    async fn fetch_branch_access(&self, _user_id: Uuid) -> FetchResult<Vec<BranchAccess>> {
        self.state.branch_calls.fetch_add(1, Ordering::SeqCst);
        self.state.delay().await;
        if take_failure(&self.state.branch_failures) {
            return Err(FetchError::BranchAccess(anyhow!("connection reset by peer")));
        }
        Ok(self
            .state
            .branches
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default())
    }
}
