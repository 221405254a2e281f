//! Owns one [`PermissionStore`] per signed-in user.
//!
//! A store is opened the first time an authenticated request for its user
//! arrives, starts loading in the background, and is closed (torn down) on
//! sign-out or after sitting idle past the session timeout. Opening a store
//! whose last load failed or has aged out starts a new load.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;
use workdesk_core::PermissionSource;

use super::retry::{RetryPolicy, RetryTimer};
use super::store::PermissionStore;
use crate::metrics::set_open_sessions;

/// Loaded snapshots are kept this long unless configured otherwise.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

struct Session {
    store: Arc<PermissionStore>,
    last_seen: Instant,
}

pub struct SessionRegistry {
    source: Arc<dyn PermissionSource>,
    timer: Arc<dyn RetryTimer>,
    policy: RetryPolicy,
    max_age: Duration,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("policy", &self.policy)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    pub fn new(
        source: Arc<dyn PermissionSource>,
        timer: Arc<dyn RetryTimer>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            timer,
            policy,
            max_age: DEFAULT_MAX_AGE,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Sets how long a successful load is trusted before the next request
    /// reloads it.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Returns the user's store, creating it if this is the user's first
    /// request since signing in. A new store, or one whose snapshot is stale
    /// (failed, or loaded more than `max_age` ago), has a load queued before
    /// this returns.
    pub async fn open(&self, user_id: Uuid) -> Arc<PermissionStore> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if let Some(session) = sessions.get_mut(&user_id) {
            session.last_seen = now;
            let store = session.store.clone();
            drop(sessions);

            if store.snapshot().is_stale(self.max_age) && store.spawn_refetch() {
                debug!(user_id = %user_id, "Reloading stale permissions");
            }
            return store;
        }

        let store = Arc::new(PermissionStore::new(
            user_id,
            self.source.clone(),
            self.timer.clone(),
            self.policy,
        ));
        sessions.insert(
            user_id,
            Session {
                store: store.clone(),
                last_seen: now,
            },
        );
        set_open_sessions(sessions.len());
        drop(sessions);

        info!(user_id = %user_id, "Opened permission session");
        store.spawn_refetch();
        store
    }

    pub async fn get(&self, user_id: Uuid) -> Option<Arc<PermissionStore>> {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .map(|session| session.store.clone())
    }

    /// Removes and tears down the user's store. Returns whether one existed.
    pub async fn close(&self, user_id: Uuid) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            let removed = sessions.remove(&user_id);
            set_open_sessions(sessions.len());
            removed
        };
        match removed {
            Some(session) => {
                session.store.teardown();
                info!(user_id = %user_id, "Closed permission session");
                true
            }
            None => {
                debug!(user_id = %user_id, "No permission session to close");
                false
            }
        }
    }

    /// Tears down every store not opened within `idle`. Returns how many
    /// were evicted.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let evicted: Vec<(Uuid, Session)> = {
            let mut sessions = self.sessions.write().await;
            let expired: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, session)| session.last_seen.elapsed() >= idle)
                .map(|(user_id, _)| *user_id)
                .collect();
            let evicted = expired
                .into_iter()
                .filter_map(|user_id| sessions.remove(&user_id).map(|s| (user_id, s)))
                .collect();
            set_open_sessions(sessions.len());
            evicted
        };

        for (user_id, session) in &evicted {
            session.store.teardown();
            debug!(user_id = %user_id, "Evicted idle permission session");
        }
        if !evicted.is_empty() {
            info!(evicted = evicted.len(), "Swept idle permission sessions");
        }
        evicted.len()
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `every` until the registry
    /// is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, idle: Duration, every: Duration) {
        let registry: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.evict_idle(idle).await;
            }
        });
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::access::retry::RecordingTimer;
    use crate::access::testing::ScriptedSource;
    use workdesk_core::{BranchAccess, ModuleKey, PageAction, PermissionRow};

    fn registry(source: ScriptedSource) -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(source),
            Arc::new(RecordingTimer::new()),
            RetryPolicy::default(),
        )
    }

    #[tokio::test]
    async fn test_open_loads_in_background() {
        let registry = registry(
            ScriptedSource::new()
                .with_permissions(vec![PermissionRow::page_action(
                    PageAction::view(ModuleKey::Documents),
                    true,
                )])
                .with_branches(vec![BranchAccess::new("east")]),
        );
        let user_id = Uuid::new_v4();

        let store = registry.open(user_id).await;
        let snapshot = store.settled(Duration::from_secs(5)).await;

        assert!(snapshot.has_page_access("/documents"));
        assert!(snapshot.accessible_branches().contains("east"));
    }

    #[tokio::test]
    async fn test_open_is_idempotent_per_user() {
        let source = ScriptedSource::new();
        let control = source.control();
        let registry = registry(source);
        let user_id = Uuid::new_v4();

        let first = registry.open(user_id).await;
        let second = registry.open(user_id).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);

        first.settled(Duration::from_secs(5)).await;
        assert_eq!(control.permission_calls(), 1);
    }

    #[tokio::test]
    async fn test_open_reloads_failed_store() {
        let source = ScriptedSource::new()
            .with_permissions(vec![PermissionRow::page_action(
                PageAction::view(ModuleKey::Documents),
                true,
            )])
            .failing_permissions(usize::MAX);
        let control = source.control();
        let registry = registry(source);
        let user_id = Uuid::new_v4();

        let snapshot = registry
            .open(user_id)
            .await
            .settled(Duration::from_secs(5))
            .await;
        assert!(snapshot.has_error());
        assert_eq!(control.permission_calls(), 4);

        control.fail_permissions(0);
        let snapshot = registry
            .open(user_id)
            .await
            .settled(Duration::from_secs(5))
            .await;

        assert!(!snapshot.has_error());
        assert!(snapshot.has_page_access("/documents"));
        assert_eq!(control.permission_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_reloads_after_max_age() {
        let source = ScriptedSource::new();
        let control = source.control();
        let registry = registry(source).with_max_age(Duration::from_secs(60));
        let user_id = Uuid::new_v4();

        registry
            .open(user_id)
            .await
            .settled(Duration::from_secs(5))
            .await;
        registry.open(user_id).await;
        assert_eq!(control.permission_calls(), 1);

        control.set_permissions(vec![PermissionRow::page_action(
            PageAction::view(ModuleKey::Leave),
            true,
        )]);
        tokio::time::advance(Duration::from_secs(61)).await;

        let snapshot = registry
            .open(user_id)
            .await
            .settled(Duration::from_secs(5))
            .await;
        assert_eq!(control.permission_calls(), 2);
        assert!(snapshot.has_page_access("/leave"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_load_and_refetch_do_not_overlap() {
        let source = ScriptedSource::new().with_latency(Duration::from_secs(1));
        let control = source.control();
        let registry = registry(source);

        let store = registry.open(Uuid::new_v4()).await;
        // Let the background load take the fetch lock first.
        tokio::task::yield_now().await;
        assert_eq!(control.permission_calls(), 1);

        store.refetch().await.unwrap();

        assert_eq!(control.permission_calls(), 2);
        assert_eq!(control.max_permission_fetches_in_flight(), 1);
        assert!(!store.snapshot().loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_tears_down_untouched_stores() {
        let registry = registry(ScriptedSource::new());
        let idle_user = Uuid::new_v4();
        let active_user = Uuid::new_v4();

        let idle_store = registry.open(idle_user).await;
        registry.open(active_user).await;

        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        registry.open(active_user).await;
        tokio::time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(registry.evict_idle(Duration::from_secs(30 * 60)).await, 1);
        assert!(idle_store.is_torn_down());
        assert!(registry.get(idle_user).await.is_none());
        assert!(registry.get(active_user).await.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let registry = Arc::new(registry(ScriptedSource::new()));
        let user_id = Uuid::new_v4();
        let store = registry.open(user_id).await;

        registry.spawn_sweeper(Duration::from_secs(60), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(75)).await;

        assert!(store.is_torn_down());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_close_tears_down() {
        let registry = registry(ScriptedSource::new());
        let user_id = Uuid::new_v4();

        let store = registry.open(user_id).await;
        assert!(registry.close(user_id).await);
        assert!(store.is_torn_down());
        assert!(registry.get(user_id).await.is_none());
        assert!(!registry.close(user_id).await);
        assert!(registry.is_empty().await);
    }
}
