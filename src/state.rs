use std::sync::Arc;

use workdesk_config::{AccessConfig, CorsConfig, JwtConfig};
use workdesk_core::PermissionSource;

use crate::access::{RetryPolicy, RetryTimer, SessionRegistry, TokioTimer};

#[derive(Clone, Debug)]
pub struct AppState {
    pub jwt_config: JwtConfig,
    pub access_config: AccessConfig,
    pub cors_config: CorsConfig,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Builds state around `source`, waiting out retries on `timer`.
    pub fn new(
        jwt_config: JwtConfig,
        access_config: AccessConfig,
        cors_config: CorsConfig,
        source: Arc<dyn PermissionSource>,
        timer: Arc<dyn RetryTimer>,
    ) -> Self {
        let policy = RetryPolicy::from_config(&access_config);
        let sessions = SessionRegistry::new(source, timer, policy)
            .with_max_age(access_config.permission_max_age());
        Self {
            jwt_config,
            access_config,
            cors_config,
            sessions: Arc::new(sessions),
        }
    }

    /// Production state: configuration from the environment, real timer.
    pub fn from_env(source: Arc<dyn PermissionSource>) -> Self {
        Self::new(
            JwtConfig::from_env(),
            AccessConfig::from_env(),
            CorsConfig::from_env(),
            source,
            Arc::new(TokioTimer),
        )
    }

    /// Starts evicting stores idle past the configured session timeout.
    pub fn spawn_session_sweeper(&self) {
        self.sessions.spawn_sweeper(
            self.access_config.session_idle_timeout(),
            self.access_config.session_sweep_interval(),
        );
    }
}
