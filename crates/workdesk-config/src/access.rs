//! Permission loading and route guard configuration.
//!
//! # Configuration
//!
//! - `PERMISSION_FETCH_MAX_RETRIES`: Retries after the first failed fetch (default: 3)
//! - `PERMISSION_FETCH_RETRY_DELAY_MS`: Base retry delay; retry `n` waits `n * base` (default: 1000)
//! - `LOGIN_PATH`: Where unauthenticated requests to guarded pages are redirected (default: `/login`)
//! - `GUARD_WAIT_MS`: How long a guarded request waits for a loading store to settle (default: 10000)
//! - `PERMISSION_MAX_AGE_MS`: Age after which a loaded snapshot is refetched on the next request (default: 300000)
//! - `SESSION_IDLE_TIMEOUT_MS`: Idle time after which a user's store is evicted (default: 1800000)

use std::env;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessConfig {
    /// Retries attempted after the initial fetch fails.
    pub max_retries: u32,

    /// Delay before the first retry; later retries scale linearly.
    pub retry_base_delay_ms: u64,

    /// Login entry point for the unauthenticated redirect.
    pub login_path: String,

    /// Upper bound on how long the guard holds a request while permissions load.
    pub guard_wait_ms: u64,

    /// A successful load older than this is refreshed on the next request.
    pub permission_max_age_ms: u64,

    /// Stores untouched for this long are torn down by the sweeper.
    pub session_idle_timeout_ms: u64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 1000,
            login_path: "/login".to_string(),
            guard_wait_ms: 10_000,
            permission_max_age_ms: 300_000,
            session_idle_timeout_ms: 1_800_000,
        }
    }
}

impl AccessConfig {
    /// Falls back to defaults for variables that are unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env::var("PERMISSION_FETCH_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            retry_base_delay_ms: env::var("PERMISSION_FETCH_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_base_delay_ms),
            login_path: env::var("LOGIN_PATH").unwrap_or(defaults.login_path),
            guard_wait_ms: env::var("GUARD_WAIT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.guard_wait_ms),
            permission_max_age_ms: env::var("PERMISSION_MAX_AGE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.permission_max_age_ms),
            session_idle_timeout_ms: env::var("SESSION_IDLE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_idle_timeout_ms),
        }
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn guard_wait(&self) -> Duration {
        Duration::from_millis(self.guard_wait_ms)
    }

    pub fn permission_max_age(&self) -> Duration {
        Duration::from_millis(self.permission_max_age_ms)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.session_idle_timeout_ms)
    }

    /// How often idle stores are swept: a tenth of the idle timeout, capped at a minute.
    pub fn session_sweep_interval(&self) -> Duration {
        (self.session_idle_timeout() / 10)
            .clamp(Duration::from_secs(1), Duration::from_secs(60))
    }
}
