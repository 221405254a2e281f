//! Fetch state machine with bounded linear backoff.
//!
//! A fetch sequence starts at `Fetching { attempt: 0 }`. Each failure either
//! schedules a retry after `base_delay * (attempt + 1)` or, once
//! `max_retries` retries have been spent, ends in `Failed`. Success at any
//! attempt ends in `Success`.
//!
//! ```text
//! Idle ──start──▶ Fetching(n) ──succeed──▶ Success
//!                    │  ▲
//!               fail │  │ resume
//!                    ▼  │
//!             RetryScheduled(n, delay)
//!                    │
//!      fail, n == max_retries
//!                    ▼
//!                 Failed
//! ```
//!
//! The machine is pure; the store drives it and waits on a [`RetryTimer`]
//! so tests can observe delays without sleeping.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use workdesk_config::AccessConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    Idle,
    Fetching {
        attempt: u32,
    },
    RetryScheduled {
        attempt: u32,
        delay_ms: u64,
    },
    Success,
    Failed {
        attempts: u32,
        error: String,
    },
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            FetchState::Fetching { .. } | FetchState::RetryScheduled { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchState::Success | FetchState::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AccessConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
        }
    }

    /// Delay before retrying after `attempt` failed, or `None` when retries
    /// are exhausted.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_retries).then(|| self.base_delay * (attempt + 1))
    }
}

/// What the driver should do after reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RetryAfter(Duration),
    GiveUp,
}

#[derive(Debug, Clone)]
pub struct FetchMachine {
    policy: RetryPolicy,
    state: FetchState,
}

impl FetchMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: FetchState::Idle,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Begins a new sequence from any state other than mid-fetch.
    pub fn start(&mut self) -> u32 {
        debug_assert!(!self.state.is_loading(), "fetch sequence already running");
        self.state = FetchState::Fetching { attempt: 0 };
        0
    }

    pub fn succeed(&mut self) {
        debug_assert!(matches!(self.state, FetchState::Fetching { .. }));
        self.state = FetchState::Success;
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Step {
        let FetchState::Fetching { attempt } = self.state else {
            debug_assert!(false, "fail reported outside of a fetch");
            return Step::GiveUp;
        };

        match self.policy.delay_after(attempt) {
            Some(delay) => {
                self.state = FetchState::RetryScheduled {
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                };
                Step::RetryAfter(delay)
            }
            None => {
                self.state = FetchState::Failed {
                    attempts: attempt + 1,
                    error: error.into(),
                };
                Step::GiveUp
            }
        }
    }

    /// Fires the scheduled retry, returning the new attempt number.
    pub fn resume(&mut self) -> u32 {
        let next = match self.state {
            FetchState::RetryScheduled { attempt, .. } => attempt + 1,
            _ => {
                debug_assert!(false, "resume without a scheduled retry");
                0
            }
        };
        self.state = FetchState::Fetching { attempt: next };
        next
    }
}

/// Waits out a retry delay.
#[async_trait]
pub trait RetryTimer: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl RetryTimer for TokioTimer {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Returns immediately and remembers every delay it was asked to wait.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingTimer {
    delays: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|delays| delays.clone())
            .unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RetryTimer for RecordingTimer {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}
