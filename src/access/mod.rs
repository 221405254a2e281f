//! Permission loading, storage, and route guarding.
//!
//! - [`retry`]: fetch state machine with linear backoff and an injectable timer
//! - [`store`]: one user's permission snapshot and its fetch lifecycle
//! - [`registry`]: per-user stores, opened on sign-in and closed on sign-out
//! - [`guard`]: route guard decisions

pub mod guard;
pub mod registry;
pub mod retry;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use guard::{AuthState, GuardOutcome, GuardRequirement, evaluate};
pub use registry::SessionRegistry;
#[cfg(any(test, feature = "test-utils"))]
pub use retry::RecordingTimer;
pub use retry::{FetchMachine, FetchState, RetryPolicy, RetryTimer, Step, TokioTimer};
pub use store::{PermissionSnapshot, PermissionSnapshotResponse, PermissionStore};
