use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SnapshotQuery {
    /// Wait (bounded by `GUARD_WAIT_MS`) for an in-flight fetch to settle
    /// before answering.
    #[serde(default)]
    pub wait: bool,
}
