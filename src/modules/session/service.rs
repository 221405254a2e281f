use uuid::Uuid;

use crate::state::AppState;

pub struct SessionService;

impl SessionService {
    /// Tears down the user's permission store. Returns whether one was open.
    pub async fn logout(state: &AppState, user_id: Uuid) -> bool {
        state.sessions.close(user_id).await
    }
}
