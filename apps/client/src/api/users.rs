use tracing::{error, warn};

use crate::api::{ApiClient, Confirmation};
use crate::errors::ClientResult;
use crate::models::{UserData, UserProfile};

impl ApiClient {
    /// GET /users/{uid}
    /// Returns `None` when the backend has no document for this user yet.
    pub async fn fetch_user(&self, uid: &str) -> ClientResult<Option<UserData>> {
        match self.get::<UserData>(&format!("/users/{uid}")).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_not_found() => {
                warn!("No profile found for uid {uid}");
                Ok(None)
            }
            Err(e) => {
                error!("Error fetching user profile for {uid}: {e}");
                Err(e)
            }
        }
    }

    /// POST /users/{uid}
    /// The endpoint replaces the stored profile, so callers send the whole
    /// document rather than a delta.
    pub async fn save_profile(&self, uid: &str, profile: &UserProfile) -> ClientResult<Confirmation> {
        self.post(&format!("/users/{uid}"), profile)
            .await
            .inspect_err(|e| error!("Error saving user profile for {uid}: {e}"))
    }

    /// DELETE /users/me
    pub async fn delete_account(&self) -> ClientResult<Confirmation> {
        self.delete("/users/me", None)
            .await
            .inspect_err(|e| error!("Error deleting account: {e}"))
    }
}
