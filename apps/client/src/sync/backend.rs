//! The remote side of the synchronization store.
//!
//! `SyncStore` holds an `Arc<dyn ProfileBackend>`; production wires in the
//! `ApiClient`, tests wire in an in-memory backend.

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::errors::ClientResult;
use crate::models::{Career, UserData, UserProfile};

#[async_trait]
pub trait ProfileBackend: Send + Sync {
    /// `Ok(None)` means the backend has no document for `uid`.
    async fn fetch_user_data(&self, uid: &str) -> ClientResult<Option<UserData>>;

    async fn save_profile(&self, uid: &str, profile: &UserProfile) -> ClientResult<()>;

    async fn add_career(&self, career: &Career) -> ClientResult<()>;

    async fn remove_career(&self, career_name: &str) -> ClientResult<()>;

    async fn update_skill_status(
        &self,
        career_name: &str,
        skill: &str,
        complete: bool,
    ) -> ClientResult<()>;

    async fn save_assessment_score(
        &self,
        career_name: &str,
        skill: &str,
        score: f64,
        total_questions: usize,
    ) -> ClientResult<()>;
}

#[async_trait]
impl ProfileBackend for ApiClient {
    async fn fetch_user_data(&self, uid: &str) -> ClientResult<Option<UserData>> {
        self.fetch_user(uid).await
    }

    async fn save_profile(&self, uid: &str, profile: &UserProfile) -> ClientResult<()> {
        ApiClient::save_profile(self, uid, profile).await.map(|_| ())
    }

    async fn add_career(&self, career: &Career) -> ClientResult<()> {
        self.add_to_compass(career).await.map(|_| ())
    }

    async fn remove_career(&self, career_name: &str) -> ClientResult<()> {
        self.remove_from_compass(career_name).await.map(|_| ())
    }

    async fn update_skill_status(
        &self,
        career_name: &str,
        skill: &str,
        complete: bool,
    ) -> ClientResult<()> {
        ApiClient::update_skill_status(self, career_name, skill, complete)
            .await
            .map(|_| ())
    }

    async fn save_assessment_score(
        &self,
        career_name: &str,
        skill: &str,
        score: f64,
        total_questions: usize,
    ) -> ClientResult<()> {
        ApiClient::save_assessment_score(self, career_name, skill, score, total_questions)
            .await
            .map(|_| ())
    }
}
