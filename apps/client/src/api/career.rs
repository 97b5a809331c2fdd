use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::api::{ApiClient, Confirmation};
use crate::errors::{ClientError, ClientResult};
use crate::models::compass::Career;
use crate::models::user::null_as_default;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationRefresh {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<Career>,
}

#[derive(Debug, Serialize)]
struct SkillUpdateRequest<'a> {
    career_name: &'a str,
    skill: &'a str,
    is_complete: bool,
}

impl ApiClient {
    /// POST /career/compass/add
    /// The backend answers `status: "info"` when the career is already saved.
    pub async fn add_to_compass(&self, career: &Career) -> ClientResult<Confirmation> {
        if career.career_name.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Invalid career data: career_name is required".to_string(),
            ));
        }
        self.post("/career/compass/add", career)
            .await
            .inspect_err(|e| error!("Error adding '{}' to compass: {e}", career.career_name))
    }

    /// DELETE /career/compass/remove
    pub async fn remove_from_compass(&self, career_name: &str) -> ClientResult<Confirmation> {
        self.delete(
            "/career/compass/remove",
            Some(json!({ "career_name": career_name })),
        )
        .await
        .inspect_err(|e| error!("Error removing '{career_name}' from compass: {e}"))
    }

    /// POST /career/compass/skill/update
    pub async fn update_skill_status(
        &self,
        career_name: &str,
        skill: &str,
        is_complete: bool,
    ) -> ClientResult<Confirmation> {
        let body = SkillUpdateRequest {
            career_name,
            skill,
            is_complete,
        };
        self.post("/career/compass/skill/update", &body)
            .await
            .inspect_err(|e| error!("Error updating skill '{skill}' of '{career_name}': {e}"))
    }

    /// POST /chat/recommendations/refresh
    /// Kicks off regeneration; the new list is observed through a later
    /// profile refresh.
    pub async fn refresh_recommendations(&self) -> ClientResult<RecommendationRefresh> {
        self.post_empty("/chat/recommendations/refresh")
            .await
            .inspect_err(|e| error!("Error refreshing recommendations: {e}"))
    }
}
