use tracing::error;

use crate::api::{ApiClient, Confirmation};
use crate::errors::ClientResult;
use crate::models::forge::{
    Feedback, FeedbackRequest, LearningResource, Quiz, QuizQuestion, ResourceList, ScoreRequest,
    SkillRequest,
};

impl ApiClient {
    /// POST /forge/assessment
    pub async fn get_assessment(&self, career_name: &str, skill: &str) -> ClientResult<Quiz> {
        self.post("/forge/assessment", &SkillRequest { career_name, skill })
            .await
            .inspect_err(|e| error!("Error fetching assessment for '{skill}': {e}"))
    }

    /// POST /forge/assessment/save
    /// `score` is the percentage (0–100) of correct answers.
    pub async fn save_assessment_score(
        &self,
        career_name: &str,
        skill: &str,
        score: f64,
        total_questions: usize,
    ) -> ClientResult<Confirmation> {
        let body = ScoreRequest {
            career_name,
            skill,
            score,
            total_questions,
        };
        self.post("/forge/assessment/save", &body)
            .await
            .inspect_err(|e| error!("Error saving assessment score for '{skill}': {e}"))
    }

    /// POST /forge/resources
    pub async fn find_resources(
        &self,
        career_name: &str,
        skill: &str,
    ) -> ClientResult<Vec<LearningResource>> {
        let list: ResourceList = self
            .post("/forge/resources", &SkillRequest { career_name, skill })
            .await
            .inspect_err(|e| error!("Error finding resources for '{skill}': {e}"))?;
        Ok(list.resources)
    }

    /// POST /forge/feedback
    pub async fn get_feedback(&self, incorrect: &[QuizQuestion]) -> ClientResult<Feedback> {
        self.post(
            "/forge/feedback",
            &FeedbackRequest {
                incorrect_questions: incorrect,
            },
        )
        .await
        .inspect_err(|e| error!("Error getting feedback: {e}"))
    }
}
