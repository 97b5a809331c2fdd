//! Skill Forge: practice quizzes for the skills on a saved career path.
//!
//! select -> quiz -> results. Submitting grades the quiz locally and stores
//! the percentage as the skill's score, which also marks the skill complete.

use std::collections::BTreeMap;

use tracing::{error, info};

use crate::errors::{ClientError, ClientResult};
use crate::models::forge::{Quiz, QuizResult};
use crate::views::ViewContext;

const FEEDBACK_FAILED: &str = "Could not load feedback.";

#[derive(Debug, Clone, PartialEq)]
pub enum ForgeStage {
    Select,
    Quiz {
        career_name: String,
        skill: String,
        quiz: Quiz,
        answers: BTreeMap<usize, String>,
    },
    Results {
        career_name: String,
        skill: String,
        quiz: Quiz,
        result: QuizResult,
    },
}

pub struct ForgeSession {
    ctx: ViewContext,
    stage: ForgeStage,
}

impl ForgeSession {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            stage: ForgeStage::Select,
        }
    }

    pub fn stage(&self) -> &ForgeStage {
        &self.stage
    }

    /// Saved careers that can be assessed.
    pub fn careers(&self) -> Vec<String> {
        self.ctx
            .store
            .snapshot()
            .saved_paths()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Pathway skills of a saved career; empty for unknown careers.
    pub fn available_skills(&self, career_name: &str) -> Vec<String> {
        self.ctx
            .store
            .snapshot()
            .saved_path(career_name)
            .map(|p| p.career.pathway.clone())
            .unwrap_or_default()
    }

    /// Fetches a fresh quiz. On failure the session goes back to selection.
    pub async fn generate_quiz(&mut self, career_name: &str, skill: &str) -> ClientResult<()> {
        if career_name.trim().is_empty() || skill.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Select a career and a skill first".to_string(),
            ));
        }
        match self.ctx.api.get_assessment(career_name, skill).await {
            Ok(quiz) => {
                info!(
                    "Generated quiz '{}' with {} questions",
                    quiz.quiz_title,
                    quiz.questions.len()
                );
                self.stage = ForgeStage::Quiz {
                    career_name: career_name.to_string(),
                    skill: skill.to_string(),
                    quiz,
                    answers: BTreeMap::new(),
                };
                Ok(())
            }
            Err(e) => {
                self.stage = ForgeStage::Select;
                Err(e)
            }
        }
    }

    pub fn answer(&mut self, question: usize, option: &str) -> ClientResult<()> {
        let ForgeStage::Quiz { quiz, answers, .. } = &mut self.stage else {
            return Err(ClientError::InvalidInput("No quiz in progress".to_string()));
        };
        let Some(q) = quiz.questions.get(question) else {
            return Err(ClientError::InvalidInput(format!(
                "Question {question} does not exist"
            )));
        };
        if !q.options.iter().any(|o| o == option) {
            return Err(ClientError::InvalidInput(format!(
                "'{option}' is not an option for question {question}"
            )));
        }
        answers.insert(question, option.to_string());
        Ok(())
    }

    /// Grades the quiz and saves the score. The session stays on the quiz
    /// if saving fails.
    pub async fn submit(&mut self) -> ClientResult<QuizResult> {
        let ForgeStage::Quiz {
            career_name,
            skill,
            quiz,
            answers,
        } = &self.stage
        else {
            return Err(ClientError::InvalidInput("No quiz in progress".to_string()));
        };

        let result = quiz.grade(answers);
        self.ctx
            .store
            .record_assessment_score(career_name, skill, result.percentage, result.total)
            .await
            .inspect_err(|e| error!("Failed to submit quiz: {e}"))?;

        info!(
            "Scored {}/{} ({}%) on '{}'",
            result.correct, result.total, result.percentage, skill
        );
        self.stage = ForgeStage::Results {
            career_name: career_name.clone(),
            skill: skill.clone(),
            quiz: quiz.clone(),
            result: result.clone(),
        };
        Ok(result)
    }

    /// Topics to review for the questions answered wrong. Empty for a
    /// perfect score or outside the results stage.
    pub async fn feedback(&self) -> Vec<String> {
        let ForgeStage::Results { result, .. } = &self.stage else {
            return Vec::new();
        };
        if result.incorrect.is_empty() {
            return Vec::new();
        }
        match self.ctx.api.get_feedback(&result.incorrect).await {
            Ok(feedback) => feedback.topics,
            Err(_) => vec![FEEDBACK_FAILED.to_string()],
        }
    }

    /// New quiz for the same career and skill.
    pub async fn retake(&mut self) -> ClientResult<()> {
        let (career_name, skill) = match &self.stage {
            ForgeStage::Quiz {
                career_name, skill, ..
            }
            | ForgeStage::Results {
                career_name, skill, ..
            } => (career_name.clone(), skill.clone()),
            ForgeStage::Select => {
                return Err(ClientError::InvalidInput("Nothing to retake".to_string()))
            }
        };
        self.generate_quiz(&career_name, &skill).await
    }

    pub fn finish(&mut self) {
        self.stage = ForgeStage::Select;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::spawn;
    use crate::models::{Compass, CompassEntry, SkillState, UserData};
    use crate::sync::testing::{career, MockBackend};
    use crate::views::testing::{signed_in_context, UNUSED_API};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    fn quiz_json() -> Value {
        json!({
            "quiz_title": "SQL Basics",
            "questions": [
                { "question_text": "Q1", "options": ["A", "B"], "correct_answer": "A", "explanation": "" },
                { "question_text": "Q2", "options": ["A", "B"], "correct_answer": "B", "explanation": "" },
                { "question_text": "Q3", "options": ["A", "B"], "correct_answer": "A", "explanation": "" }
            ]
        })
    }

    fn forge_router(feedback_ok: bool) -> Router {
        Router::new()
            .route("/forge/assessment", post(|| async { Json(quiz_json()) }))
            .route(
                "/forge/feedback",
                post(move || async move {
                    if feedback_ok {
                        (StatusCode::OK, Json(json!({ "topics": ["JOIN semantics"] })))
                    } else {
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({ "detail": "Failed to get feedback" })),
                        )
                    }
                }),
            )
    }

    fn analyst_saved() -> Arc<MockBackend> {
        let entry = CompassEntry::from_career(&career("Data Analyst", &["SQL", "Excel"]));
        Arc::new(MockBackend::with_data(UserData {
            compass: Compass {
                saved_paths: vec![entry],
                recommendations: vec![],
                extra: Map::new(),
            },
            ..Default::default()
        }))
    }

    async fn session(feedback_ok: bool, backend: Arc<MockBackend>) -> ForgeSession {
        let base = spawn(forge_router(feedback_ok)).await;
        ForgeSession::new(signed_in_context(&base, backend).await)
    }

    #[tokio::test]
    async fn test_available_skills_come_from_saved_path() {
        let forge = ForgeSession::new(signed_in_context(UNUSED_API, analyst_saved()).await);
        assert_eq!(forge.careers(), vec!["Data Analyst"]);
        assert_eq!(forge.available_skills("Data Analyst"), vec!["SQL", "Excel"]);
        assert!(forge.available_skills("UX Designer").is_empty());
    }

    #[tokio::test]
    async fn test_quiz_grades_saves_score_and_fetches_feedback() {
        let backend = analyst_saved();
        let mut forge = session(true, backend.clone()).await;

        forge.generate_quiz("Data Analyst", "SQL").await.unwrap();
        forge.answer(0, "A").unwrap();
        forge.answer(1, "A").unwrap();
        assert!(forge.answer(2, "Z").is_err());

        let result = forge.submit().await.unwrap();
        assert_eq!((result.correct, result.total), (1, 3));
        assert_eq!(result.percentage, 33.0);
        assert_eq!(result.incorrect.len(), 2);

        let server = backend.server_data().unwrap();
        let sql = &server.compass.saved_paths[0].skills_status["SQL"];
        assert_eq!(sql.status, SkillState::Complete);
        assert_eq!(sql.score, Some(33.0));

        assert_eq!(forge.feedback().await, vec!["JOIN semantics"]);
    }

    #[tokio::test]
    async fn test_feedback_failure_uses_fallback() {
        let mut forge = session(false, analyst_saved()).await;
        forge.generate_quiz("Data Analyst", "SQL").await.unwrap();
        forge.submit().await.unwrap();

        assert_eq!(forge.feedback().await, vec![FEEDBACK_FAILED]);
    }

    #[tokio::test]
    async fn test_perfect_score_needs_no_feedback() {
        let mut forge = ForgeSession::new(signed_in_context(UNUSED_API, analyst_saved()).await);
        forge.stage = ForgeStage::Results {
            career_name: "Data Analyst".to_string(),
            skill: "SQL".to_string(),
            quiz: serde_json::from_value(quiz_json()).unwrap(),
            result: QuizResult {
                correct: 3,
                total: 3,
                percentage: 100.0,
                incorrect: vec![],
            },
        };
        assert!(forge.feedback().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_stays_on_quiz() {
        let backend = analyst_saved();
        let mut forge = session(true, backend.clone()).await;
        forge.generate_quiz("Data Analyst", "SQL").await.unwrap();
        backend.fail_writes(true);

        assert!(forge.submit().await.is_err());
        assert!(matches!(forge.stage(), ForgeStage::Quiz { .. }));
        let snapshot = forge.ctx.store.snapshot();
        assert_eq!(snapshot.saved_paths()[0].skills_status["SQL"].score, None);
    }

    #[tokio::test]
    async fn test_generate_failure_returns_to_select() {
        let mut forge = ForgeSession::new(signed_in_context(UNUSED_API, analyst_saved()).await);
        assert!(forge.generate_quiz("Data Analyst", "SQL").await.is_err());
        assert_eq!(forge.stage(), &ForgeStage::Select);
        assert!(matches!(
            forge.generate_quiz("Data Analyst", " ").await,
            Err(ClientError::InvalidInput(_))
        ));
    }
}
