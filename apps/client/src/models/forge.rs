use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::compass::percentage;
use crate::models::user::null_as_default;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub quiz_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<QuizQuestion>,
}

/// Grading outcome for a submitted quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    pub correct: usize,
    pub total: usize,
    /// 0–100, rounded; this is what gets stored as the skill score.
    pub percentage: f64,
    pub incorrect: Vec<QuizQuestion>,
}

impl Quiz {
    /// Grades `answers` (question index → chosen option). Unanswered
    /// questions count as incorrect.
    pub fn grade(&self, answers: &BTreeMap<usize, String>) -> QuizResult {
        let incorrect: Vec<QuizQuestion> = self
            .questions
            .iter()
            .enumerate()
            .filter(|(idx, q)| answers.get(idx) != Some(&q.correct_answer))
            .map(|(_, q)| q.clone())
            .collect();

        let total = self.questions.len();
        let correct = total - incorrect.len();

        QuizResult {
            correct,
            total,
            percentage: percentage(correct, total),
            incorrect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningResource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<LearningResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Feedback {
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SkillRequest<'a> {
    pub career_name: &'a str,
    pub skill: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ScoreRequest<'a> {
    pub career_name: &'a str,
    pub skill: &'a str,
    pub score: f64,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
pub struct FeedbackRequest<'a> {
    pub incorrect_questions: &'a [QuizQuestion],
}
