use serde_json::Value;
use tracing::error;

use crate::errors::ClientResult;
use crate::models::forge::LearningResource;
use crate::models::{CompassEntry, SkillState};
use crate::sync::StoreSnapshot;
use crate::views::ViewContext;

#[derive(Debug, Clone, PartialEq)]
pub struct SkillRow {
    pub skill: String,
    pub complete: bool,
    pub score: Option<f64>,
}

impl SkillRow {
    /// Assessed skills offer a retake instead of a first assessment.
    pub fn assessed(&self) -> bool {
        self.score.is_some()
    }
}

/// One saved career as displayed: progress rounded, skills in pathway order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassPath {
    pub name: String,
    pub description: Option<String>,
    pub progress: u32,
    pub education_pathway: Vec<String>,
    pub skills: Vec<SkillRow>,
}

impl CompassPath {
    pub fn from_entry(entry: &CompassEntry) -> Self {
        let skills = entry
            .career
            .pathway
            .iter()
            .map(|skill| {
                let status = entry.skills_status.get(skill);
                SkillRow {
                    skill: skill.clone(),
                    complete: status.is_some_and(|s| s.status == SkillState::Complete),
                    score: status.and_then(|s| s.score),
                }
            })
            .collect();

        let education_pathway = match entry.career.extra.get("education_pathway") {
            Some(Value::Array(steps)) => steps
                .iter()
                .filter_map(|s| s.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            name: entry.name().to_string(),
            description: entry.career.description.clone(),
            progress: entry.display_progress(),
            education_pathway,
            skills,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompassState {
    Loading,
    Failed,
    Empty,
    Ready(Vec<CompassPath>),
}

impl CompassState {
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        if snapshot.loading {
            CompassState::Loading
        } else if snapshot.has_error() {
            CompassState::Failed
        } else if snapshot.saved_paths().is_empty() {
            CompassState::Empty
        } else {
            CompassState::Ready(
                snapshot
                    .saved_paths()
                    .iter()
                    .map(CompassPath::from_entry)
                    .collect(),
            )
        }
    }
}

pub struct CompassView {
    ctx: ViewContext,
}

impl CompassView {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    pub fn state(&self) -> CompassState {
        CompassState::from_snapshot(&self.ctx.store.snapshot())
    }

    pub async fn toggle_skill(&self, career_name: &str, skill: &str, complete: bool) -> ClientResult<()> {
        self.ctx
            .store
            .set_skill_status(career_name, skill, complete)
            .await
    }

    pub async fn remove(&self, career_name: &str) -> ClientResult<()> {
        self.ctx.store.remove_career(career_name).await
    }

    /// Lookup failures show as an empty list.
    pub async fn resources(&self, career_name: &str, skill: &str) -> Vec<LearningResource> {
        self.ctx
            .api
            .find_resources(career_name, skill)
            .await
            .unwrap_or_else(|e| {
                error!("Error finding resources: {e}");
                Vec::new()
            })
    }
}
