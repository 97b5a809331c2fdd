// Feature views.
// Each view reads store snapshots and routes every change to cached user
// data through a store operation. Calls whose results are not cached
// (chat, quizzes, resources, feedback) go straight to the API client.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::sync::SyncStore;

pub mod compass;
pub mod discover;
pub mod forge;
pub mod profile;
pub mod recommendations;

pub use compass::{CompassPath, CompassState, CompassView, SkillRow};
pub use discover::DiscoverView;
pub use forge::{ForgeSession, ForgeStage};
pub use profile::{ProfileEditor, ProfileForm};
pub use recommendations::{RecommendationCard, RecommendationsState, RecommendationsView};

/// Handles shared by every view.
#[derive(Clone)]
pub struct ViewContext {
    pub api: ApiClient,
    pub store: Arc<SyncStore>,
}

/// Outcome banner shown next to a form or action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Danger(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Danger(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Danger(_))
    }
}
