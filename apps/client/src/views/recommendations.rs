use tracing::error;

use crate::errors::ClientResult;
use crate::models::Career;
use crate::sync::StoreSnapshot;
use crate::views::{Notice, ViewContext};

const LOAD_FAILED: &str = "Could not load recommendations. Please try again later.";
const REFRESH_FAILED: &str =
    "We couldn't refresh your recommendations. Please try again in a moment.";

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationCard {
    pub career: Career,
    /// Already in the user's Compass.
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationsState {
    Loading,
    Failed(String),
    Empty,
    Ready(Vec<RecommendationCard>),
}

impl RecommendationsState {
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        if snapshot.loading {
            return RecommendationsState::Loading;
        }
        if snapshot.has_error() {
            return RecommendationsState::Failed(LOAD_FAILED.to_string());
        }
        let recommendations = snapshot.recommendations();
        if recommendations.is_empty() {
            return RecommendationsState::Empty;
        }
        let cards = recommendations
            .iter()
            .map(|career| RecommendationCard {
                saved: snapshot.saved_path(&career.career_name).is_some(),
                career: career.clone(),
            })
            .collect();
        RecommendationsState::Ready(cards)
    }
}

pub struct RecommendationsView {
    ctx: ViewContext,
}

impl RecommendationsView {
    pub fn new(ctx: ViewContext) -> Self {
        Self { ctx }
    }

    pub fn state(&self) -> RecommendationsState {
        RecommendationsState::from_snapshot(&self.ctx.store.snapshot())
    }

    /// Asks the backend to regenerate, then reloads the cached data. Only a
    /// failure produces a notice.
    pub async fn refresh(&self) -> Option<Notice> {
        match self.ctx.api.refresh_recommendations().await {
            Ok(_) => {
                self.ctx.store.refresh_current().await;
                None
            }
            Err(e) => {
                error!("Failed to refresh recommendations: {e}");
                Some(Notice::Danger(REFRESH_FAILED.to_string()))
            }
        }
    }

    /// Saves a recommended career into the Compass. Saving one that is
    /// already there is a no-op.
    pub async fn save_to_compass(&self, career: &Career) -> ClientResult<()> {
        if self
            .ctx
            .store
            .snapshot()
            .saved_path(&career.career_name)
            .is_some()
        {
            return Ok(());
        }
        self.ctx.store.add_career(career.clone()).await
    }
}
