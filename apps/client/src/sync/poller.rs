//! Recommendation poller.
//!
//! The backend generates recommendations asynchronously after a chat turn
//! fills in the profile, and there is no push channel to announce them. The
//! poller refreshes the store on a timer while the profile is complete and
//! no recommendations are cached, and stops as soon as either changes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::sync::store::{StoreSnapshot, SyncStore};

#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Multiplier applied to the delay after every attempt. 1.0 keeps the
    /// interval fixed.
    pub backoff_factor: f64,
    pub max_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(60),
        }
    }
}

impl PollConfig {
    /// Delay before the `attempt`-th (0-based) refresh.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        let cap = self.max_interval.max(self.interval).as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = (self.interval.as_secs_f64() * factor.powi(exponent)).min(cap);
        Duration::from_secs_f64(secs)
    }
}

/// Poll only for a signed-in user whose profile is complete and who has no
/// recommendations yet.
pub fn should_poll(snapshot: &StoreSnapshot, signed_in: bool) -> bool {
    signed_in
        && snapshot.recommendations().is_empty()
        && snapshot
            .profile()
            .is_some_and(|p| p.is_ready_for_recommendations())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStop {
    RecommendationsArrived,
    ConditionsLost,
    MaxAttempts,
    Cancelled,
}

/// Owns the polling task. Dropping or cancelling it stops the timer.
#[must_use = "dropping the handle cancels polling"]
pub struct PollHandle {
    handle: Option<JoinHandle<PollStop>>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Waits for the poller to stop on its own.
    pub async fn finished(mut self) -> PollStop {
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(PollStop::Cancelled),
            None => PollStop::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

pub struct RecommendationPoller;

impl RecommendationPoller {
    /// Returns `None` without creating a timer when polling is not needed.
    pub fn start(store: Arc<SyncStore>, config: PollConfig) -> Option<PollHandle> {
        let signed_in = store.session().principal().is_some();
        if !should_poll(&store.snapshot(), signed_in) {
            return None;
        }
        info!(
            "Polling for new recommendations every {:?} (max {} attempts)",
            config.interval, config.max_attempts
        );
        let handle = tokio::spawn(run(store, config));
        Some(PollHandle {
            handle: Some(handle),
        })
    }
}

async fn run(store: Arc<SyncStore>, config: PollConfig) -> PollStop {
    let mut rx = store.watch();

    for attempt in 0..config.max_attempts {
        let sleep = tokio::time::sleep(config.delay_for(attempt));
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return PollStop::Cancelled;
                    }
                    if let Some(stop) = stop_reason(&store) {
                        return stop;
                    }
                }
            }
        }

        debug!("Polling for new recommendations (attempt {})", attempt + 1);
        store.refresh_current().await;

        if let Some(stop) = stop_reason(&store) {
            return stop;
        }
    }

    warn!(
        "Recommendations still missing after {} polls; giving up",
        config.max_attempts
    );
    PollStop::MaxAttempts
}

fn stop_reason(store: &SyncStore) -> Option<PollStop> {
    let snapshot = store.snapshot();
    if !snapshot.recommendations().is_empty() {
        info!("Recommendations arrived; polling stopped");
        return Some(PollStop::RecommendationsArrived);
    }
    if !should_poll(&snapshot, store.session().principal().is_some()) {
        debug!("Polling conditions no longer hold; polling stopped");
        return Some(PollStop::ConditionsLost);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Principal, SessionSource};
    use crate::models::{Compass, UserData, UserProfile};
    use crate::sync::testing::{career, ready_profile, MockBackend};
    use serde_json::Map;

    async fn store_with(profile: UserProfile) -> (Arc<MockBackend>, Arc<SyncStore>) {
        let backend = Arc::new(MockBackend::with_data(UserData {
            profile,
            ..Default::default()
        }));
        let session = SessionSource::new();
        session.sign_in(Principal::new("u1", None));
        let store = Arc::new(SyncStore::new(backend.clone(), session));
        store.refresh("u1").await;
        (backend, store)
    }

    fn with_recommendations() -> UserData {
        UserData {
            profile: ready_profile(),
            compass: Compass {
                saved_paths: vec![],
                recommendations: vec![career("Data Analyst", &["SQL"])],
                extra: Map::new(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_delay_is_fixed_by_default() {
        let config = PollConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_secs(5));
        assert_eq!(config.delay_for(10), Duration::from_secs(5));
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = PollConfig {
            backoff_factor: 2.0,
            max_interval: Duration::from_secs(30),
            ..Default::default()
        };
        assert_eq!(config.delay_for(0), Duration::from_secs(5));
        assert_eq!(config.delay_for(1), Duration::from_secs(10));
        assert_eq!(config.delay_for(2), Duration::from_secs(20));
        assert_eq!(config.delay_for(3), Duration::from_secs(30));
        assert_eq!(config.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_career_goals_never_starts_timer() {
        let mut profile = ready_profile();
        profile.career_goals = None;
        let (backend, store) = store_with(profile).await;
        let fetches = backend.fetch_count();

        assert!(RecommendationPoller::start(store, PollConfig::default()).is_none());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.fetch_count(), fetches);
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_recommendations_never_start_timer() {
        let backend = Arc::new(MockBackend::with_data(with_recommendations()));
        let session = SessionSource::new();
        session.sign_in(Principal::new("u1", None));
        let store = Arc::new(SyncStore::new(backend, session));
        store.refresh("u1").await;

        assert!(RecommendationPoller::start(store, PollConfig::default()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_recommendations_arrive() {
        let (backend, store) = store_with(ready_profile()).await;
        let fetches = backend.fetch_count();

        let handle = RecommendationPoller::start(store, PollConfig::default()).unwrap();

        let publisher = {
            let backend = backend.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(12)).await;
                backend.set_data(with_recommendations());
            })
        };

        assert_eq!(handle.finished().await, PollStop::RecommendationsArrived);
        publisher.await.unwrap();
        assert_eq!(backend.fetch_count() - fetches, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let (backend, store) = store_with(ready_profile()).await;
        let fetches = backend.fetch_count();
        let config = PollConfig {
            max_attempts: 3,
            ..Default::default()
        };

        let handle = RecommendationPoller::start(store, config).unwrap();

        assert_eq!(handle.finished().await, PollStop::MaxAttempts);
        assert_eq!(backend.fetch_count() - fetches, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_stops_polling() {
        let (backend, store) = store_with(ready_profile()).await;
        let fetches = backend.fetch_count();
        let handle = RecommendationPoller::start(store.clone(), PollConfig::default()).unwrap();

        store.session().sign_out();
        store.clear_session();

        assert_eq!(handle.finished().await, PollStop::ConditionsLost);
        assert_eq!(backend.fetch_count(), fetches);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_timer() {
        let (backend, store) = store_with(ready_profile()).await;
        let fetches = backend.fetch_count();
        let handle = RecommendationPoller::start(store, PollConfig::default()).unwrap();

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(backend.fetch_count(), fetches);
    }
}
