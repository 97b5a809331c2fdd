use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use crate::guard::RouteGuard;
use crate::identity::{Principal, SessionSource, SessionSubscription, TokenSource};
use crate::models::UserProfile;
use crate::sync::{PollHandle, RecommendationPoller, SyncStore};
use crate::views::{
    CompassView, DiscoverView, ForgeSession, ProfileEditor, RecommendationsView, ViewContext,
};

/// Application context handed down to every view. Owns the session source,
/// the API client and the store, plus the store's session subscription.
/// Must be started inside a Tokio runtime.
pub struct AppContext {
    config: Config,
    session: SessionSource,
    api: ApiClient,
    store: Arc<SyncStore>,
    subscription: Option<SessionSubscription>,
}

impl AppContext {
    pub fn start(config: Config, tokens: Arc<dyn TokenSource>) -> ClientResult<Self> {
        let session = SessionSource::new();
        let api = ApiClient::new(
            config.api_base_url.clone(),
            config.http_timeout,
            session.clone(),
            tokens,
        )?;
        let store = Arc::new(SyncStore::new(Arc::new(api.clone()), session.clone()));
        let subscription = store.bind();
        info!("Client context started against {}", api.base_url());

        Ok(Self {
            config,
            session,
            api,
            store,
            subscription: Some(subscription),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionSource {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &Arc<SyncStore> {
        &self.store
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.clone())
    }

    pub fn view_context(&self) -> ViewContext {
        ViewContext {
            api: self.api.clone(),
            store: self.store.clone(),
        }
    }

    pub fn profile_editor(&self) -> ProfileEditor {
        ProfileEditor::new(self.view_context())
    }

    pub fn discover(&self) -> DiscoverView {
        DiscoverView::new(self.view_context(), self.config.poll.clone())
    }

    pub fn recommendations(&self) -> RecommendationsView {
        RecommendationsView::new(self.view_context())
    }

    pub fn compass(&self) -> CompassView {
        CompassView::new(self.view_context())
    }

    pub fn forge(&self) -> ForgeSession {
        ForgeSession::new(self.view_context())
    }

    /// Recommendation poller with the configured schedule.
    pub fn start_polling(&self) -> Option<PollHandle> {
        RecommendationPoller::start(self.store.clone(), self.config.poll.clone())
    }

    /// First sign-in after account creation: publishes the principal and
    /// seeds the backend profile with the account's email.
    pub async fn complete_sign_up(&self, principal: Principal) -> ClientResult<()> {
        let Some(email) = principal.email.clone() else {
            return Err(ClientError::InvalidInput(
                "An email address is required to sign up".to_string(),
            ));
        };
        let uid = principal.uid.clone();
        self.session.sign_in(principal);
        self.api
            .save_profile(
                &uid,
                &UserProfile {
                    email: Some(email),
                    ..Default::default()
                },
            )
            .await?;
        info!("Signed up {uid}");
        self.store.refresh(&uid).await;
        Ok(())
    }

    /// Deletes the account server-side, then signs out locally.
    pub async fn delete_account(&self) -> ClientResult<()> {
        if self.session.principal().is_none() {
            return Err(ClientError::Unauthenticated);
        }
        self.api.delete_account().await?;
        warn!("Account deleted; signing out");
        self.session.sign_out();
        Ok(())
    }

    /// Stops following the session source.
    pub async fn shutdown(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release().await;
        }
        info!("Client context shut down");
    }
}
