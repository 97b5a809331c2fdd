//! Synchronization store: the client's single cached copy of `UserData`.
//!
//! Mutations are optimistic: the local change is published first, the
//! remote call second. A failed remote call is recovered by refreshing the
//! whole document from the backend (revert-by-refresh), after which the
//! error is handed back to the caller.
//!
//! Refreshes are sequenced. Each one takes a ticket when it starts, and its
//! result is only applied if
//! - the session still belongs to the same uid,
//! - no later-started refresh has already been applied,
//! - no optimistic mutation is in flight when the response arrives, and
//! - no mutation settled while the request was out.
//!
//! A refresh that finishes while a mutation is in flight marks the store for
//! resync; the resync runs once the last in-flight mutation settles. One
//! that was overtaken by mutations which have all settled fetches again.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::errors::{ClientError, ClientResult};
use crate::identity::{AuthState, Principal, SessionSource, SessionSubscription};
use crate::models::{Career, CompassEntry, UserData, UserProfile};
use crate::sync::backend::ProfileBackend;

/// Upper bound on back-to-back refetches when a refresh keeps being
/// overtaken by mutations that have already settled.
const MAX_REFRESH_ROUNDS: usize = 3;

#[derive(Debug, Clone, Default)]
struct Sequencing {
    next_ticket: u64,
    applied_ticket: u64,
    /// Bumped every time a mutation settles.
    settled: u64,
    in_flight: usize,
    resync_pending: bool,
}

/// Read-only view of the store handed to feature views.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// uid the cached data belongs to.
    pub uid: Option<String>,
    pub data: Option<UserData>,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped on every local change.
    pub generation: u64,
    seq: Sequencing,
}

impl StoreSnapshot {
    pub fn profile(&self) -> Option<&UserProfile> {
        self.data.as_ref().map(|d| &d.profile)
    }

    pub fn recommendations(&self) -> &[Career] {
        self.data
            .as_ref()
            .map(|d| d.compass.recommendations.as_slice())
            .unwrap_or(&[])
    }

    pub fn saved_paths(&self) -> &[CompassEntry] {
        self.data
            .as_ref()
            .map(|d| d.compass.saved_paths.as_slice())
            .unwrap_or(&[])
    }

    pub fn saved_path(&self, career_name: &str) -> Option<&CompassEntry> {
        self.saved_paths().iter().find(|p| p.name() == career_name)
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshOutcome {
    Applied,
    /// Session changed or a newer refresh already landed.
    Superseded,
    /// A mutation is still in flight; it will trigger the resync.
    Deferred,
    /// A mutation settled while we were fetching.
    Refetch,
}

pub struct SyncStore {
    backend: Arc<dyn ProfileBackend>,
    session: SessionSource,
    state: watch::Sender<StoreSnapshot>,
}

impl SyncStore {
    pub fn new(backend: Arc<dyn ProfileBackend>, session: SessionSource) -> Self {
        let initial = StoreSnapshot {
            loading: !session.current().is_resolved(),
            ..Default::default()
        };
        let (state, _rx) = watch::channel(initial);
        Self {
            backend,
            session,
            state,
        }
    }

    /// Starts following the session source. The store refreshes on every
    /// sign-in and drops its data on sign-out. Bind once per store.
    pub fn bind(self: &Arc<Self>) -> SessionSubscription {
        let store = Arc::clone(self);
        let mut rx = self.session.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                let auth = rx.borrow_and_update().clone();
                store.on_session_change(auth).await;
                if rx.changed().await.is_err() {
                    debug!("Session source dropped; store listener exiting");
                    break;
                }
            }
        });

        SessionSubscription::new(handle)
    }

    async fn on_session_change(&self, auth: AuthState) {
        match auth {
            AuthState::Checking => {}
            AuthState::SignedIn(principal) => {
                self.state.send_modify(|s| {
                    s.loading = true;
                    if s.uid.as_deref() != Some(principal.uid.as_str()) {
                        s.data = None;
                        s.error = None;
                    }
                    s.generation += 1;
                });
                self.refresh(&principal.uid).await;
                self.state.send_modify(|s| s.loading = false);
            }
            AuthState::SignedOut => self.clear_session(),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// Fires on every local change: optimistic applies, refreshes, resets.
    pub fn watch(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn session(&self) -> &SessionSource {
        &self.session
    }

    /// Drops everything cached for the previous principal.
    pub fn clear_session(&self) {
        self.state.send_modify(|s| {
            s.uid = None;
            s.data = None;
            s.error = None;
            s.loading = false;
            s.seq.applied_ticket = s.seq.next_ticket;
            s.seq.resync_pending = false;
            s.generation += 1;
        });
    }

    /// Fetches the authoritative document for `uid`. Never fails: not-found
    /// becomes an empty document and any other error is recorded in
    /// `StoreSnapshot::error` with an empty document substituted.
    pub async fn refresh(&self, uid: &str) {
        for _ in 0..MAX_REFRESH_ROUNDS {
            if self.refresh_once(uid).await != RefreshOutcome::Refetch {
                return;
            }
            debug!("Refresh for {uid} overtaken by a settled mutation; refetching");
        }
        warn!("Refresh for {uid} kept losing to concurrent mutations; giving up");
    }

    /// Refreshes for whoever is signed in; no-op when signed out.
    pub async fn refresh_current(&self) {
        if let Some(principal) = self.session.principal() {
            self.refresh(&principal.uid).await;
        }
    }

    async fn refresh_once(&self, uid: &str) -> RefreshOutcome {
        let mut ticket = 0;
        let mut settled = 0;
        self.state.send_if_modified(|s| {
            s.seq.next_ticket += 1;
            ticket = s.seq.next_ticket;
            settled = s.seq.settled;
            false
        });

        let result = self.backend.fetch_user_data(uid).await;

        let session_uid = self.session.principal().map(|p| p.uid);
        let mut outcome = RefreshOutcome::Applied;
        self.state.send_if_modified(|s| {
            if session_uid.as_deref() != Some(uid) || ticket <= s.seq.applied_ticket {
                outcome = RefreshOutcome::Superseded;
                return false;
            }
            if s.seq.in_flight > 0 {
                s.seq.resync_pending = true;
                outcome = RefreshOutcome::Deferred;
                return false;
            }
            if s.seq.settled != settled {
                outcome = RefreshOutcome::Refetch;
                return false;
            }

            s.seq.applied_ticket = ticket;
            s.seq.resync_pending = false;
            match &result {
                Ok(Some(data)) => {
                    s.data = Some(data.clone());
                    s.error = None;
                }
                Ok(None) => {
                    s.data = Some(UserData::default());
                    s.error = None;
                }
                Err(e) => {
                    s.data = Some(UserData::default());
                    s.error = Some(e.user_message());
                }
            }
            s.uid = Some(uid.to_string());
            s.generation += 1;
            true
        });

        match (&outcome, &result) {
            (RefreshOutcome::Applied, Err(e)) => {
                error!("Error refreshing user data for {uid}: {e}")
            }
            (RefreshOutcome::Applied, Ok(None)) => info!("No profile yet for {uid}; starting empty"),
            (RefreshOutcome::Superseded, _) => debug!("Discarded superseded refresh for {uid}"),
            (RefreshOutcome::Deferred, _) => {
                debug!("Refresh for {uid} deferred until in-flight mutations settle")
            }
            _ => {}
        }
        outcome
    }

    fn require_principal(&self) -> ClientResult<Principal> {
        self.session.principal().ok_or(ClientError::Unauthenticated)
    }

    /// Shallow-merges `delta` into the profile and saves the merged profile.
    pub async fn update_profile(&self, delta: UserProfile) -> ClientResult<()> {
        let principal = self.require_principal()?;
        let backend = Arc::clone(&self.backend);
        self.mutate(
            &principal,
            "save profile",
            move |data| {
                data.profile = data.profile.merged(&delta);
                data.profile.clone()
            },
            move |uid, merged| async move { backend.save_profile(&uid, &merged).await },
        )
        .await
    }

    /// Appends a fresh Compass entry locally and posts the original career.
    pub async fn add_career(&self, career: Career) -> ClientResult<()> {
        let principal = self.require_principal()?;
        if career.career_name.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Invalid career data: career_name is required".to_string(),
            ));
        }
        let entry = CompassEntry::from_career(&career);
        let backend = Arc::clone(&self.backend);
        self.mutate(
            &principal,
            "add career",
            move |data| data.compass.saved_paths.push(entry),
            move |_, ()| async move { backend.add_career(&career).await },
        )
        .await
    }

    /// Removes every saved path named exactly `career_name`.
    pub async fn remove_career(&self, career_name: &str) -> ClientResult<()> {
        let principal = self.require_principal()?;
        let name = career_name.to_string();
        let backend = Arc::clone(&self.backend);
        self.mutate(
            &principal,
            "remove career",
            |data| data.compass.saved_paths.retain(|p| p.name() != career_name),
            move |_, ()| async move { backend.remove_career(&name).await },
        )
        .await
    }

    /// Marks one pathway skill complete or pending.
    pub async fn set_skill_status(
        &self,
        career_name: &str,
        skill: &str,
        complete: bool,
    ) -> ClientResult<()> {
        let principal = self.require_principal()?;
        let (name, skill_name) = (career_name.to_string(), skill.to_string());
        let backend = Arc::clone(&self.backend);
        self.mutate(
            &principal,
            "update skill status",
            |data| {
                if let Some(entry) = find_entry(data, career_name) {
                    entry.set_skill_status(skill, complete);
                }
            },
            move |_, ()| async move {
                backend
                    .update_skill_status(&name, &skill_name, complete)
                    .await
            },
        )
        .await
    }

    /// Stores an assessment score; the skill becomes complete.
    pub async fn record_assessment_score(
        &self,
        career_name: &str,
        skill: &str,
        score: f64,
        total_questions: usize,
    ) -> ClientResult<()> {
        let principal = self.require_principal()?;
        let (name, skill_name) = (career_name.to_string(), skill.to_string());
        let backend = Arc::clone(&self.backend);
        self.mutate(
            &principal,
            "save assessment score",
            |data| {
                if let Some(entry) = find_entry(data, career_name) {
                    entry.record_score(skill, score);
                }
            },
            move |_, ()| async move {
                backend
                    .save_assessment_score(&name, &skill_name, score, total_questions)
                    .await
            },
        )
        .await
    }

    /// Applies `apply` locally, then runs `remote`. On remote failure the
    /// store is refreshed before the error is returned; with other
    /// mutations still in flight that refresh is deferred until they settle.
    async fn mutate<T, A, R, Fut>(
        &self,
        principal: &Principal,
        action: &str,
        apply: A,
        remote: R,
    ) -> ClientResult<()>
    where
        A: FnOnce(&mut UserData) -> T,
        R: FnOnce(String, T) -> Fut,
        Fut: Future<Output = ClientResult<()>>,
    {
        let mut applied = None;
        self.state.send_modify(|s| {
            let data = s.data.get_or_insert_with(UserData::default);
            applied = Some(apply(data));
            s.seq.in_flight += 1;
            s.generation += 1;
        });
        let Some(payload) = applied else {
            return Err(ClientError::Internal(anyhow::anyhow!(
                "optimistic update for '{action}' was not applied"
            )));
        };

        let result = remote(principal.uid.clone(), payload).await;

        let resync = self.settle();
        if let Err(e) = &result {
            error!("Failed to {action}: {e}; reverting to server state");
            self.refresh(&principal.uid).await;
        } else if resync {
            debug!("Last in-flight mutation settled; resyncing {}", principal.uid);
            self.refresh(&principal.uid).await;
        }
        result
    }

    /// Marks one mutation as finished. Returns whether a deferred refresh is
    /// now due.
    fn settle(&self) -> bool {
        let mut resync = false;
        self.state.send_if_modified(|s| {
            s.seq.in_flight = s.seq.in_flight.saturating_sub(1);
            s.seq.settled += 1;
            resync = s.seq.in_flight == 0 && s.seq.resync_pending;
            false
        });
        resync
    }
}

fn find_entry<'a>(data: &'a mut UserData, career_name: &str) -> Option<&'a mut CompassEntry> {
    data.compass
        .saved_paths
        .iter_mut()
        .find(|p| p.name() == career_name)
}
