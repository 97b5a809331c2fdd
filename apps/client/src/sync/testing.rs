//! In-memory `ProfileBackend` shared by the store, poller and view tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Map;
use tokio::sync::Notify;

use crate::errors::{ClientError, ClientResult};
use crate::models::{Career, CompassEntry, UserData, UserProfile};
use crate::sync::backend::ProfileBackend;

/// Lets a test hold a backend call open: the backend signals `entered`
/// and then waits for `release`.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// Behaves like the real backend: writes land in `server`, fetches return
/// it (404 while it is `None`).
#[derive(Default)]
pub struct MockBackend {
    server: Mutex<Option<UserData>>,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
    fetches: AtomicUsize,
    writes: AtomicUsize,
    last_added: Mutex<Option<Career>>,
    fetch_gate: Mutex<Option<Arc<Gate>>>,
    write_gate: Mutex<Option<Arc<Gate>>>,
}

impl MockBackend {
    pub fn with_data(data: UserData) -> Self {
        let backend = Self::default();
        *backend.server.lock().unwrap() = Some(data);
        backend
    }

    pub fn set_data(&self, data: UserData) {
        *self.server.lock().unwrap() = Some(data);
    }

    pub fn server_data(&self) -> Option<UserData> {
        self.server.lock().unwrap().clone()
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Gates only the next fetch.
    pub fn gate_next_fetch(&self, gate: Arc<Gate>) {
        *self.fetch_gate.lock().unwrap() = Some(gate);
    }

    /// Gates every write until cleared.
    pub fn gate_writes(&self, gate: Arc<Gate>) {
        *self.write_gate.lock().unwrap() = Some(gate);
    }

    pub fn ungate_writes(&self) {
        *self.write_gate.lock().unwrap() = None;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.fetch_count() + self.write_count()
    }

    pub fn last_added(&self) -> Option<Career> {
        self.last_added.lock().unwrap().clone()
    }

    async fn write(&self, apply: impl FnOnce(&mut UserData)) -> ClientResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        let mut server = self.server.lock().unwrap();
        apply(server.get_or_insert_with(UserData::default));
        Ok(())
    }
}

#[async_trait]
impl ProfileBackend for MockBackend {
    async fn fetch_user_data(&self, _uid: &str) -> ClientResult<Option<UserData>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.server_data();
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(snapshot)
    }

    async fn save_profile(&self, _uid: &str, profile: &UserProfile) -> ClientResult<()> {
        let profile = profile.clone();
        self.write(|data| data.profile = profile).await
    }

    async fn add_career(&self, career: &Career) -> ClientResult<()> {
        *self.last_added.lock().unwrap() = Some(career.clone());
        let entry = CompassEntry::from_career(career);
        self.write(|data| {
            if data.compass.saved_paths.iter().all(|p| p.name() != entry.name()) {
                data.compass.saved_paths.push(entry);
            }
        })
        .await
    }

    async fn remove_career(&self, career_name: &str) -> ClientResult<()> {
        self.write(|data| data.compass.saved_paths.retain(|p| p.name() != career_name))
            .await
    }

    async fn update_skill_status(
        &self,
        career_name: &str,
        skill: &str,
        complete: bool,
    ) -> ClientResult<()> {
        self.write(|data| {
            if let Some(p) = data
                .compass
                .saved_paths
                .iter_mut()
                .find(|p| p.name() == career_name)
            {
                p.set_skill_status(skill, complete);
            }
        })
        .await
    }

    async fn save_assessment_score(
        &self,
        career_name: &str,
        skill: &str,
        score: f64,
        _total_questions: usize,
    ) -> ClientResult<()> {
        self.write(|data| {
            if let Some(p) = data
                .compass
                .saved_paths
                .iter_mut()
                .find(|p| p.name() == career_name)
            {
                p.record_score(skill, score);
            }
        })
        .await
    }
}

pub fn career(name: &str, pathway: &[&str]) -> Career {
    Career {
        career_name: name.to_string(),
        description: Some(format!("{name} path")),
        pathway: pathway.iter().map(|s| s.to_string()).collect(),
        extra: Map::new(),
    }
}

pub fn ready_profile() -> UserProfile {
    UserProfile {
        name: Some("Asha".to_string()),
        education: Some("B.Tech Computer Science".to_string()),
        career_goals: Some("Work with data".to_string()),
        interests: Some(vec!["analytics".to_string()]),
        skills: Some(vec!["Python".to_string()]),
        ..Default::default()
    }
}
