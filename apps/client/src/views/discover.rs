//! Discover: the mentor chat.
//!
//! Chat history is view state, not cached user data, so it lives here
//! rather than in the store. Sending a message shows the user's turn at once
//! with the mentor "typing", and the server's history replaces it when the
//! reply lands. A chat turn can fill in the profile server-side, so every
//! successful send refreshes the store and re-evaluates polling.

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::errors::{ClientError, ClientResult};
use crate::models::chat::{ChatTurn, TurnText};
use crate::sync::{PollConfig, PollHandle, RecommendationPoller};
use crate::views::ViewContext;

const TEMP_TURN_PREFIX: &str = "temp-";

pub struct DiscoverView {
    ctx: ViewContext,
    poll_config: PollConfig,
    turns: Vec<ChatTurn>,
    poller: Option<PollHandle>,
}

impl DiscoverView {
    pub fn new(ctx: ViewContext, poll_config: PollConfig) -> Self {
        Self {
            ctx,
            poll_config,
            turns: Vec::new(),
            poller: None,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Turns awaiting a server id cannot be deleted.
    pub fn is_pending(turn: &ChatTurn) -> bool {
        turn.id.starts_with(TEMP_TURN_PREFIX)
    }

    /// Loads the history for the signed-in user. Signed out, the view is
    /// emptied. A failed fetch keeps whatever was shown.
    pub async fn load_history(&mut self) {
        if self.ctx.store.session().principal().is_none() {
            self.turns.clear();
            return;
        }
        match self.ctx.api.chat_history().await {
            Ok(history) => self.turns = history,
            Err(e) => error!("Failed to fetch chat history: {e}"),
        }
    }

    /// Returns `false` when nothing was sent (blank input or no session).
    pub async fn send(&mut self, input: &str) -> bool {
        let text = input.trim();
        if text.is_empty() || self.ctx.store.session().principal().is_none() {
            return false;
        }

        let temp_id = format!("{TEMP_TURN_PREFIX}{}", Uuid::new_v4());
        self.turns.push(ChatTurn {
            id: temp_id.clone(),
            user: Some(TurnText::new(text)),
            ai: Some(TurnText::typing()),
        });

        match self.ctx.api.send_message(text).await {
            Ok(reply) => {
                debug!("Mentor replied with {} chars", reply.reply.len());
                self.turns = reply.history;
                self.ctx.store.refresh_current().await;
            }
            Err(e) => {
                let detail = match &e {
                    ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
                    _ => "Could not connect to the server.".to_string(),
                };
                if let Some(turn) = self.turns.iter_mut().find(|t| t.id == temp_id) {
                    turn.ai = Some(TurnText::new(format!("Error: {detail}")));
                }
            }
        }

        self.sync_polling();
        true
    }

    pub async fn delete_turn(&mut self, turn_id: &str) -> ClientResult<()> {
        if turn_id.starts_with(TEMP_TURN_PREFIX) {
            return Err(ClientError::InvalidInput(
                "Message has not been saved yet".to_string(),
            ));
        }
        self.ctx.api.delete_chat_turn(turn_id).await?;
        self.turns.retain(|t| t.id != turn_id);
        Ok(())
    }

    /// Clearing the chat also resets what the mentor learned, so the cached
    /// user data is refreshed afterwards.
    pub async fn clear_history(&mut self) -> ClientResult<()> {
        self.ctx.api.clear_chat_history().await?;
        self.turns.clear();
        self.ctx.store.refresh_current().await;
        self.sync_polling();
        Ok(())
    }

    /// Starts the recommendation poller when its conditions hold and none
    /// is running; drops a finished one. Returns whether polling is active.
    pub fn sync_polling(&mut self) -> bool {
        if self.poller.as_ref().is_some_and(PollHandle::is_running) {
            return true;
        }
        self.poller = RecommendationPoller::start(self.ctx.store.clone(), self.poll_config.clone());
        if self.poller.is_some() {
            info!("Waiting for recommendations");
        }
        self.poller.is_some()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(PollHandle::is_running)
    }

    /// Stops polling. Also happens when the view is dropped.
    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            debug!("Discover view closed; cancelling poller");
            handle.cancel();
        }
    }
}
