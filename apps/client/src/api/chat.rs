use tracing::error;

use crate::api::{ApiClient, Confirmation};
use crate::errors::{ClientError, ClientResult};
use crate::models::chat::{ChatHistory, ChatReply, ChatRequest, ChatTurn};

impl ApiClient {
    /// POST /chat
    /// The reply carries the full, server-ordered history.
    pub async fn send_message(&self, message: &str) -> ClientResult<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ClientError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }
        self.post("/chat", &ChatRequest { message })
            .await
            .inspect_err(|e| error!("Error sending chat message: {e}"))
    }

    /// GET /chat/history
    pub async fn chat_history(&self) -> ClientResult<Vec<ChatTurn>> {
        let history: ChatHistory = self
            .get("/chat/history")
            .await
            .inspect_err(|e| error!("Failed to fetch chat history: {e}"))?;
        Ok(history.history)
    }

    /// DELETE /chat/{id}
    pub async fn delete_chat_turn(&self, turn_id: &str) -> ClientResult<Confirmation> {
        self.delete(&format!("/chat/{turn_id}"), None)
            .await
            .inspect_err(|e| error!("Failed to delete chat turn {turn_id}: {e}"))
    }

    /// DELETE /chat/all
    pub async fn clear_chat_history(&self) -> ClientResult<Confirmation> {
        self.delete("/chat/all", None)
            .await
            .inspect_err(|e| error!("Failed to clear chat history: {e}"))
    }
}
