use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::ApiClient;

#[derive(Debug, Serialize)]
struct EmailCheckRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmailCheckResponse {
    #[serde(default)]
    exists: bool,
}

impl ApiClient {
    /// POST /auth/check-email
    /// Used before a password reset. Any failure answers `true` so the flow
    /// falls back to the identity provider's own handling.
    pub async fn check_email_exists(&self, email: &str) -> bool {
        match self
            .post::<EmailCheckResponse, _>("/auth/check-email", &EmailCheckRequest { email })
            .await
        {
            Ok(resp) => resp.exists,
            Err(e) => {
                warn!("Email check failed, assuming the account exists: {e}");
                true
            }
        }
    }
}
