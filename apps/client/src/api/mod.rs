/// API client: the single point of entry for all calls to the Disha backend.
///
/// Every request made while a principal is signed in carries a freshly
/// minted `Authorization: Bearer <token>` header. Tokens are never cached
/// here; the `TokenSource` decides whether to refresh.
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::errors::{ClientError, ClientResult};
use crate::identity::{SessionSource, TokenSource};

pub mod auth;
pub mod career;
pub mod chat;
pub mod forge;
pub mod users;

/// Generic acknowledgement body (`{"status": "...", "message": "..."}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionSource,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionSource,
        tokens: Arc<dyn TokenSource>,
    ) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.call(Method::GET, path, None).await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.call(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.call(Method::POST, path, None).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        self.call(Method::DELETE, path, body).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        let response = self.execute(method, path, body).await?;
        Ok(response.json::<T>().await?)
    }

    /// Sends the request and maps every non-2xx answer to `ClientError::Api`.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        let request = self.authorize(request).await;

        let response = request.send().await.map_err(|e| {
            error!("API request {method} {path} failed: {e}");
            ClientError::Http(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Unauthorized on {method} {path}: identity token may be invalid or expired");
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("API {method} {path} returned {status}: {body}");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        debug!("API {method} {path} -> {status}");
        Ok(response)
    }

    /// Attaches a bearer token when a principal is signed in. A token
    /// failure is logged and the request goes out anonymously.
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(principal) = self.session.principal() else {
            return request;
        };
        match self.tokens.id_token(&principal).await {
            Ok(token) => request.bearer_auth(token),
            Err(e) => {
                error!("Error attaching identity token for {}: {e}", principal.uid);
                request
            }
        }
    }
}

/// Pulls a human-readable message out of an error body. The backend answers
/// with `{"detail": ...}`; other shapes fall back to the raw text.
fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    let candidate = value
        .get("detail")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("error").and_then(|e| e.get("message")));

    match candidate {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}
