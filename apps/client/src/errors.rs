use thiserror::Error;

/// Client-level error type.
/// Every API wrapper and store mutation returns `Result<T, ClientError>`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("User not authenticated")]
    Unauthenticated,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Internal client error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// HTTP status carried by the error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Text suitable for showing next to the control that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthenticated => "Please sign in to continue.".to_string(),
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Api { status, .. } => format!("The server returned status {status}."),
            ClientError::Http(_) => "Could not connect to the server.".to_string(),
            ClientError::InvalidInput(msg) => msg.clone(),
            ClientError::Parse(_) | ClientError::Identity(_) | ClientError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
