//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("{message}")]
    Http {
        /// HTTP status code of the rejected response
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// A refresh was required but no refresh token is stored
    #[error("Unauthorized Attempt!")]
    Unauthorized,

    /// The refresh endpoint rejected the token exchange
    #[error("Refresh access token request failed!")]
    RefreshFailed,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Normalize an error status and raw body into a client error.
    ///
    /// A JSON body with a `message` field supplies the message; otherwise the
    /// body text is used as-is, falling back to the canonical status text for
    /// empty bodies.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|payload| {
                payload
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });

        Self::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// Status code for errors that carry one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error means the session is no longer authenticated
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized) || self.status() == Some(401)
    }
}
