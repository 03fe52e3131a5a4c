//! Access-token refresh flow

use reqwest::StatusCode;

use super::WicketClient;
use super::error::ClientError;
use crate::types::{RefreshRequest, RefreshResponse};

/// Per-call attempt marker threaded through the dispatch loop.
///
/// A request already marked `Refreshed` never triggers a second exchange, so
/// a still-invalid refresh token cannot loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attempt {
    Initial,
    Refreshed,
}

impl WicketClient {
    /// Exchange the stored refresh token for a new access token.
    ///
    /// The new token pair is persisted to the store before the access token
    /// is handed back to the retry path. The exchange itself goes out on the
    /// bare transport: no bearer header, no nested refresh.
    pub(crate) async fn refresh_access_token(&self) -> Result<String, ClientError> {
        let refresh_token = self
            .store
            .get(&self.config.refresh_token_key)
            .await
            .ok_or(ClientError::Unauthorized)?;

        let response = self
            .client
            .post(self.join_url(&self.config.refresh_path))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            tracing::warn!(status = %response.status(), "refresh endpoint rejected the token exchange");
            return Err(ClientError::RefreshFailed);
        }

        let tokens: RefreshResponse = response.json().await?;
        self.store
            .set(&self.config.access_token_key, tokens.access_token.clone())
            .await;
        self.store
            .set(&self.config.refresh_token_key, tokens.refresh_token)
            .await;

        tracing::debug!("access token refreshed");
        Ok(tokens.access_token)
    }
}
