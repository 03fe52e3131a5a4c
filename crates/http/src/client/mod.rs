//! Wicket HTTP client

pub mod error;
mod refresh;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::de::DeserializeOwned;

use error::ClientError;
use refresh::Attempt;
use wicket_core::TokenStore;

use crate::types::UploadForm;

const USER_AGENT: &str = "wicket-client/0.1.0";

/// Immutable client settings supplied at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Prefix for relative request paths, without a trailing slash
    pub base_url: String,
    /// Path invoked to exchange the refresh token
    pub refresh_path: String,
    /// Store key for the access token
    pub access_token_key: String,
    /// Store key for the refresh token
    pub refresh_token_key: String,
    /// Whether a 401 response triggers the refresh flow
    pub enable_refresh: bool,
}

/// Per-request settings.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// JSON body, sent for POST/PUT/DELETE and ignored for GET
    pub body: Option<serde_json::Value>,
    /// Extra headers merged over the defaults
    pub headers: HashMap<String, String>,
    /// When set, a failing request resolves to `Ok(None)` instead of `Err`
    pub suppress_errors: bool,
}

impl RequestOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the JSON body
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add an extra header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Swallow request failures instead of propagating them
    pub fn suppress_errors(mut self) -> Self {
        self.suppress_errors = true;
        self
    }
}

/// Wicket API client
///
/// Owns one transport bound to the configured base URL and one token store
/// handle. All request methods route through the same header-merging and
/// error-handling logic; when refresh is enabled, a 401 is answered with a
/// single token exchange and retry before the failure reaches the caller.
#[derive(Clone)]
pub struct WicketClient {
    client: Client,
    config: ClientConfig,
    store: Arc<dyn TokenStore>,
}

impl WicketClient {
    /// Create a new client from a full configuration
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        Self::from_parts(config, store, None, None)
    }

    /// Create a new client builder
    pub fn builder() -> WicketClientBuilder {
        WicketClientBuilder::default()
    }

    fn from_parts(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        timeout: Option<Duration>,
        user_agent: Option<String>,
    ) -> Result<Self, ClientError> {
        for (field, value) in [
            ("base_url", &config.base_url),
            ("refresh_path", &config.refresh_path),
            ("access_token_key", &config.access_token_key),
            ("refresh_token_key", &config.refresh_token_key),
        ] {
            if value.is_empty() {
                return Err(ClientError::Configuration(format!("{field} is required")));
            }
        }

        let config = ClientConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        let user_agent = user_agent.unwrap_or_else(|| USER_AGENT.to_string());

        #[cfg(not(target_arch = "wasm32"))]
        let client = {
            let mut builder = ClientBuilder::new().user_agent(user_agent);
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            builder.build()?
        };

        #[cfg(target_arch = "wasm32")]
        let client = {
            let _ = timeout; // Timeouts not supported on WASM
            ClientBuilder::new().user_agent(user_agent).build()?
        };

        Ok(Self {
            client,
            config,
            store,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Bearer header value for the stored access token, if one is stored.
    pub async fn authorization_header(&self) -> Option<String> {
        let token = self.store.get(&self.config.access_token_key).await?;
        Some(format!("Bearer {token}"))
    }

    /// Issue a GET request; any body in `options` is not sent.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ClientError> {
        let options = RequestOptions {
            body: None,
            ..options
        };
        self.run(Method::GET, url, options).await
    }

    /// Issue a POST request
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ClientError> {
        self.run(Method::POST, url, options).await
    }

    /// Issue a PUT request
    pub async fn put<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ClientError> {
        self.run(Method::PUT, url, options).await
    }

    /// Issue a DELETE request; a body rides along per the transport's
    /// convention for bodied deletes.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ClientError> {
        self.run(Method::DELETE, url, options).await
    }

    /// POST a multipart form with only the authorization header set; the
    /// transport picks the content type and boundary. Upload failures always
    /// propagate.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        form: UploadForm,
    ) -> Result<Option<T>, ClientError> {
        let options = RequestOptions::default();
        self.dispatch(Method::POST, url, &options, Some(&form))
            .await
            .map(Some)
    }

    async fn run<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ClientError> {
        match self.dispatch(method, url, &options, None).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if options.suppress_errors => {
                tracing::debug!(error = %err, "request failure suppressed by caller");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Send the request, refreshing the access token at most once on 401.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        options: &RequestOptions,
        form: Option<&UploadForm>,
    ) -> Result<T, ClientError> {
        let mut attempt = Attempt::Initial;
        let mut fresh_token: Option<String> = None;

        loop {
            let request = self
                .build_request(&method, url, options, form, fresh_token.as_deref())
                .await?;
            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.json().await?);
            }

            if status == StatusCode::UNAUTHORIZED
                && self.config.enable_refresh
                && attempt == Attempt::Initial
            {
                // Mark before refreshing so a second 401 falls through below.
                attempt = Attempt::Refreshed;
                tracing::debug!(url, "access token rejected, exchanging refresh token");
                fresh_token = Some(self.refresh_access_token().await?);
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }
    }

    /// Merge headers in increasing precedence: default content type (JSON
    /// bodies only, not for DELETE), caller-supplied headers, authorization.
    async fn build_request(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
        form: Option<&UploadForm>,
        fresh_token: Option<&str>,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let mut headers = HeaderMap::new();

        if form.is_none() && *method != Method::DELETE {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Configuration(format!("invalid header name `{name}`")))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                ClientError::Configuration(format!("invalid value for header `{name}`"))
            })?;
            headers.insert(header_name, header_value);
        }

        let bearer = match fresh_token {
            Some(token) => Some(format!("Bearer {token}")),
            None => self.authorization_header().await,
        };
        if let Some(bearer) = bearer {
            let value = HeaderValue::from_str(&bearer).map_err(|_| {
                ClientError::Configuration("access token contains invalid characters".to_string())
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut request = self
            .client
            .request(method.clone(), self.join_url(url))
            .headers(headers);

        if let Some(form) = form {
            request = request.multipart(form.to_multipart()?);
        } else if let Some(body) = &options.body {
            request = request.json(body);
        }

        Ok(request)
    }

    /// Absolute URLs pass through; anything else is joined onto the base.
    fn join_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            format!("{}{}", self.config.base_url, url)
        }
    }
}

/// Builder for [`WicketClient`]
#[derive(Default)]
pub struct WicketClientBuilder {
    base_url: Option<String>,
    refresh_path: Option<String>,
    access_token_key: Option<String>,
    refresh_token_key: Option<String>,
    enable_refresh: bool,
    store: Option<Arc<dyn TokenStore>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl WicketClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Set the store key for the access token
    pub fn access_token_key(mut self, key: impl Into<String>) -> Self {
        self.access_token_key = Some(key.into());
        self
    }

    /// Set the store key for the refresh token
    pub fn refresh_token_key(mut self, key: impl Into<String>) -> Self {
        self.refresh_token_key = Some(key.into());
        self
    }

    /// Enable or disable the refresh flow (disabled by default)
    pub fn enable_refresh(mut self, enable: bool) -> Self {
        self.enable_refresh = enable;
        self
    }

    /// Set the token store
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the request timeout
    #[cfg(not(target_arch = "wasm32"))]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<WicketClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;
        let refresh_path = self
            .refresh_path
            .ok_or_else(|| ClientError::Configuration("refresh_path is required".into()))?;
        let access_token_key = self
            .access_token_key
            .ok_or_else(|| ClientError::Configuration("access_token_key is required".into()))?;
        let refresh_token_key = self
            .refresh_token_key
            .ok_or_else(|| ClientError::Configuration("refresh_token_key is required".into()))?;
        let store = self
            .store
            .ok_or_else(|| ClientError::Configuration("token_store is required".into()))?;

        WicketClient::from_parts(
            ClientConfig {
                base_url,
                refresh_path,
                access_token_key,
                refresh_token_key,
                enable_refresh: self.enable_refresh,
            },
            store,
            self.timeout,
            self.user_agent,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wicket_core::MemoryTokenStore;

    fn test_client(base_url: &str) -> WicketClient {
        WicketClient::builder()
            .base_url(base_url)
            .refresh_path("/auth/refresh")
            .access_token_key("at")
            .refresh_token_key("rt")
            .token_store(Arc::new(MemoryTokenStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = test_client("https://api.example.com/");
        assert_eq!(client.base_url(), "https://api.example.com");
    }

    #[test]
    fn test_join_url_relative_and_absolute() {
        let client = test_client("https://api.example.com");
        assert_eq!(client.join_url("/items"), "https://api.example.com/items");
        assert_eq!(
            client.join_url("https://other.example.com/items"),
            "https://other.example.com/items"
        );
    }
}
