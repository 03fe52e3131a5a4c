//! Authenticated HTTP client with transparent access-token refresh
//!
//! Wraps a `reqwest` transport with bearer-token injection sourced from a
//! pluggable token store, and a one-shot refresh-and-retry flow for requests
//! rejected with 401.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::{ClientConfig, RequestOptions, WicketClient, WicketClientBuilder};
pub use types::{RefreshRequest, RefreshResponse, UploadForm};
