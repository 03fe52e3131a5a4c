//! Wire and payload types

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::client::error::ClientError;

/// Body sent to the refresh endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by a successful refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Multipart form payload for [`WicketClient::upload`](crate::WicketClient::upload).
///
/// Parts are kept as owned data so the form can be rebuilt when the request
/// is re-sent after a token refresh; `reqwest` forms are consumed on send.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    parts: Vec<UploadPart>,
}

#[derive(Debug, Clone)]
struct UploadPart {
    name: String,
    kind: UploadPartKind,
}

#[derive(Debug, Clone)]
enum UploadPartKind {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

impl UploadForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(UploadPart {
            name: name.into(),
            kind: UploadPartKind::Text(value.into()),
        });
        self
    }

    /// Append a file field; the transport picks the content type
    pub fn file(
        self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.file_with_content_type(name, file_name, None, data)
    }

    /// Append a file field with an explicit content type
    pub fn file_with_content_type(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(UploadPart {
            name: name.into(),
            kind: UploadPartKind::File {
                file_name: file_name.into(),
                content_type,
                data: data.into(),
            },
        });
        self
    }

    /// Number of parts in the form
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the form has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Build a fresh transport form from the stored parts.
    pub(crate) fn to_multipart(&self) -> Result<reqwest::multipart::Form, ClientError> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            let built = match &part.kind {
                UploadPartKind::Text(value) => reqwest::multipart::Part::text(value.clone()),
                UploadPartKind::File {
                    file_name,
                    content_type,
                    data,
                } => {
                    let mut built = reqwest::multipart::Part::bytes(data.to_vec())
                        .file_name(file_name.clone());
                    if let Some(content_type) = content_type {
                        built = built.mime_str(content_type)?;
                    }
                    built
                }
            };
            form = form.part(part.name.clone(), built);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_form_collects_parts() {
        let form = UploadForm::new()
            .text("kind", "avatar")
            .file("file", "avatar.png", Bytes::from_static(b"\x89PNG"));

        assert_eq!(form.len(), 2);
        assert!(!form.is_empty());
        assert!(form.to_multipart().is_ok());
    }

    #[test]
    fn test_upload_form_rejects_bad_content_type() {
        let form = UploadForm::new().file_with_content_type(
            "file",
            "a.bin",
            Some("not a mime".to_string()),
            Bytes::from_static(b"xx"),
        );
        assert!(form.to_multipart().is_err());
    }
}
