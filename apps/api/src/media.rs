//! Media host client.
//!
//! Item images live on an external media host, addressed by an opaque asset
//! id. This module owns the upload/delete calls and the ordering rules that
//! keep the database and the blob store from drifting apart:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Image Replacement Ordering                         │
//! │                                                                         │
//! │  1. Upload the new blob ──── failure? ──► UploadError, nothing else    │
//! │         │                                  happens (no DB write, old   │
//! │         ▼                                  blob untouched)             │
//! │  2. Delete the old blob (best-effort; a failure is logged, never       │
//! │     surfaced)                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  3. Caller writes the new url/id to the database                       │
//! │                                                                         │
//! │  The DB is never left pointing at a blob that failed to upload, and    │
//! │  an old blob is only deleted after its replacement is stored.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Externally hosted images (a bare http(s) URL) are adopted verbatim: no
//! upload, no asset id, and this system never deletes them.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, warn};

// =============================================================================
// Configuration & Errors
// =============================================================================

/// Media host credentials.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Base URL of the media host API.
    pub base_url: String,
    /// Bearer token for upload/delete calls.
    pub api_key: String,
    /// Folder/namespace new assets are filed under.
    pub folder: String,
}

/// Media host failures.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media host is not configured")]
    NotConfigured,

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("media host rejected the request: HTTP {0}")]
    Rejected(u16),

    #[error("media host unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

// =============================================================================
// Image Payload Classification
// =============================================================================

/// The three shapes an incoming image can take.
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Raw bytes from a multipart file part.
    Bytes(Vec<u8>),
    /// A `data:*;base64,...` URI from a JSON body.
    DataUri(String),
    /// An externally hosted image; adopted as-is, never owned by us.
    ExternalUrl(String),
}

impl ImagePayload {
    /// Classifies the `image_url` value of a JSON body. Anything that is
    /// neither a data URI nor an http(s) URL is ignored.
    pub fn classify(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with("data:") {
            Some(ImagePayload::DataUri(value.to_string()))
        } else if value.starts_with("http://") || value.starts_with("https://") {
            Some(ImagePayload::ExternalUrl(value.to_string()))
        } else {
            None
        }
    }
}

/// Decodes a `data:[<mediatype>];base64,<payload>` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, MediaError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| MediaError::InvalidDataUri("missing data: prefix".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| MediaError::InvalidDataUri("missing ',' separator".to_string()))?;

    if !metadata.ends_with(";base64") {
        return Err(MediaError::InvalidDataUri(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    }

    BASE64
        .decode(payload.trim())
        .map_err(|e| MediaError::InvalidDataUri(e.to_string()))
}

// =============================================================================
// Client
// =============================================================================

/// A stored asset: where it is served from and how to delete it.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub url: String,
    pub asset_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    asset_id: String,
}

/// HTTP client for the media host. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    config: Option<Arc<MediaConfig>>,
}

impl MediaClient {
    /// Creates a client. `None` config disables uploads; deletes become
    /// no-ops and upload attempts fail with [`MediaError::NotConfigured`].
    pub fn new(config: Option<MediaConfig>) -> Self {
        MediaClient {
            http: reqwest::Client::new(),
            config: config.map(Arc::new),
        }
    }

    /// Uploads raw image bytes, returning the stored asset.
    pub async fn upload(&self, bytes: Vec<u8>) -> Result<MediaAsset, MediaError> {
        let config = self.config.as_ref().ok_or(MediaError::NotConfigured)?;

        debug!(size = bytes.len(), "Uploading image to media host");

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name("image"))
            .text("folder", config.folder.clone());

        let response = self
            .http
            .post(format!("{}/upload", config.base_url.trim_end_matches('/')))
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Rejected(response.status().as_u16()));
        }

        let body: UploadResponse = response.json().await?;
        Ok(MediaAsset {
            url: body.url,
            asset_id: body.asset_id,
        })
    }

    /// Deletes an asset by id.
    pub async fn delete(&self, asset_id: &str) -> Result<(), MediaError> {
        let config = self.config.as_ref().ok_or(MediaError::NotConfigured)?;

        let response = self
            .http
            .delete(format!(
                "{}/assets/{}",
                config.base_url.trim_end_matches('/'),
                asset_id
            ))
            .bearer_auth(&config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }

    /// Deletes an asset, swallowing failures.
    ///
    /// Blob cleanup must never block or roll back a database operation that
    /// already succeeded - the two stores share no commit protocol, so the
    /// worst case is an orphaned blob, not inconsistent inventory.
    pub async fn delete_best_effort(&self, asset_id: &str) {
        if let Err(err) = self.delete(asset_id).await {
            warn!(asset_id, %err, "Media asset cleanup failed; continuing");
        }
    }
}

// =============================================================================
// Image Resolution
// =============================================================================

/// Outcome of resolving an incoming image against an item's current one.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub url: Option<String>,
    pub asset_id: Option<String>,
    /// True when a fresh blob was uploaded for this request (so the caller
    /// can clean it up if the database write fails afterwards).
    pub uploaded: bool,
}

/// Resolves the image for a create/edit request.
///
/// Upload failures propagate before the caller performs any database write.
pub async fn resolve_image(
    client: &MediaClient,
    payload: Option<ImagePayload>,
    current_url: Option<&str>,
    current_ref: Option<&str>,
) -> Result<ResolvedImage, MediaError> {
    match payload {
        // No new image: keep whatever the item has.
        None => Ok(ResolvedImage {
            url: current_url.map(String::from),
            asset_id: current_ref.map(String::from),
            uploaded: false,
        }),

        // Externally hosted: adopt the URL, own nothing.
        Some(ImagePayload::ExternalUrl(url)) => Ok(ResolvedImage {
            url: Some(url),
            asset_id: None,
            uploaded: false,
        }),

        Some(ImagePayload::DataUri(uri)) => {
            let bytes = decode_data_uri(&uri)?;
            upload_replacing(client, bytes, current_ref).await
        }

        Some(ImagePayload::Bytes(bytes)) => upload_replacing(client, bytes, current_ref).await,
    }
}

async fn upload_replacing(
    client: &MediaClient,
    bytes: Vec<u8>,
    current_ref: Option<&str>,
) -> Result<ResolvedImage, MediaError> {
    let asset = client.upload(bytes).await?;

    // Only after the replacement is confirmed stored.
    if let Some(old) = current_ref {
        client.delete_best_effort(old).await;
    }

    Ok(ResolvedImage {
        url: Some(asset.url),
        asset_id: Some(asset.asset_id),
        uploaded: true,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_data_uri() {
        let payload = ImagePayload::classify("data:image/png;base64,aGVsbG8=");
        assert!(matches!(payload, Some(ImagePayload::DataUri(_))));
    }

    #[test]
    fn classify_external_url() {
        for url in ["http://img.example.com/a.png", "https://img.example.com/a.png"] {
            assert!(matches!(
                ImagePayload::classify(url),
                Some(ImagePayload::ExternalUrl(_))
            ));
        }
    }

    #[test]
    fn classify_rejects_garbage() {
        assert!(ImagePayload::classify("not-an-image").is_none());
        assert!(ImagePayload::classify("").is_none());
        assert!(ImagePayload::classify("ftp://old.example.com/a.png").is_none());
    }

    #[test]
    fn decode_valid_data_uri() {
        let bytes = decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn decode_rejects_non_base64_uris() {
        assert!(decode_data_uri("data:text/plain,hello").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("image/png;base64,aGVsbG8=").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
    }

    #[tokio::test]
    async fn unconfigured_client_rejects_uploads() {
        let client = MediaClient::new(None);
        let err = client.upload(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, MediaError::NotConfigured));
    }

    #[tokio::test]
    async fn resolving_nothing_keeps_the_current_image() {
        let client = MediaClient::new(None);
        let resolved = resolve_image(
            &client,
            None,
            Some("https://img.example.com/old.png"),
            Some("asset-1"),
        )
        .await
        .unwrap();

        assert_eq!(resolved.url.as_deref(), Some("https://img.example.com/old.png"));
        assert_eq!(resolved.asset_id.as_deref(), Some("asset-1"));
        assert!(!resolved.uploaded);
    }

    #[tokio::test]
    async fn external_url_is_adopted_without_ownership() {
        let client = MediaClient::new(None);
        let resolved = resolve_image(
            &client,
            Some(ImagePayload::ExternalUrl(
                "https://cdn.example.com/new.png".to_string(),
            )),
            Some("https://img.example.com/old.png"),
            Some("asset-1"),
        )
        .await
        .unwrap();

        assert_eq!(resolved.url.as_deref(), Some("https://cdn.example.com/new.png"));
        assert!(resolved.asset_id.is_none());
        assert!(!resolved.uploaded);
    }
}
