/// ImageKit upload API client
///
/// Sends staged files to `POST https://upload.imagekit.io/api/v1/files/upload`
/// as a multipart form, authenticating with HTTP Basic auth (private key as
/// the username, empty password).
///
/// # Request fields
///
/// | Field | Value |
/// |---|---|
/// | `file` | file bytes, streamed from the staging file |
/// | `fileName` | original client file name |
/// | `useUniqueFileName` | `true` |
/// | `tags` | comma-separated provenance tags |
///
/// A 2xx answer carries `fileId`, `name` and `url`. Anything else becomes
/// [`StorageError::Rejected`] with the `message` field of the error body when
/// there is one.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{ObjectStore, StorageError, StorageResult, StoredObject, UploadRequest};

/// Public ImageKit upload endpoint
pub const DEFAULT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";

/// ImageKit client configuration
#[derive(Debug, Clone)]
pub struct ImageKitConfig {
    /// Account private key (`private_...`)
    pub private_key: String,

    /// Upload endpoint; overridable for proxies and test doubles
    pub upload_url: String,

    /// Per-request timeout covering the whole upload round trip
    pub timeout_seconds: u64,
}

impl ImageKitConfig {
    pub fn new(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Successful upload body (fields we use)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: String,
    name: String,
    url: String,
}

/// Error body returned on non-2xx answers
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// ImageKit-backed object store
pub struct ImageKitClient {
    http_client: HttpClient,
    private_key: String,
    upload_url: String,
}

impl ImageKitClient {
    /// Builds the client and its HTTP connection pool
    pub fn new(config: ImageKitConfig) -> StorageResult<Self> {
        if config.private_key.trim().is_empty() {
            return Err(StorageError::Configuration(
                "ImageKit private key is empty".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StorageError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        info!(upload_url = %config.upload_url, "ImageKit client initialized");

        Ok(Self {
            http_client,
            private_key: config.private_key,
            upload_url: config.upload_url,
        })
    }

    /// Streams the staged file from disk with a known length
    async fn file_part(request: &UploadRequest) -> StorageResult<(Part, u64)> {
        let file = tokio::fs::File::open(&request.path).await?;
        let size = file.metadata().await?.len();

        let mut part = Part::stream_with_length(reqwest::Body::from(file), size)
            .file_name(request.file_name.clone());
        if let Some(content_type) = &request.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| StorageError::Transport(format!("Invalid content type: {e}")))?;
        }

        Ok((part, size))
    }

    fn build_form(request: &UploadRequest, part: Part) -> Form {
        let mut form = Form::new()
            .part("file", part)
            .text("fileName", request.file_name.clone())
            .text("useUniqueFileName", "true");

        if !request.tags.is_empty() {
            form = form.text("tags", request.tags.join(","));
        }

        form
    }
}

/// Extracts a readable message from an error body
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                "no response body".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

#[async_trait]
impl ObjectStore for ImageKitClient {
    fn name(&self) -> &str {
        "imagekit"
    }

    async fn upload(&self, request: UploadRequest) -> StorageResult<StoredObject> {
        let (part, size) = Self::file_part(&request).await?;
        debug!(
            file_name = %request.file_name,
            size_bytes = size,
            "Uploading file to ImageKit"
        );

        let form = Self::build_form(&request, part);

        let response = self
            .http_client
            .post(&self.upload_url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = rejection_message(&body);
            warn!(status = status.as_u16(), %message, "ImageKit rejected upload");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        info!(file_id = %body.file_id, name = %body.name, "File stored in ImageKit");

        Ok(StoredObject {
            file_id: body.file_id,
            name: body.name,
            url: body.url,
        })
    }
}
