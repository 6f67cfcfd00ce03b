//! Async HTTP client for the image backend.
//!
//! The backend owns asset records and their lifecycle; this client only
//! reads them and submits uploads. Endpoints:
//!
//! - `GET /images` -- asset list
//! - `GET /images/{id}` -- asset detail (may carry geolocation meta)
//! - `GET /images/{id}/download` -- raw stored bytes
//! - `POST /upload` -- multipart file upload
//!
//! Non-2xx responses become [`FetchError::Status`] with the body kept
//! verbatim, so upload rejections surface the server's own message.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::FetchError;
use crate::geometry::GeoBounds;

/// Lifecycle state of a stored asset. The producing pipeline owns this
/// enumeration; these are its exact wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Processing,
    Done,
    Error,
}

/// Processing metadata attached to an asset once the backend has looked
/// at it. Unknown fields are preserved for field-wise merging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One stored asset as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub original_name: Option<String>,
    pub status: ImageStatus,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub meta: Option<ImageMeta>,
}

impl ImageRecord {
    /// The name to classify previews by: the upload's original name when
    /// known, else the stored filename.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.filename)
    }
}

/// Upload acknowledgement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadReceipt {
    pub id: i64,
    pub filename: String,
    pub status: ImageStatus,
}

/// Read access to asset records and payload bytes.
///
/// The seam exists so the preview pipeline can run against an in-memory
/// source in tests; [`ApiClient`] is the production implementation.
pub trait AssetSource {
    fn detail(&self, id: i64) -> impl Future<Output = Result<ImageRecord, FetchError>> + Send;
    fn bytes(&self, id: i64) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// HTTP client for the backend described by a [`Config`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `GET /images`
    pub async fn list_images(&self) -> Result<Vec<ImageRecord>, FetchError> {
        let url = format!("{}/images", self.config.base_url);
        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// `GET /images/{id}`
    pub async fn image_detail(&self, id: i64) -> Result<ImageRecord, FetchError> {
        let url = format!("{}/images/{id}", self.config.base_url);
        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// `GET /images/{id}/download` -- the stored payload, verbatim.
    pub async fn download(&self, id: i64) -> Result<Vec<u8>, FetchError> {
        let url = self.config.download_url(id);
        let response = check_status(self.http.get(&url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /upload` with a multipart file body.
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, FetchError> {
        let url = format!("{}/upload", self.config.base_url);
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response =
            check_status(self.http.post(&url).multipart(form).send().await?).await?;
        Ok(response.json().await?)
    }
}

impl AssetSource for ApiClient {
    async fn detail(&self, id: i64) -> Result<ImageRecord, FetchError> {
        self.image_detail(id).await
    }

    async fn bytes(&self, id: i64) -> Result<Vec<u8>, FetchError> {
        self.download(id).await
    }
}

/// Convert a non-2xx response into [`FetchError::Status`], keeping the
/// body text verbatim.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(FetchError::Status {
        status: status.as_u16(),
        body,
    })
}
