use crate::config::StorageConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Error payload returned by the storage API, kept as sent
#[derive(Debug, Clone, PartialEq)]
pub enum StorageErrorBody {
    Json(Value),
    Text(String),
}

impl StorageErrorBody {
    fn parse(raw: String) -> Self {
        serde_json::from_str(&raw)
            .map(StorageErrorBody::Json)
            .unwrap_or(StorageErrorBody::Text(raw))
    }

    pub fn to_value(&self) -> Value {
        match self {
            StorageErrorBody::Json(v) => v.clone(),
            StorageErrorBody::Text(t) => Value::String(t.clone()),
        }
    }
}

impl std::fmt::Display for StorageErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageErrorBody::Json(v) => write!(f, "{}", v),
            StorageErrorBody::Text(t) => write!(f, "{}", t),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: StorageErrorBody },

    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected storage response: {0}")]
    InvalidResponse(String),
}

impl StorageError {
    /// JSON detail suitable for an error response body
    pub fn details(&self) -> Value {
        match self {
            StorageError::Rejected { status, body } => json!({
                "status": status,
                "body": body.to_value(),
            }),
            other => Value::String(other.to_string()),
        }
    }
}

#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Signed URL when the storage API grants one, public URL otherwise.
    /// An upload that succeeded is never failed because signing did not.
    async fn signed_or_public_url(&self, bucket: &str, key: &str, expires_in: Duration) -> String {
        match self.create_signed_url(bucket, key, expires_in).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    bucket,
                    key,
                    error = %e,
                    "Failed to create signed URL, falling back to public URL"
                );
                self.public_url(bucket, key)
            }
        }
    }
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: Option<String>,
}

/// Supabase Storage over its REST API
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(client: Client, base_url: &str, service_key: String) -> Self {
        Self {
            client,
            base_url: format!("{}/storage/v1", base_url.trim_end_matches('/')),
            service_key,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(Client::new(), &config.url, config.service_key.clone())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/object/{}/{}", self.base_url, bucket, key)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }

    async fn ensure_success(response: Response) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            status: status.as_u16(),
            body: StorageErrorBody::parse(raw),
        })
    }
}

#[async_trait]
impl StorageService for SupabaseStorage {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = data.len();
        let response = self
            .authorized(self.client.post(self.object_url(bucket, key)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if let Err(e) = Self::ensure_success(response).await {
            tracing::error!(bucket, key, error = %e, "Storage upload failed");
            return Err(e);
        }

        tracing::info!(bucket, key, size, "Uploaded object to storage");
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let url = format!("{}/object/sign/{}/{}", self.base_url, bucket, key);
        let response = self
            .authorized(self.client.post(url))
            .json(&json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await?;

        let signed: SignedUrlResponse = Self::ensure_success(response).await?.json().await?;
        let path = signed
            .signed_url
            .ok_or_else(|| StorageError::InvalidResponse("missing signedURL".to_string()))?;

        // Older storage versions answer with a path relative to /storage/v1
        match url::Url::parse(&path) {
            Ok(absolute) => Ok(absolute.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            }
            Err(e) => Err(StorageError::InvalidResponse(format!(
                "bad signedURL '{}': {}",
                path, e
            ))),
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, bucket, key)
    }
}
