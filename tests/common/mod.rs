#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use chrono::Utc;
use http_body_util::BodyExt;
use hunt_tickets_backend::config::{AppConfig, WebhookConfig};
use hunt_tickets_backend::entities::producers;
use hunt_tickets_backend::infrastructure::{database, seed};
use hunt_tickets_backend::services::database::SeaOrmDatabase;
use hunt_tickets_backend::services::storage::{StorageError, StorageErrorBody, StorageService};
use hunt_tickets_backend::services::webhook::WebhookClient;
use hunt_tickets_backend::{AppState, create_app};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const BOUNDARY: &str = "----hunt-test-boundary";

pub const PRODUCER_ID: &str = "prod_1";

pub struct StoredObject {
    pub bucket: String,
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory stand-in for the storage API
pub struct MockStorageService {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    pub fail_signing: AtomicBool,
    pub reject_uploads: AtomicBool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail_signing: AtomicBool::new(false),
            reject_uploads: AtomicBool::new(false),
        }
    }

    pub fn object(&self, key: &str) -> Option<(String, Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| (o.bucket.clone(), o.data.clone(), o.content_type.clone()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.reject_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected {
                status: 400,
                body: StorageErrorBody::Json(json!({
                    "statusCode": "403",
                    "error": "Unauthorized",
                    "message": "new row violates row-level security policy"
                })),
            });
        }

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bucket: bucket.to_string(),
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidResponse("missing signedURL".to_string()));
        }
        Ok(format!(
            "https://storage.test/object/sign/{}/{}?token=mock&expiresIn={}",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://storage.test/object/public/{}/{}", bucket, key)
    }
}

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    seed::seed_reference_data(&db).await.unwrap();

    producers::ActiveModel {
        id: Set(PRODUCER_ID.to_string()),
        name: Set("Hunt Live".to_string()),
        email: Set(Some("ops@hunt.test".to_string())),
        logo: Set(None),
        logo_white: Set(None),
        logo_black: Set(None),
        logo_banner: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .unwrap();

    db
}

pub fn test_config(webhook_url: &str) -> AppConfig {
    AppConfig {
        jwt_secret: "test_secret".to_string(),
        webhook: WebhookConfig {
            url: webhook_url.to_string(),
            timeout_secs: 1,
            retries: 2,
            backoff_base_ms: 1,
            ..WebhookConfig::default()
        },
        ..AppConfig::default()
    }
}

pub async fn test_app(storage: Arc<MockStorageService>, config: AppConfig) -> axum::Router {
    let db = setup_test_db().await;
    let webhook = Arc::new(WebhookClient::new(&config.webhook));
    let state = AppState::new(Arc::new(SeaOrmDatabase::new(db)), storage, webhook, config);
    create_app(state)
}

/// Builds a multipart body with an optional file part and text fields
pub fn multipart_body(
    file: Option<(&str, &str, &[u8])>,
    fields: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((file_name, content_type, data)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Minimal one-page PDF
pub fn sample_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
2 0 obj << /Type /Pages /Kids [] /Count 0 >> endobj\n\
trailer << /Root 1 0 R >>\n%%EOF\n"
        .to_vec()
}

/// Noisy JPEG so the encoded size stays realistic for a phone photo
pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) as u8;
        image::Rgb([v, v.wrapping_add(x as u8), v.wrapping_add(y as u8)])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95)
        .encode_image(&img)
        .unwrap();
    out
}
