use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Default upload ceiling shared by invoices and logos: 5 MiB
pub const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Signed URLs handed out for invoices live for 90 days
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 90 * 24 * 60 * 60;

/// Object storage (Supabase Storage REST API) settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base project URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Service role key sent as bearer token and `apikey` header
    pub service_key: String,

    /// Bucket receiving invoice files (default: "invoices")
    pub invoice_bucket: String,

    /// Bucket receiving producer logos (default: "producers")
    pub logo_bucket: String,

    /// Lifetime of signed invoice URLs in seconds (default: 90 days)
    pub signed_url_expiry_secs: u64,
}

impl StorageConfig {
    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:54321".to_string(),
            service_key: String::new(),
            invoice_bucket: "invoices".to_string(),
            logo_bucket: "producers".to_string(),
            signed_url_expiry_secs: DEFAULT_SIGNED_URL_EXPIRY_SECS,
        }
    }
}

/// AI invoice-processing webhook settings
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub username: String,
    pub password: String,

    /// Per-attempt timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Retries after the first attempt (default: 2, so 3 attempts total)
    pub retries: u32,

    /// Base delay of the exponential backoff in milliseconds (default: 1000)
    pub backoff_base_ms: u64,
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5678/webhook/invoice-processing".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            timeout_secs: 30,
            retries: 2,
            backoff_base_ms: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum upload size in bytes (default: 5 MiB)
    pub max_file_size: usize,

    /// HS256 secret used to validate session tokens
    pub jwt_secret: String,

    /// CORS origins allowed to call the API
    pub allowed_origins: Vec<String>,

    pub storage: StorageConfig,
    pub webhook: WebhookConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            jwt_secret: "secret".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            storage: StorageConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("CRITICAL: {} must be set", key))
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: parsed_or("MAX_FILE_SIZE", default.max_file_size),

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            storage: StorageConfig {
                url: env::var("STORAGE_URL").unwrap_or(default.storage.url),
                service_key: env::var("STORAGE_SERVICE_KEY")
                    .unwrap_or(default.storage.service_key),
                invoice_bucket: env::var("STORAGE_INVOICE_BUCKET")
                    .unwrap_or(default.storage.invoice_bucket),
                logo_bucket: env::var("STORAGE_LOGO_BUCKET")
                    .unwrap_or(default.storage.logo_bucket),
                signed_url_expiry_secs: parsed_or(
                    "SIGNED_URL_EXPIRY_SECS",
                    default.storage.signed_url_expiry_secs,
                ),
            },

            webhook: WebhookConfig {
                url: env::var("WEBHOOK_URL").unwrap_or(default.webhook.url),
                username: env::var("WEBHOOK_USERNAME").unwrap_or(default.webhook.username),
                password: env::var("WEBHOOK_PASSWORD").unwrap_or(default.webhook.password),
                timeout_secs: parsed_or("WEBHOOK_TIMEOUT_SECS", default.webhook.timeout_secs),
                retries: parsed_or("WEBHOOK_RETRIES", default.webhook.retries),
                backoff_base_ms: parsed_or("WEBHOOK_BACKOFF_MS", default.webhook.backoff_base_ms),
            },
        }
    }

    /// Create config for development (local Supabase and n8n, relaxed CORS)
    pub fn development() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Create config for production: every credential must come from the environment
    pub fn production() -> Result<Self> {
        let base = Self::from_env();

        Ok(Self {
            jwt_secret: required("JWT_SECRET")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| vec!["https://admin.hunt-tickets.com".to_string()]),
            storage: StorageConfig {
                url: required("STORAGE_URL")?,
                service_key: required("STORAGE_SERVICE_KEY")?,
                ..base.storage
            },
            webhook: WebhookConfig {
                url: required("WEBHOOK_URL")?,
                username: required("WEBHOOK_USERNAME")?,
                password: required("WEBHOOK_PASSWORD")?,
                ..base.webhook
            },
            ..base
        })
    }
}
