use crate::config::WebhookConfig;
use crate::services::retry::{RetryPolicy, retry};
use reqwest::Client;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

/// Body posted to the invoice-extraction automation
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[validate(length(min = 1, max = 128))]
    pub uuid: String,
    #[validate(url)]
    pub file_url: String,
}

/// What a successful call returned
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookResponse {
    /// 2xx with a JSON body
    Parsed(Value),
    /// 2xx with an empty or non-JSON body; the automation accepted the job
    Accepted,
}

impl WebhookResponse {
    fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body)
            .map(WebhookResponse::Parsed)
            .unwrap_or(WebhookResponse::Accepted)
    }

    pub fn to_value(&self) -> Value {
        match self {
            WebhookResponse::Parsed(v) => v.clone(),
            WebhookResponse::Accepted => json!({ "status": "success" }),
        }
    }
}

impl Serialize for WebhookResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Webhook rejected the request with status {status}: {body}")]
    ClientError { status: u16, body: String },

    #[error("Webhook failed with status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Webhook network error: {0}")]
    Network(String),
}

/// User-facing classification of a terminal webhook failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Timeout,
    InvalidRequest,
    ServiceUnavailable,
    Network,
}

impl FailureCategory {
    pub fn message(self) -> &'static str {
        match self {
            FailureCategory::Timeout => "AI processing timed out",
            FailureCategory::InvalidRequest => "Invalid request to AI processing service",
            FailureCategory::ServiceUnavailable => "AI processing service unavailable",
            FailureCategory::Network => "Failed to connect to AI processing service",
        }
    }
}

impl WebhookError {
    /// 4xx means the request itself is wrong; repeating it cannot help
    pub fn is_retryable(&self) -> bool {
        !matches!(self, WebhookError::ClientError { .. })
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            WebhookError::Timeout(_) => FailureCategory::Timeout,
            WebhookError::ClientError { .. } => FailureCategory::InvalidRequest,
            WebhookError::ServerError { .. } => FailureCategory::ServiceUnavailable,
            WebhookError::Network(_) => FailureCategory::Network,
        }
    }
}

impl From<reqwest::Error> for WebhookError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WebhookError::Timeout(Duration::ZERO)
        } else {
            WebhookError::Network(e.to_string())
        }
    }
}

/// Client for the AI invoice-processing webhook (n8n)
pub struct WebhookClient {
    http: Client,
    url: String,
    username: String,
    password: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &WebhookConfig) -> Self {
        Self {
            http,
            url: config.url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.timeout(),
            policy: RetryPolicy::from_retries(config.retries, config.backoff_base()),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Posts `request`, retrying timeouts, network failures and 5xx responses
    pub async fn call(&self, request: &WebhookRequest) -> Result<WebhookResponse, WebhookError> {
        tracing::info!(uuid = %request.uuid, url = %self.url, "Calling invoice processing webhook");

        let result = retry(&self.policy, WebhookError::is_retryable, move |attempt| {
            self.attempt(request, attempt)
        })
        .await;

        match &result {
            Ok(_) => tracing::info!(uuid = %request.uuid, "Webhook accepted invoice"),
            Err(e) => tracing::error!(uuid = %request.uuid, error = %e, "Webhook call failed"),
        }
        result
    }

    async fn attempt(
        &self,
        request: &WebhookRequest,
        attempt: u32,
    ) -> Result<WebhookResponse, WebhookError> {
        tracing::debug!(
            attempt,
            max_attempts = self.policy.max_attempts,
            "Sending webhook request"
        );

        let send = self
            .http
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(request)
            .send();

        // The deadline covers the exchange up to response headers only
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| WebhookError::Timeout(self.timeout))?
            .map_err(|e| match WebhookError::from(e) {
                WebhookError::Timeout(_) => WebhookError::Timeout(self.timeout),
                other => other,
            })?;

        let status = response.status();

        if status.is_success() {
            // A body cut off midway is a transport failure, not an accepted job
            let body = response
                .bytes()
                .await
                .map_err(|e| WebhookError::Network(format!("failed to read response body: {}", e)))?;
            return Ok(WebhookResponse::from_body(&body));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(WebhookError::ClientError {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(WebhookError::ServerError {
                status: status.as_u16(),
                body,
            })
        }
    }
}
