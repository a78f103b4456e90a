pub mod dto;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::{ApiError, AppError, GENERIC_SERVER_ERROR};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `ROLLCALL_API_URL` and `ROLLCALL_TIMEOUT_SECS`. An explicit
    /// base URL takes precedence over the environment.
    pub fn from_env_with_url(base_url: Option<String>) -> Result<Self, AppError> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var("ROLLCALL_API_URL")
                .map_err(|_| AppError::Config("ROLLCALL_API_URL is not set".to_string()))?,
        };
        let timeout_secs = match env::var("ROLLCALL_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout_secs(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Timeouts are whole seconds and must be positive; a zero timeout would
/// fail every request.
pub fn parse_timeout_secs(raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::Config(
            "ROLLCALL_TIMEOUT_SECS must be at least 1".to_string(),
        )),
        Ok(secs) => Ok(secs),
        Err(_) => Err(AppError::Config(format!(
            "ROLLCALL_TIMEOUT_SECS is not a number: {}",
            raw
        ))),
    }
}

/// Uniform result of every call. Transport failures and timeouts show up
/// as status 500 with a generic payload; nothing is ever thrown past here.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub payload: Value,
}

impl ApiResponse {
    pub fn new(status: u16, payload: Value) -> Self {
        Self { status, payload }
    }

    pub fn server_error() -> Self {
        Self::new(500, Value::String(GENERIC_SERVER_ERROR.to_string()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn expect_status(self, expected: u16) -> Result<Value, ApiError> {
        if self.status == expected {
            Ok(self.payload)
        } else {
            Err(ApiError::from_payload(self.status, &self.payload))
        }
    }

    pub fn decode<T: DeserializeOwned>(self, expected: u16) -> Result<T, ApiError> {
        let payload = self.expect_status(expected)?;
        serde_json::from_value(payload).map_err(|e| {
            warn!("unexpected response shape: {}", e);
            ApiError::new(500, "Unexpected response from server")
        })
    }
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> ApiResponse;
    async fn post(&self, path: &str, body: Value) -> ApiResponse;
    async fn put(&self, path: &str, body: Value) -> ApiResponse;
}

pub struct ReqwestHttpClient {
    client: Client,
    base_url: String,
}

impl ReqwestHttpClient {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        Url::parse(&config.base_url).map_err(|e| {
            AppError::Config(format!("Invalid API url {}: {}", config.base_url, e))
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, String> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| e.to_string())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<Value>,
    ) -> ApiResponse {
        let url = match self.url(path, params) {
            Ok(url) => url,
            Err(e) => {
                error!("cannot build url for {}: {}", path, e);
                return ApiResponse::server_error();
            }
        };
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("{} {} failed: {}", method, path, e);
                return ApiResponse::server_error();
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!("{} {} body could not be read: {}", method, path, e);
                return ApiResponse::server_error();
            }
        };

        let payload = parse_body(&text);
        if status.is_success() {
            debug!("{} {} -> {}", method, path, status);
            ApiResponse::new(status.as_u16(), payload)
        } else {
            warn!("{} {} -> {}", method, path, status);
            let payload = if payload.is_null() {
                Value::String(GENERIC_SERVER_ERROR.to_string())
            } else {
                payload
            };
            ApiResponse::new(status.as_u16(), payload)
        }
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> ApiResponse {
        self.send(Method::GET, path, params, None).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResponse {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResponse {
        self.send(Method::PUT, path, &[], Some(body)).await
    }
}
