//! HTTP client for the source, destination and registry APIs.
//!
//! One `reqwest` client is shared by every call of a run. Certificates are
//! verified unless [`TwinClientConfig::accept_invalid_certs`] is set.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct TwinClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra trusted root certificate (PEM format)
    pub ca_cert_path: Option<PathBuf>,
    /// Skip certificate verification entirely
    pub accept_invalid_certs: bool,
}

impl Default for TwinClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            ca_cert_path: None,
            accept_invalid_certs: false,
        }
    }
}

/// Raw response of a POST, classified by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

/// HTTP client for submodel migration.
#[derive(Debug, Clone)]
pub struct TwinClient {
    pub(crate) client: Client,
}

impl TwinClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created, or if the CA
    /// certificate cannot be read or parsed.
    pub fn new(config: TwinClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout);

        if let Some(ca_path) = &config.ca_cert_path {
            let ca_cert = fs::read(ca_path).map_err(|e| {
                ClientError::Init(format!(
                    "failed to read CA certificate {}: {e}",
                    ca_path.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&ca_cert)
                .map_err(|e| ClientError::Init(format!("failed to parse CA certificate: {e}")))?;
            builder = builder.add_root_certificate(cert);
            tracing::debug!(ca_path = %ca_path.display(), "Loaded custom CA certificate");
        }

        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is DISABLED for this run");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self { client })
    }

    /// GET a JSON document. Anything but 200 is an error.
    ///
    /// # Errors
    ///
    /// Returns error on network failure, non-200 status, or a body that is
    /// not JSON.
    pub async fn get_json(&self, url: &str) -> Result<Value, ClientError> {
        tracing::debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// POST a JSON body, optionally with a bearer token.
    ///
    /// Every status is returned as-is; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or its body cannot be read.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        bearer_token: Option<&str>,
    ) -> Result<PostResponse, ClientError> {
        tracing::debug!(url, "POST");

        let mut request = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body);

        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(PostResponse { status, body })
    }
}

/// Errors that can occur with the HTTP client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
    /// HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// API returned an unexpected status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// Response parsing failed
    #[error("parse error: {0}")]
    Parse(String),
}
