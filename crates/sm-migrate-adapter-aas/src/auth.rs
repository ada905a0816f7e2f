//! OAuth2 client-credentials token provider.
//!
//! A token is requested once per run and never refreshed.

use crate::client::TwinClient;
use serde::Deserialize;
use std::fmt;

/// Client-credentials grant parameters.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Token endpoint URL
    pub token_url: String,
    /// OAuth2 client id
    pub client_id: String,
    /// OAuth2 client secret
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl TwinClient {
    /// Exchange client credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the endpoint answers anything but
    /// 200, or the response lacks a non-empty `access_token`.
    pub async fn request_token(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<BearerToken, AuthError> {
        tracing::debug!(
            token_url = %credentials.token_url,
            client_id = %credentials.client_id,
            "Requesting client-credentials token"
        );

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&credentials.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        if status != 200 {
            return Err(AuthError::Rejected { status, body });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))?;

        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(BearerToken(token)),
            _ => Err(AuthError::MissingToken),
        }
    }
}

/// Errors from the token endpoint.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// Token request could not be sent
    #[error("token request error: {0}")]
    Request(String),
    /// Token endpoint answered with a non-200 status
    #[error("token request failed ({status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Token response was not JSON
    #[error("token response parse error: {0}")]
    Parse(String),
    /// Token response had no usable `access_token`
    #[error("token response did not contain 'access_token'")]
    MissingToken,
}
