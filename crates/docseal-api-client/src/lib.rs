//! Shared HTTP client for the document sealing API.
//!
//! Provides a minimal client with optional auth (Bearer token or X-API-Key),
//! generic GET/POST helpers that classify failures into `SealError`, and
//! domain methods (verify, seal, proof, borrower, audit trail).

pub mod api;

use bytes::Bytes;
use docseal_core::{AuthScheme, ClientConfig, SealError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// API path prefix.
pub const API_PREFIX: &str = "/api";

/// HTTP client for the sealing API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Option<Auth>,
}

impl ApiClient {
    pub fn new(base_url: &str, auth: Option<Auth>, timeout: Duration) -> Result<Self, SealError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SealError::Unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, SealError> {
        let auth = config.api_key.clone().map(|key| match config.auth_scheme {
            AuthScheme::Bearer => Auth::Bearer(key),
            AuthScheme::ApiKey => Auth::XApiKey(key),
        });
        Self::new(&config.api_url, auth, config.request_timeout())
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(Auth::Bearer(token)) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            Some(Auth::XApiKey(key)) => request.header("X-API-Key", key.as_str()),
            None => request,
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SealError> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));
        if !query.is_empty() {
            request = request.query(query);
        }
        tracing::debug!(url = %url, "GET");
        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SealError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));
        tracing::debug!(url = %url, "POST");
        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await
    }
}

fn transport_error(err: reqwest::Error) -> SealError {
    if err.is_decode() {
        SealError::Unknown(format!("Failed to read response: {}", err))
    } else {
        SealError::Network(err.to_string())
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SealError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        let err = SealError::from_response(status.as_u16(), &error_text);
        tracing::debug!(status = status.as_u16(), error = %err, "API request failed");
        return Err(err);
    }

    let body: Bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|e| {
        SealError::Unknown(format!("Failed to parse response as JSON: {}", e))
    })
}

pub use docseal_core::models::{AuditTrail, BorrowerInfo, SealResponse, VerifyResponse};
