use std::borrow::Cow;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::token::{GcpClientConfig, MetadataTokenSource};

/// Fully-qualified secret version: `projects/{project}/secrets/{secret}/versions/{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersionName {
    pub project: String,
    pub secret: String,
    pub version: String,
}

impl core::fmt::Display for SecretVersionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "projects/{}/secrets/{}/versions/{}",
            self.project, self.secret, self.version
        )
    }
}

/// Opaque secret bytes. `Debug` never prints the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretPayload(Vec<u8>);

impl SecretPayload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload as text; invalid UTF-8 sequences are replaced.
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl core::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SecretPayload(<{} bytes redacted>)", self.0.len())
    }
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to obtain access token: {0}")]
    Token(#[source] reqwest::Error),

    #[error("secret {name} not found")]
    NotFound { name: String },

    #[error("request for secret {name} failed: {source}")]
    Request {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("secret {name} payload is not valid base64: {source}")]
    Payload {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Secret-retrieval collaborator.
#[async_trait]
pub trait SecretAccessor: Send + Sync {
    async fn access_secret_version(
        &self,
        name: &SecretVersionName,
    ) -> Result<SecretPayload, SecretError>;
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: PayloadBody,
}

#[derive(Debug, Deserialize)]
struct PayloadBody {
    #[serde(default)]
    data: String,
}

/// Secret Manager REST client (`v1 ... versions/*:access`).
#[derive(Debug, Clone)]
pub struct SecretManagerClient {
    http: reqwest::Client,
    tokens: MetadataTokenSource,
    endpoint: String,
}

impl SecretManagerClient {
    pub fn new(config: &GcpClientConfig) -> Result<Self, reqwest::Error> {
        let http = config.http_client()?;
        Ok(Self {
            tokens: MetadataTokenSource::new(http.clone(), config.metadata_endpoint.clone()),
            http,
            endpoint: config.secret_manager_endpoint.clone(),
        })
    }

    fn access_url(&self, name: &SecretVersionName) -> String {
        format!("{}/v1/{}:access", self.endpoint.trim_end_matches('/'), name)
    }
}

fn decode_payload(name: &SecretVersionName, data: &str) -> Result<SecretPayload, SecretError> {
    STANDARD
        .decode(data.trim())
        .map(SecretPayload)
        .map_err(|source| SecretError::Payload {
            name: name.to_string(),
            source,
        })
}

#[async_trait]
impl SecretAccessor for SecretManagerClient {
    async fn access_secret_version(
        &self,
        name: &SecretVersionName,
    ) -> Result<SecretPayload, SecretError> {
        let token = self.tokens.access_token().await.map_err(SecretError::Token)?;
        let request_error = |source: reqwest::Error| SecretError::Request {
            name: name.to_string(),
            source,
        };

        let response = self
            .http
            .get(self.access_url(name))
            .bearer_auth(token)
            .send()
            .await
            .map_err(request_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SecretError::NotFound {
                name: name.to_string(),
            });
        }

        let body: AccessSecretVersionResponse = response
            .error_for_status()
            .map_err(request_error)?
            .json()
            .await
            .map_err(request_error)?;

        decode_payload(name, &body.payload.data)
    }
}
