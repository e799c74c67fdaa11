use std::time::Duration;

use serde::Deserialize;

/// Host (and optional port) of the metadata server, e.g. for an emulator.
pub const ENV_GCE_METADATA_HOST: &str = "GCE_METADATA_HOST";

/// Endpoints and timeouts for the Google Cloud REST clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpClientConfig {
    /// Per-request timeout applied to every REST call.
    pub request_timeout: Duration,
    pub metadata_endpoint: String,
    pub secret_manager_endpoint: String,
    pub alloydb_endpoint: String,
}

impl Default for GcpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            metadata_endpoint: "http://metadata.google.internal".to_string(),
            secret_manager_endpoint: "https://secretmanager.googleapis.com".to_string(),
            alloydb_endpoint: "https://alloydb.googleapis.com".to_string(),
        }
    }
}

impl GcpClientConfig {
    /// Defaults, with the metadata server moved to `GCE_METADATA_HOST` when set.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::default();
        match lookup(ENV_GCE_METADATA_HOST).filter(|v| !v.is_empty()) {
            Some(host) => config.with_metadata_endpoint(format!("http://{host}")),
            None => config,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata_endpoint = endpoint.into();
        self
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth access tokens for the instance's default service account.
#[derive(Debug, Clone)]
pub struct MetadataTokenSource {
    http: reqwest::Client,
    endpoint: String,
}

impl MetadataTokenSource {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.endpoint.trim_end_matches('/')
        )
    }

    pub async fn access_token(&self) -> Result<String, reqwest::Error> {
        let response: TokenResponse = self
            .http
            .get(self.token_url())
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.access_token)
    }
}
