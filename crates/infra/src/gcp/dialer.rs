use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::token::{GcpClientConfig, MetadataTokenSource};

/// AlloyDB instance resource path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceUri {
    pub project: String,
    pub region: String,
    pub cluster: String,
    pub instance: String,
}

impl core::fmt::Display for InstanceUri {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/clusters/{}/instances/{}",
            self.project, self.region, self.cluster, self.instance
        )
    }
}

/// Network endpoint to hand to the Postgres driver. TLS is required on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum DialError {
    #[error("failed to obtain access token: {0}")]
    Token(#[source] reqwest::Error),

    #[error("connection info request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("instance has no IP address")]
    NoAddress,

    #[error("dialer unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a managed-cluster instance to a reachable endpoint.
#[async_trait]
pub trait ClusterDialer: Send + Sync {
    async fn dial(&self, instance: &InstanceUri) -> Result<DialTarget, DialError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConnectionInfo {
    ip_address: String,
    public_ip_address: String,
}

impl ConnectionInfo {
    /// Private address first, public one as a fallback.
    fn address(self) -> Option<String> {
        [self.ip_address, self.public_ip_address]
            .into_iter()
            .find(|ip| !ip.is_empty())
    }
}

/// Dialer backed by the AlloyDB Admin API `connectionInfo` endpoint.
#[derive(Debug, Clone)]
pub struct AlloyDbDialer {
    http: reqwest::Client,
    tokens: MetadataTokenSource,
    endpoint: String,
    port: u16,
}

impl AlloyDbDialer {
    pub const DEFAULT_PORT: u16 = 5432;

    pub fn new(config: &GcpClientConfig) -> Result<Self, reqwest::Error> {
        let http = config.http_client()?;
        Ok(Self {
            tokens: MetadataTokenSource::new(http.clone(), config.metadata_endpoint.clone()),
            http,
            endpoint: config.alloydb_endpoint.clone(),
            port: Self::DEFAULT_PORT,
        })
    }

    fn connection_info_url(&self, instance: &InstanceUri) -> String {
        format!(
            "{}/v1/{}/connectionInfo",
            self.endpoint.trim_end_matches('/'),
            instance
        )
    }
}

#[async_trait]
impl ClusterDialer for AlloyDbDialer {
    async fn dial(&self, instance: &InstanceUri) -> Result<DialTarget, DialError> {
        let token = self.tokens.access_token().await.map_err(DialError::Token)?;

        let info: ConnectionInfo = self
            .http
            .get(self.connection_info_url(instance))
            .bearer_auth(token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(DialError::Request)?
            .json()
            .await
            .map_err(DialError::Request)?;

        let host = info.address().ok_or(DialError::NoAddress)?;
        Ok(DialTarget {
            host,
            port: self.port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> InstanceUri {
        InstanceUri {
            project: "shop-prod".to_string(),
            region: "us-central1".to_string(),
            cluster: "catalog".to_string(),
            instance: "primary".to_string(),
        }
    }

    #[test]
    fn connection_info_url_embeds_instance_path() {
        let dialer = AlloyDbDialer::new(&GcpClientConfig::default()).unwrap();
        assert_eq!(
            dialer.connection_info_url(&instance()),
            "https://alloydb.googleapis.com/v1/projects/shop-prod/locations/us-central1/clusters/catalog/instances/primary/connectionInfo"
        );
    }

    #[test]
    fn private_address_is_preferred() {
        let info: ConnectionInfo = serde_json::from_str(
            r#"{"name":"x","ipAddress":"10.0.0.7","publicIpAddress":"34.1.2.3","instanceUid":"u"}"#,
        )
        .unwrap();
        assert_eq!(info.address().as_deref(), Some("10.0.0.7"));
    }

    #[test]
    fn public_address_is_used_when_private_is_missing() {
        let info: ConnectionInfo =
            serde_json::from_str(r#"{"publicIpAddress":"34.1.2.3"}"#).unwrap();
        assert_eq!(info.address().as_deref(), Some("34.1.2.3"));

        let empty: ConnectionInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.address(), None);
    }
}
