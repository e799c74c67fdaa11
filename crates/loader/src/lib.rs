//! Process wiring for the `catalog-loader` binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use productcatalog_infra::{
    CatalogCell, CatalogLoader, CatalogRefresher, CatalogSourceConfig, GcpClientConfig,
};

/// Seconds between background reloads. Unset or empty disables the refresher.
pub const ENV_REFRESH_INTERVAL: &str = "CATALOG_REFRESH_INTERVAL_SECS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RefreshIntervalError {
    #[error("invalid CATALOG_REFRESH_INTERVAL_SECS '{0}': expected a positive number of seconds")]
    Invalid(String),
}

/// Parse the refresh interval from a raw environment value.
pub fn parse_refresh_interval(raw: Option<&str>) -> Result<Option<Duration>, RefreshIntervalError> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(RefreshIntervalError::Invalid(raw.to_string())),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
    }
}

/// Load once, then keep refreshing until Ctrl-C if an interval is configured.
pub async fn run() -> anyhow::Result<()> {
    let refresh = parse_refresh_interval(std::env::var(ENV_REFRESH_INTERVAL).ok().as_deref())?;
    let config = CatalogSourceConfig::from_env().context("reading catalog source configuration")?;
    let loader = Arc::new(
        CatalogLoader::from_config(config, &GcpClientConfig::from_env())
            .context("building catalog source")?,
    );
    let cell = Arc::new(CatalogCell::new());

    let report = loader
        .load_into(&cell)
        .await
        .with_context(|| format!("loading catalog from {}", loader.source_kind()))?;
    info!(
        source = %report.source,
        products = report.products,
        "catalog loaded"
    );

    let Some(interval) = refresh else {
        return Ok(());
    };

    let refresher = CatalogRefresher::spawn(loader, cell, interval);
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");
    refresher.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_or_blank_interval_disables_refresher() {
        assert_eq!(parse_refresh_interval(None), Ok(None));
        assert_eq!(parse_refresh_interval(Some("")), Ok(None));
        assert_eq!(parse_refresh_interval(Some("  ")), Ok(None));
    }

    #[test]
    fn interval_is_whole_seconds() {
        assert_eq!(
            parse_refresh_interval(Some("300")),
            Ok(Some(Duration::from_secs(300)))
        );
    }

    #[test]
    fn zero_or_garbage_interval_is_rejected() {
        assert_eq!(
            parse_refresh_interval(Some("0")),
            Err(RefreshIntervalError::Invalid("0".to_string()))
        );
        assert!(parse_refresh_interval(Some("5m")).is_err());
        assert!(parse_refresh_interval(Some("-1")).is_err());
    }
}
