use anyhow::{Context, Result};
use tracing::info;

use esconn_core::{ConnectorRegistry, DataSource, ElasticsearchConnector, EventBus};

use crate::config::EsconnConfig;

/// Execute `esconn ping`: connect lazily and probe the node.
pub async fn run_ping(config: &EsconnConfig) -> Result<()> {
    let registry = ConnectorRegistry::with_builtin();
    let source = DataSource::new(
        &registry,
        ElasticsearchConnector::NAME,
        config.settings.clone(),
    )
    .context("failed to build data source")?;

    let target = format!("{}:{}", config.adapter.host, config.adapter.port);
    info!(%target, index = %config.adapter.index_name, "pinging node");
    let result = source.ping().await;
    source.disconnect();

    result.with_context(|| format!("ping {target} failed"))?;
    println!("{target} is alive");
    Ok(())
}

/// Execute `esconn info`: print the node and cluster identity.
pub async fn run_info(config: &EsconnConfig) -> Result<()> {
    let connector = ElasticsearchConnector::with_config(config.adapter.clone(), EventBus::new());
    let handle = connector.handle().await?;
    info!(url = %handle.base_url(), handle_id = %handle.id(), "fetching node info");
    let info = handle.info().await;
    connector.manager().disconnect();

    let info = info.with_context(|| format!("failed to fetch info from {}", handle.base_url()))?;
    println!("Node:    {}", info.name);
    println!("Cluster: {}", info.cluster_name);
    if let Some(uuid) = &info.cluster_uuid {
        println!("UUID:    {uuid}");
    }
    println!("Version: {}", info.version.number);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliOverrides;

    fn config_for(host: String, port: u16) -> EsconnConfig {
        let _lock = crate::test_util::lock_env();
        let cli = CliOverrides {
            host: Some(host),
            port: Some(port),
            index: None,
        };
        EsconnConfig::resolve_with(&cli, None).unwrap()
    }

    #[tokio::test]
    async fn ping_succeeds_against_mock_cluster() {
        let cluster = esconn_test_utils::spawn_mock_cluster().await;
        let config = config_for(cluster.host(), cluster.port());

        run_ping(&config).await.unwrap();
        assert_eq!(cluster.hits(), 1);
    }

    #[tokio::test]
    async fn ping_reports_failure_with_target() {
        let cluster = esconn_test_utils::spawn_mock_cluster().await;
        cluster.respond_with(503);
        let config = config_for(cluster.host(), cluster.port());

        let msg = format!("{:#}", run_ping(&config).await.unwrap_err());
        assert!(msg.contains("ping"), "unexpected error: {msg}");
        assert!(msg.contains("503"), "unexpected error: {msg}");
    }

    #[tokio::test]
    async fn info_reads_mock_cluster() {
        let cluster = esconn_test_utils::spawn_mock_cluster().await;
        let config = config_for(cluster.host(), cluster.port());

        run_info(&config).await.unwrap();
        assert_eq!(cluster.hits(), 1);
    }
}
