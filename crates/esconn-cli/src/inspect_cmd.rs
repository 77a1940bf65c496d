//! Commands that describe the connector without contacting the node.

use anyhow::{Context, Result};

use esconn_core::{Connector, ElasticsearchConnector, EventBus, SearchTarget};

use crate::config::EsconnConfig;

/// Execute `esconn capabilities`.
pub fn run_capabilities(config: &EsconnConfig) {
    let connector = ElasticsearchConnector::with_config(config.adapter.clone(), EventBus::new());
    for tag in connector.capabilities() {
        println!("{tag}");
    }
}

/// Execute `esconn config`: print the resolved configuration.
pub fn run_config(config: &EsconnConfig) {
    let adapter = &config.adapter;
    println!("host:            {}", adapter.host);
    println!("port:            {}", adapter.port);
    println!("log:             {}", adapter.log_level);
    println!("index:           {}", adapter.index_name);
    if adapter.document_type.is_empty() {
        println!("type:            (none)");
    } else {
        println!("type:            {}", adapter.document_type);
    }
    println!(
        "request timeout: {}ms",
        adapter.request_timeout.as_millis()
    );
    println!("url:             {}", adapter.connection_params().base_url());
}

/// Resolve where requests for `model` would be addressed.
pub fn search_target(config: &EsconnConfig, model: Option<&str>) -> SearchTarget {
    ElasticsearchConnector::with_config(config.adapter.clone(), EventBus::new()).build_search(model)
}

/// Execute `esconn target [MODEL]`: print the search target as JSON.
pub fn run_target(config: &EsconnConfig, model: Option<&str>) -> Result<()> {
    let target = search_target(config, model);
    let json = serde_json::to_string_pretty(&target).context("failed to serialize target")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliOverrides, ConfigFile, ElasticsearchSection};

    fn config_with_type(doc_type: &str) -> EsconnConfig {
        let _lock = crate::test_util::lock_env();
        unsafe { std::env::remove_var("ESCONN_TYPE") };
        unsafe { std::env::remove_var("ESCONN_INDEX") };
        let file = ConfigFile {
            elasticsearch: ElasticsearchSection {
                doc_type: Some(doc_type.into()),
                ..Default::default()
            },
        };
        let cli = CliOverrides {
            index: Some("catalog".into()),
            ..Default::default()
        };
        EsconnConfig::resolve_with(&cli, Some(&file)).unwrap()
    }

    #[test]
    fn target_uses_model_name() {
        let target = search_target(&config_with_type("demo"), Some("Product"));
        assert_eq!(target.index, "catalog");
        assert_eq!(target.doc_type, "Product");
    }

    #[test]
    fn target_falls_back_to_configured_type() {
        let target = search_target(&config_with_type("demo"), None);
        assert_eq!(target.doc_type, "demo");
    }
}
