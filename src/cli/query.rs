//! Service list and service details commands

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::kube::{KubeAccessReviewer, KubeClusterClient, KubeMeshClient, create_client};
use crate::prometheus::PrometheusClient;
use crate::services::{AggregatorSettings, ServiceAggregator};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Serialize a view for printing
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(value).context("Failed to serialize output")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to serialize output"),
    }
}

/// Wire the Kubernetes and Prometheus backends into an aggregator
pub async fn build_aggregator(config: &Config, context: Option<&str>) -> Result<ServiceAggregator> {
    let client = create_client(context).await?;
    let prometheus = PrometheusClient::new(
        &config.prometheus.url,
        Duration::from_secs(config.prometheus.timeout_seconds),
        config.istio_namespace.clone(),
    )
    .with_context(|| format!("Invalid prometheus.url '{}'", config.prometheus.url))?;

    Ok(ServiceAggregator::new(
        Arc::new(KubeClusterClient::new(client.clone())),
        Arc::new(KubeMeshClient::new(
            client.clone(),
            config.kubernetes.cluster_domain.clone(),
        )),
        Arc::new(prometheus),
        Arc::new(KubeAccessReviewer::new(client)),
        AggregatorSettings::from(config),
    ))
}

pub async fn run_services(
    aggregator: &ServiceAggregator,
    namespace: &str,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let list = aggregator
        .get_service_list_cancellable(namespace, cancel)
        .await
        .with_context(|| format!("Failed to list services in namespace {}", namespace))?;
    print!("{}", render(&list, format)?);
    Ok(())
}

pub async fn run_service(
    aggregator: &ServiceAggregator,
    namespace: &str,
    service: &str,
    interval: &str,
    format: OutputFormat,
    cancel: CancellationToken,
) -> Result<()> {
    let details = aggregator
        .get_service_details_cancellable(namespace, service, interval, Utc::now(), cancel)
        .await
        .with_context(|| format!("Failed to get details of service {}/{}", namespace, service))?;
    print!("{}", render(&details, format)?);
    Ok(())
}
