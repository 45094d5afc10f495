//! Configuration system for meshscope
//!
//! Layered configuration (defaults, root file, per-context file, environment)
//! for the CLI. The aggregation core never reads it directly: the values it
//! needs are copied into [`crate::services::AggregatorSettings`].

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, HealthConfig, IstioLabels, KubernetesConfig, PrometheusConfig};

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "readOnly" => Ok(config.read_only.to_string()),
        "istioNamespace" => Ok(config.istio_namespace.clone()),
        "istioSidecarAnnotation" => Ok(config.istio_sidecar_annotation.clone()),
        "istioLabels.appLabelName" => Ok(config.istio_labels.app_label_name.clone()),
        "istioLabels.versionLabelName" => Ok(config.istio_labels.version_label_name.clone()),
        "kubernetes.clusterDomain" => Ok(config.kubernetes.cluster_domain.clone()),
        "prometheus.url" => Ok(config.prometheus.url.clone()),
        "prometheus.timeoutSeconds" => Ok(config.prometheus.timeout_seconds.to_string()),
        "health.rateInterval" => Ok(config.health.rate_interval.clone()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "readOnly" => {
            config.read_only = value
                .parse()
                .context("readOnly must be 'true' or 'false'")?;
        }
        "istioNamespace" => {
            config.istio_namespace = value.to_string();
        }
        "istioSidecarAnnotation" => {
            config.istio_sidecar_annotation = value.to_string();
        }
        "istioLabels.appLabelName" => {
            config.istio_labels.app_label_name = value.to_string();
        }
        "istioLabels.versionLabelName" => {
            config.istio_labels.version_label_name = value.to_string();
        }
        "kubernetes.clusterDomain" => {
            config.kubernetes.cluster_domain = value.to_string();
        }
        "prometheus.url" => {
            url::Url::parse(value).context("prometheus.url must be an absolute URL")?;
            config.prometheus.url = value.to_string();
        }
        "prometheus.timeoutSeconds" => {
            config.prometheus.timeout_seconds = value
                .parse()
                .context("prometheus.timeoutSeconds must be a number")?;
        }
        "health.rateInterval" => {
            config.health.rate_interval = value.to_string();
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}
