//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Never offer mutation of mesh configuration, whatever RBAC allows
    #[serde(default = "default_false")]
    pub read_only: bool,

    /// Namespace of the mesh control plane
    #[serde(default = "default_istio_namespace")]
    pub istio_namespace: String,

    /// Pod annotation written by sidecar injection
    #[serde(default = "default_sidecar_annotation")]
    pub istio_sidecar_annotation: String,

    /// Label names the mesh relies on
    #[serde(default)]
    pub istio_labels: IstioLabels,

    #[serde(default)]
    pub kubernetes: KubernetesConfig,

    #[serde(default)]
    pub prometheus: PrometheusConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IstioLabels {
    #[serde(default = "default_app_label")]
    pub app_label_name: String,

    #[serde(default = "default_version_label")]
    pub version_label_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConfig {
    /// DNS domain of the cluster, used to recognise service hosts
    #[serde(default = "default_cluster_domain")]
    pub cluster_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusConfig {
    /// Base URL of the Prometheus HTTP API
    #[serde(default = "default_prometheus_url")]
    pub url: String,

    /// Per-query timeout
    #[serde(default = "default_prometheus_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfig {
    /// Default rate interval for service health (Prometheus duration)
    #[serde(default = "default_rate_interval")]
    pub rate_interval: String,
}

// Default value functions
fn default_false() -> bool {
    false
}

fn default_istio_namespace() -> String {
    "istio-system".to_string()
}

fn default_sidecar_annotation() -> String {
    "sidecar.istio.io/status".to_string()
}

fn default_app_label() -> String {
    "app".to_string()
}

fn default_version_label() -> String {
    "version".to_string()
}

fn default_cluster_domain() -> String {
    "cluster.local".to_string()
}

fn default_prometheus_url() -> String {
    "http://prometheus.istio-system:9090".to_string()
}

fn default_prometheus_timeout() -> u64 {
    10
}

fn default_rate_interval() -> String {
    "10m".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_only: default_false(),
            istio_namespace: default_istio_namespace(),
            istio_sidecar_annotation: default_sidecar_annotation(),
            istio_labels: IstioLabels::default(),
            kubernetes: KubernetesConfig::default(),
            prometheus: PrometheusConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for IstioLabels {
    fn default() -> Self {
        Self {
            app_label_name: default_app_label(),
            version_label_name: default_version_label(),
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            cluster_domain: default_cluster_domain(),
        }
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: default_prometheus_url(),
            timeout_seconds: default_prometheus_timeout(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            rate_interval: default_rate_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(!config.read_only);
        assert_eq!(config.istio_namespace, "istio-system");
        assert_eq!(config.istio_labels.app_label_name, "app");
        assert_eq!(config.health.rate_interval, "10m");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("readOnly"));
        assert!(yaml.contains("istioLabels"));
        assert!(yaml.contains("appLabelName"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
readOnly: true
istioLabels:
  appLabelName: app.kubernetes.io/name
prometheus:
  url: http://localhost:9090
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.read_only);
        assert_eq!(config.istio_labels.app_label_name, "app.kubernetes.io/name");
        assert_eq!(config.istio_labels.version_label_name, "version");
        assert_eq!(config.prometheus.url, "http://localhost:9090");
        assert_eq!(config.prometheus.timeout_seconds, 10);
    }
}
