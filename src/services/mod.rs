//! Aggregation services
//!
//! This module turns the per-backend queries into the two composite views
//! served to callers. Sub-fetches run concurrently in waves, required
//! results are collected all-or-nothing, and health and permissions degrade
//! softly.

pub mod aggregator;
pub mod assemble;
pub mod health;
pub mod permissions;
pub mod workloads;

pub use aggregator::ServiceAggregator;
pub use assemble::{DetailParts, build_service_details, build_service_list};
pub use health::{request_health, resolve_health};
pub use permissions::resolve_permissions;
pub use workloads::{Controllers, fetch_workloads, resolve_workloads};

use crate::config::Config;

/// Settings injected into the aggregator at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Label a selector must carry for the service to be mesh-ready
    pub app_label: String,
    pub version_label: String,
    /// Pod annotation holding the sidecar injection status
    pub sidecar_annotation: String,
    /// Never report write permissions on mesh configuration
    pub read_only: bool,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AggregatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            app_label: config.istio_labels.app_label_name.clone(),
            version_label: config.istio_labels.version_label_name.clone(),
            sidecar_annotation: config.istio_sidecar_annotation.clone(),
            read_only: config.read_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.istio_labels.app_label_name = "app.kubernetes.io/name".to_string();
        config.read_only = true;

        let settings = AggregatorSettings::from(&config);
        assert_eq!(settings.app_label, "app.kubernetes.io/name");
        assert_eq!(settings.version_label, "version");
        assert_eq!(settings.sidecar_annotation, "sidecar.istio.io/status");
        assert!(settings.read_only);
    }
}
