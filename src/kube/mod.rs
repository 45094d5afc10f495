//! Kubernetes client module
//!
//! Builds the client used by the cluster, mesh and access backends, and
//! implements those backends on top of kube-rs.

mod access;
mod cluster;
mod mesh;

pub use access::KubeAccessReviewer;
pub use cluster::KubeClusterClient;
pub use mesh::{KubeMeshClient, destination_rule_targets, host_targets_service, virtual_service_targets};

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

/// Initialize and return a Kubernetes client
///
/// Without an explicit context the default loading strategy applies:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(name) => Config::from_kubeconfig(&KubeConfigOptions {
            context: Some(name.to_string()),
            ..Default::default()
        })
        .await
        .with_context(|| format!("Failed to load kubeconfig context '{}'", name))?,
        None => Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    tracing::debug!(cluster_url = %config.cluster_url, "Creating Kubernetes client");
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Name of the kubeconfig context in use, if a kubeconfig is present
pub fn current_context(explicit: Option<&str>) -> Option<String> {
    if let Some(name) = explicit {
        return Some(name.to_string());
    }
    Kubeconfig::read().ok().and_then(|k| k.current_context)
}
