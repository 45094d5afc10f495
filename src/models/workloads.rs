//! Workload views

use std::collections::BTreeMap;

use serde::Serialize;

use super::pods::{PodInfo, any_has_istio_sidecar};

/// A workload that sent traffic to a service, as reported by telemetry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadRef {
    pub namespace: String,
    pub app: String,
    pub workload: String,
    pub version: String,
}

/// Source workloads keyed by destination (`app` or `app/version`)
pub type WorkloadSources = BTreeMap<String, Vec<WorkloadRef>>;

/// A top-level controller and the pods it owns
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub name: String,
    /// Controller kind: `Deployment`, `ReplicaSet`, `StatefulSet`, ... or `Pod`
    pub workload_type: String,
    pub labels: BTreeMap<String, String>,
    pub created_at: Option<String>,
    pub resource_version: Option<String>,
    pub pods: Vec<PodInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadOverview {
    pub name: String,
    #[serde(rename = "type")]
    pub workload_type: String,
    pub created_at: Option<String>,
    pub resource_version: Option<String>,
    pub istio_sidecar: bool,
    pub app_label: bool,
    pub version_label: bool,
    pub labels: BTreeMap<String, String>,
}

impl WorkloadOverview {
    pub fn parse(workload: &Workload, app_label: &str, version_label: &str) -> Self {
        Self {
            name: workload.name.clone(),
            workload_type: workload.workload_type.clone(),
            created_at: workload.created_at.clone(),
            resource_version: workload.resource_version.clone(),
            istio_sidecar: any_has_istio_sidecar(&workload.pods),
            app_label: workload.labels.contains_key(app_label),
            version_label: workload.labels.contains_key(version_label),
            labels: workload.labels.clone(),
        }
    }
}
