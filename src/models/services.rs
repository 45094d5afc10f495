//! Service list and service detail views

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Service;
use serde::Serialize;

use super::endpoints::{EndpointSubset, PortInfo};
use super::health::ServiceHealth;
use super::mesh::MeshObjectList;
use super::pods::PodInfo;
use super::workloads::{WorkloadOverview, WorkloadSources};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceRef {
    pub name: String,
}

/// One row of a namespace's service list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverview {
    pub name: String,
    pub istio_sidecar: bool,
    /// Whether the selector carries the app label the mesh requires
    pub app_label: bool,
}

/// Services of a namespace, in the order the cluster returned them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceList {
    pub namespace: NamespaceRef,
    pub services: Vec<ServiceOverview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub namespace: String,
    pub created_at: Option<String>,
    pub resource_version: Option<String>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub ip: Option<String>,
    pub ports: Vec<PortInfo>,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
}

impl ServiceInfo {
    pub fn parse(service: &Service) -> Self {
        let meta = &service.metadata;
        let spec = service.spec.as_ref();

        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .into_iter()
            .flatten()
            .map(|p| PortInfo {
                name: p.name.clone().unwrap_or_default(),
                protocol: p.protocol.clone().unwrap_or_default(),
                port: p.port,
            })
            .collect();

        Self {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            created_at: super::created_at(meta),
            resource_version: meta.resource_version.clone(),
            service_type: spec
                .and_then(|s| s.type_.clone())
                .unwrap_or_else(|| "ClusterIP".to_string()),
            ip: spec.and_then(|s| s.cluster_ip.clone()),
            ports,
            labels: meta.labels.clone().unwrap_or_default(),
            selector: spec.and_then(|s| s.selector.clone()).unwrap_or_default(),
        }
    }
}

/// Composite view of one service.
///
/// Only ever built from a fully successful aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub service: ServiceInfo,
    /// Pods selected by the service that back one of its endpoints
    pub pods: Vec<PodInfo>,
    /// Endpoint subsets restricted to addresses of selected pods
    pub endpoints: Vec<EndpointSubset>,
    pub virtual_services: MeshObjectList,
    pub destination_rules: MeshObjectList,
    pub health: ServiceHealth,
    pub workloads: Vec<WorkloadOverview>,
    /// Workloads sending traffic to this service, keyed by destination
    pub dependencies: WorkloadSources,
}
