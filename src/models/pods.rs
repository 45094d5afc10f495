//! Pod views and sidecar detection

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};

/// Owner of a pod, as recorded in its owner references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub name: String,
    pub image: String,
}

/// Parsed view of one pod
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodInfo {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub created_at: Option<String>,
    pub ip: Option<String>,
    pub created_by: Vec<Reference>,
    /// Mesh data-plane containers injected into the pod
    pub istio_containers: Vec<ContainerInfo>,
    pub istio_init_containers: Vec<ContainerInfo>,
    pub status: Option<String>,
}

/// Content of the sidecar injection status annotation
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidecarStatus {
    #[serde(default)]
    containers: Option<Vec<String>>,
    #[serde(default)]
    init_containers: Option<Vec<String>>,
}

impl PodInfo {
    /// Parse a raw pod; `sidecar_annotation` names the injection status annotation.
    pub fn parse(pod: &Pod, sidecar_annotation: &str) -> Self {
        let meta = &pod.metadata;

        let created_by = meta
            .owner_references
            .iter()
            .flatten()
            .map(|r| Reference {
                name: r.name.clone(),
                kind: r.kind.clone(),
            })
            .collect();

        let sidecar = meta
            .annotations
            .as_ref()
            .and_then(|a| a.get(sidecar_annotation))
            .and_then(|raw| serde_json::from_str::<SidecarStatus>(raw).ok())
            .unwrap_or_default();

        let spec = pod.spec.as_ref();
        let containers = spec.map(|s| s.containers.as_slice()).unwrap_or_default();
        let init_containers = spec
            .and_then(|s| s.init_containers.as_deref())
            .unwrap_or_default();

        let resolve = |names: Option<Vec<String>>,
                       declared: &[k8s_openapi::api::core::v1::Container]|
         -> Vec<ContainerInfo> {
            names
                .unwrap_or_default()
                .into_iter()
                .filter_map(|name| {
                    declared.iter().find(|c| c.name == name).map(|c| ContainerInfo {
                        name: c.name.clone(),
                        image: c.image.clone().unwrap_or_default(),
                    })
                })
                .collect()
        };

        Self {
            name: meta.name.clone().unwrap_or_default(),
            labels: meta.labels.clone().unwrap_or_default(),
            created_at: super::created_at(meta),
            ip: pod.status.as_ref().and_then(|s| s.pod_ip.clone()),
            created_by,
            istio_containers: resolve(sidecar.containers, containers),
            istio_init_containers: resolve(sidecar.init_containers, init_containers),
            status: pod.status.as_ref().and_then(|s| s.phase.clone()),
        }
    }

    pub fn has_istio_sidecar(&self) -> bool {
        !self.istio_containers.is_empty()
    }
}

/// True if at least one pod carries the mesh sidecar
pub fn any_has_istio_sidecar(pods: &[PodInfo]) -> bool {
    pods.iter().any(PodInfo::has_istio_sidecar)
}
