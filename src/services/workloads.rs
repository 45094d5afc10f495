//! Workloads behind a service's selector
//!
//! Pods are grouped under their top-level controller by walking owner
//! references: a ReplicaSet owned by a Deployment resolves to the Deployment,
//! and a pod without a controller is its own `Pod` workload.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use tracing::debug;

use crate::backends::ClusterBackend;
use crate::error::Result;
use crate::models::{PodInfo, Workload, created_at};
use crate::selector::{pods_for_selector, selector_string};

/// Fetch pods and controllers concurrently, then group the selected pods by workload.
pub async fn fetch_workloads(
    cluster: &dyn ClusterBackend,
    namespace: &str,
    selector: &BTreeMap<String, String>,
    sidecar_annotation: &str,
) -> Result<Vec<Workload>> {
    let selector_str = selector_string(selector);
    let (pods, deployments, replica_sets, stateful_sets) = futures::try_join!(
        cluster.get_pods(namespace, &selector_str),
        cluster.get_deployments(namespace),
        cluster.get_replica_sets(namespace),
        cluster.get_stateful_sets(namespace),
    )?;

    let selected = pods_for_selector(selector, &pods);
    let controllers = Controllers {
        deployments: &deployments,
        replica_sets: &replica_sets,
        stateful_sets: &stateful_sets,
    };
    let workloads = resolve_workloads(&selected, &controllers, sidecar_annotation);
    debug!(
        namespace,
        pods = selected.len(),
        workloads = workloads.len(),
        "resolved workloads"
    );
    Ok(workloads)
}

/// Controllers of one namespace, used to resolve pod owners
pub struct Controllers<'a> {
    pub deployments: &'a [Deployment],
    pub replica_sets: &'a [ReplicaSet],
    pub stateful_sets: &'a [StatefulSet],
}

impl Controllers<'_> {
    fn replica_set(&self, name: &str) -> Option<&ReplicaSet> {
        self.replica_sets
            .iter()
            .find(|rs| rs.metadata.name.as_deref() == Some(name))
    }

    /// Metadata and pod template labels of a controller, when it is known
    fn lookup(
        &self,
        kind: &str,
        name: &str,
    ) -> Option<(&ObjectMeta, Option<&BTreeMap<String, String>>)> {
        let named = |meta: &ObjectMeta| meta.name.as_deref() == Some(name);
        match kind {
            "Deployment" => self.deployments.iter().find(|d| named(&d.metadata)).map(|d| {
                let labels = d
                    .spec
                    .as_ref()
                    .and_then(|s| s.template.metadata.as_ref())
                    .and_then(|m| m.labels.as_ref());
                (&d.metadata, labels)
            }),
            "ReplicaSet" => self.replica_set(name).map(|rs| {
                let labels = rs
                    .spec
                    .as_ref()
                    .and_then(|s| s.template.as_ref())
                    .and_then(|t| t.metadata.as_ref())
                    .and_then(|m| m.labels.as_ref());
                (&rs.metadata, labels)
            }),
            "StatefulSet" => self
                .stateful_sets
                .iter()
                .find(|s| named(&s.metadata))
                .map(|s| {
                    let labels = s
                        .spec
                        .as_ref()
                        .and_then(|s| s.template.metadata.as_ref())
                        .and_then(|m| m.labels.as_ref());
                    (&s.metadata, labels)
                }),
            _ => None,
        }
    }
}

/// The managing owner reference, falling back to the first owner
fn controller_of(meta: &ObjectMeta) -> Option<&OwnerReference> {
    let owners = meta.owner_references.as_deref()?;
    owners
        .iter()
        .find(|o| o.controller == Some(true))
        .or_else(|| owners.first())
}

/// `(kind, name)` of the top-level controller of a pod
fn top_level_owner(pod: &Pod, controllers: &Controllers<'_>) -> (String, String) {
    let Some(owner) = controller_of(&pod.metadata) else {
        return (
            "Pod".to_string(),
            pod.metadata.name.clone().unwrap_or_default(),
        );
    };

    if owner.kind == "ReplicaSet" {
        let deployment = controllers
            .replica_set(&owner.name)
            .and_then(|rs| controller_of(&rs.metadata))
            .filter(|o| o.kind == "Deployment");
        if let Some(deployment) = deployment {
            return (deployment.kind.clone(), deployment.name.clone());
        }
    }

    (owner.kind.clone(), owner.name.clone())
}

/// Group pods by top-level controller, in order of first appearance.
pub fn resolve_workloads(
    pods: &[&Pod],
    controllers: &Controllers<'_>,
    sidecar_annotation: &str,
) -> Vec<Workload> {
    let mut workloads: Vec<Workload> = Vec::new();

    for pod in pods {
        let info = PodInfo::parse(pod, sidecar_annotation);
        let (kind, name) = top_level_owner(pod, controllers);

        if let Some(existing) = workloads
            .iter_mut()
            .find(|w| w.workload_type == kind && w.name == name)
        {
            existing.pods.push(info);
            continue;
        }

        let (meta, template_labels) = match controllers.lookup(&kind, &name) {
            Some((meta, labels)) => (meta, labels),
            None if kind == "Pod" => (&pod.metadata, None),
            None => {
                // Controller kinds without a listing (DaemonSet, Job, ...)
                workloads.push(Workload {
                    labels: info.labels.clone(),
                    name,
                    workload_type: kind,
                    created_at: None,
                    resource_version: None,
                    pods: vec![info],
                });
                continue;
            }
        };

        workloads.push(Workload {
            labels: template_labels
                .cloned()
                .unwrap_or_else(|| info.labels.clone()),
            name,
            workload_type: kind,
            created_at: created_at(meta),
            resource_version: meta.resource_version.clone(),
            pods: vec![info],
        });
    }

    workloads
}
