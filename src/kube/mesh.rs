//! Mesh-configuration backend over the Istio networking API
//!
//! Istio objects are read as `DynamicObject`s and filtered client-side to
//! those that target the requested service host.

use async_trait::async_trait;
use kube::api::{ApiResource, ListParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::{Api, Client};
use serde_json::Value;

use crate::backends::MeshBackend;
use crate::error::Result;
use crate::models::MeshResourceKind;

/// [`MeshBackend`] backed by a kube-rs client
#[derive(Clone)]
pub struct KubeMeshClient {
    client: Client,
    cluster_domain: String,
}

impl KubeMeshClient {
    pub fn new(client: Client, cluster_domain: impl Into<String>) -> Self {
        Self {
            client,
            cluster_domain: cluster_domain.into(),
        }
    }

    async fn list(&self, namespace: &str, kind: MeshResourceKind) -> Result<Vec<DynamicObject>> {
        let gvk = GroupVersionKind::gvk(MeshResourceKind::GROUP, MeshResourceKind::VERSION, kind.kind());
        let resource = ApiResource::from_gvk_with_plural(&gvk, kind.plural());
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &resource);
        Ok(api.list(&ListParams::default()).await?.items)
    }
}

#[async_trait]
impl MeshBackend for KubeMeshClient {
    async fn get_virtual_services(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<DynamicObject>> {
        let objects = self.list(namespace, MeshResourceKind::VirtualServices).await?;
        Ok(objects
            .into_iter()
            .filter(|vs| {
                virtual_service_targets(spec_of(vs), namespace, service, &self.cluster_domain)
            })
            .collect())
    }

    async fn get_destination_rules(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<DynamicObject>> {
        let objects = self.list(namespace, MeshResourceKind::DestinationRules).await?;
        Ok(objects
            .into_iter()
            .filter(|dr| {
                destination_rule_targets(spec_of(dr), namespace, service, &self.cluster_domain)
            })
            .collect())
    }
}

static NO_SPEC: Value = Value::Null;

fn spec_of(obj: &DynamicObject) -> &Value {
    obj.data.get("spec").unwrap_or(&NO_SPEC)
}

/// True if `host` names `service` in `namespace` in any of its DNS forms
pub fn host_targets_service(host: &str, namespace: &str, service: &str, cluster_domain: &str) -> bool {
    let Some(rest) = host.strip_prefix(service) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    let qualified = format!(".{}", namespace);
    match rest.strip_prefix(qualified.as_str()) {
        Some("") | Some(".svc") => true,
        Some(tail) => tail
            .strip_prefix(".svc.")
            .is_some_and(|domain| domain == cluster_domain),
        None => false,
    }
}

/// A virtual service targets a service through `spec.hosts` or any route destination
pub fn virtual_service_targets(spec: &Value, namespace: &str, service: &str, cluster_domain: &str) -> bool {
    let matches = |host: &Value| {
        host.as_str()
            .is_some_and(|h| host_targets_service(h, namespace, service, cluster_domain))
    };

    let in_hosts = spec
        .get("hosts")
        .and_then(Value::as_array)
        .is_some_and(|hosts| hosts.iter().any(matches));
    if in_hosts {
        return true;
    }

    ["http", "tcp", "tls"].iter().any(|protocol| {
        spec.get(*protocol)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|rule| rule.get("route").and_then(Value::as_array))
            .flatten()
            .filter_map(|route| route.get("destination").and_then(|d| d.get("host")))
            .any(matches)
    })
}

/// A destination rule targets a service through `spec.host`
pub fn destination_rule_targets(spec: &Value, namespace: &str, service: &str, cluster_domain: &str) -> bool {
    spec.get("host")
        .and_then(Value::as_str)
        .is_some_and(|h| host_targets_service(h, namespace, service, cluster_domain))
}
