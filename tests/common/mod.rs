//! In-memory backends and object builders shared by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Pod, Service};
use kube::api::DynamicObject;
use serde_json::{Value, json};

use meshscope::models::{MeshResourceKind, WorkloadRef, WorkloadSources};
use meshscope::{
    AccessBackend, AggregatorSettings, ClusterBackend, Error, MeshBackend, MetricsBackend,
    ResponseCodeRate, Result, ServiceAggregator,
};

pub const SIDECAR_ANNOTATION: &str = "sidecar.istio.io/status";

/// Records calls and tracks how many backend calls overlap
#[derive(Clone, Default)]
pub struct Probe {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    async fn track(&self, call: String, delay: Option<Duration>) {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

fn unavailable(call: &str) -> Error {
    Error::Prometheus {
        error_type: "unavailable".to_string(),
        message: format!("{} failed", call),
    }
}

/// Label-set containment against a `k=v,k2=v2` selector; empty selects all
fn matches_selector(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
    selector
        .split(',')
        .filter(|pair| !pair.is_empty())
        .all(|pair| match pair.split_once('=') {
            Some((k, v)) => labels.and_then(|l| l.get(k)).is_some_and(|lv| lv == v),
            None => false,
        })
}

#[derive(Clone, Default)]
pub struct FakeCluster {
    pub services: Vec<Service>,
    pub pods: Vec<Pod>,
    pub endpoints: Vec<Endpoints>,
    pub namespace: Namespace,
    pub deployments: Vec<Deployment>,
    pub replica_sets: Vec<ReplicaSet>,
    pub stateful_sets: Vec<StatefulSet>,
    /// Method names that fail
    pub failing: HashSet<&'static str>,
    pub delay: Option<Duration>,
    pub probe: Probe,
}

impl FakeCluster {
    async fn enter(&self, method: &'static str, args: String) -> Result<()> {
        self.probe
            .track(format!("{} {}", method, args), self.delay)
            .await;
        if self.failing.contains(method) {
            return Err(unavailable(method));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterBackend for FakeCluster {
    async fn get_services(&self, namespace: &str) -> Result<Vec<Service>> {
        self.enter("get_services", namespace.to_string()).await?;
        Ok(self.services.clone())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service> {
        self.enter("get_service", format!("{}/{}", namespace, name))
            .await?;
        self.services
            .iter()
            .find(|s| s.metadata.name.as_deref() == Some(name))
            .cloned()
            .ok_or_else(|| unavailable("get_service (not found)"))
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Endpoints> {
        self.enter("get_endpoints", format!("{}/{}", namespace, name))
            .await?;
        Ok(self
            .endpoints
            .iter()
            .find(|e| e.metadata.name.as_deref() == Some(name))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
        self.enter("get_pods", format!("{} [{}]", namespace, selector))
            .await?;
        Ok(self
            .pods
            .iter()
            .filter(|p| matches_selector(selector, p.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn get_namespace(&self, namespace: &str) -> Result<Namespace> {
        self.enter("get_namespace", namespace.to_string()).await?;
        Ok(self.namespace.clone())
    }

    async fn get_deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        self.enter("get_deployments", namespace.to_string()).await?;
        Ok(self.deployments.clone())
    }

    async fn get_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>> {
        self.enter("get_replica_sets", namespace.to_string()).await?;
        Ok(self.replica_sets.clone())
    }

    async fn get_stateful_sets(&self, namespace: &str) -> Result<Vec<StatefulSet>> {
        self.enter("get_stateful_sets", namespace.to_string())
            .await?;
        Ok(self.stateful_sets.clone())
    }
}

/// Mesh objects keyed by the service they target
#[derive(Clone, Default)]
pub struct FakeMesh {
    pub virtual_services: BTreeMap<String, Vec<DynamicObject>>,
    pub destination_rules: BTreeMap<String, Vec<DynamicObject>>,
    pub failing: HashSet<&'static str>,
    pub delay: Option<Duration>,
    pub probe: Probe,
}

#[async_trait]
impl MeshBackend for FakeMesh {
    async fn get_virtual_services(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<DynamicObject>> {
        self.probe
            .track(
                format!("get_virtual_services {}/{}", namespace, service),
                self.delay,
            )
            .await;
        if self.failing.contains("get_virtual_services") {
            return Err(unavailable("get_virtual_services"));
        }
        Ok(self
            .virtual_services
            .get(service)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_destination_rules(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<DynamicObject>> {
        self.probe
            .track(
                format!("get_destination_rules {}/{}", namespace, service),
                self.delay,
            )
            .await;
        if self.failing.contains("get_destination_rules") {
            return Err(unavailable("get_destination_rules"));
        }
        Ok(self
            .destination_rules
            .get(service)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub struct FakeMetrics {
    /// Per-service response code rates
    pub rates: BTreeMap<String, Vec<ResponseCodeRate>>,
    pub sources: BTreeMap<String, WorkloadSources>,
    pub failing: HashSet<&'static str>,
    pub delay: Option<Duration>,
    pub probe: Probe,
    /// `since` passed to the last source workloads query
    pub last_since: Arc<Mutex<Option<DateTime<Utc>>>>,
}

#[async_trait]
impl MetricsBackend for FakeMetrics {
    async fn get_service_request_rates(
        &self,
        namespace: &str,
        service: &str,
        interval: &str,
        _as_of: DateTime<Utc>,
    ) -> Result<Vec<ResponseCodeRate>> {
        self.probe
            .track(
                format!("get_service_request_rates {}/{} {}", namespace, service, interval),
                self.delay,
            )
            .await;
        if self.failing.contains("get_service_request_rates") {
            return Err(unavailable("get_service_request_rates"));
        }
        Ok(self.rates.get(service).cloned().unwrap_or_default())
    }

    async fn get_source_workloads(
        &self,
        namespace: &str,
        since: DateTime<Utc>,
        service: &str,
    ) -> Result<WorkloadSources> {
        self.probe
            .track(
                format!("get_source_workloads {}/{}", namespace, service),
                self.delay,
            )
            .await;
        *self.last_since.lock().unwrap() = Some(since);
        if self.failing.contains("get_source_workloads") {
            return Err(unavailable("get_source_workloads"));
        }
        Ok(self.sources.get(service).cloned().unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub struct FakeAccess {
    /// Verbs allowed on every mesh resource kind
    pub allowed: HashSet<&'static str>,
    pub failing: bool,
    pub probe: Probe,
}

impl FakeAccess {
    pub fn allow_all() -> Self {
        Self {
            allowed: HashSet::from(["update", "delete"]),
            ..Self::default()
        }
    }
}

#[async_trait]
impl AccessBackend for FakeAccess {
    async fn can_i(&self, namespace: &str, kind: MeshResourceKind, verb: &str) -> Result<bool> {
        self.probe
            .track(format!("can_i {} {} {}", namespace, kind.kind(), verb), None)
            .await;
        if self.failing {
            return Err(unavailable("can_i"));
        }
        Ok(self.allowed.contains(verb))
    }
}

pub fn aggregator(
    cluster: FakeCluster,
    mesh: FakeMesh,
    metrics: FakeMetrics,
    access: FakeAccess,
) -> ServiceAggregator {
    aggregator_with(cluster, mesh, metrics, access, AggregatorSettings::default())
}

pub fn aggregator_with(
    cluster: FakeCluster,
    mesh: FakeMesh,
    metrics: FakeMetrics,
    access: FakeAccess,
    settings: AggregatorSettings,
) -> ServiceAggregator {
    ServiceAggregator::new(
        Arc::new(cluster),
        Arc::new(mesh),
        Arc::new(metrics),
        Arc::new(access),
        settings,
    )
}

// Object builders

pub fn service(name: &str, selector: Value) -> Service {
    serde_json::from_value(json!({
        "metadata": {
            "name": name,
            "namespace": "ns1",
            "resourceVersion": "100",
            "creationTimestamp": "2024-03-01T10:00:00Z"
        },
        "spec": {
            "clusterIP": "10.96.0.1",
            "selector": selector,
            "ports": [{"name": "http", "port": 9080, "protocol": "TCP"}]
        }
    }))
    .unwrap()
}

fn pod_value(name: &str, labels: Value, ip: &str, sidecar: bool) -> Value {
    let annotations = if sidecar {
        json!({SIDECAR_ANNOTATION: "{\"containers\":[\"istio-proxy\"],\"initContainers\":[\"istio-init\"]}"})
    } else {
        json!({})
    };
    let containers = if sidecar {
        json!([{"name": "app", "image": "app:1"}, {"name": "istio-proxy", "image": "proxyv2:1.20"}])
    } else {
        json!([{"name": "app", "image": "app:1"}])
    };
    json!({
        "metadata": {"name": name, "namespace": "ns1", "labels": labels, "annotations": annotations},
        "spec": {"containers": containers, "initContainers": [{"name": "istio-init", "image": "proxyv2:1.20"}]},
        "status": {"podIP": ip, "phase": "Running"}
    })
}

pub fn pod(name: &str, labels: Value, ip: &str, sidecar: bool) -> Pod {
    serde_json::from_value(pod_value(name, labels, ip, sidecar)).unwrap()
}

/// A pod controlled by `owner` (`(kind, name)`)
pub fn owned_pod(name: &str, labels: Value, ip: &str, owner: (&str, &str)) -> Pod {
    let mut value = pod_value(name, labels, ip, true);
    value["metadata"]["ownerReferences"] = owner_refs(owner.0, owner.1);
    serde_json::from_value(value).unwrap()
}

fn owner_refs(kind: &str, name: &str) -> Value {
    json!([{
        "apiVersion": "apps/v1",
        "kind": kind,
        "name": name,
        "uid": format!("uid-{}", name),
        "controller": true
    }])
}

pub fn deployment(name: &str, template_labels: Value) -> Deployment {
    serde_json::from_value(json!({
        "metadata": {"name": name, "namespace": "ns1", "resourceVersion": "55"},
        "spec": {
            "selector": {"matchLabels": template_labels.clone()},
            "template": {"metadata": {"labels": template_labels}}
        }
    }))
    .unwrap()
}

pub fn replica_set(name: &str, deployment: &str) -> ReplicaSet {
    serde_json::from_value(json!({
        "metadata": {"name": name, "namespace": "ns1", "ownerReferences": owner_refs("Deployment", deployment)},
        "spec": {"selector": {"matchLabels": {}}}
    }))
    .unwrap()
}

pub fn endpoints(name: &str, ips: &[&str]) -> Endpoints {
    let addresses: Vec<Value> = ips.iter().map(|ip| json!({"ip": ip})).collect();
    serde_json::from_value(json!({
        "metadata": {"name": name, "namespace": "ns1"},
        "subsets": [{
            "addresses": addresses,
            "ports": [{"name": "http", "port": 9080, "protocol": "TCP"}]
        }]
    }))
    .unwrap()
}

pub fn namespace(name: &str, created: &str) -> Namespace {
    serde_json::from_value(json!({
        "metadata": {"name": name, "creationTimestamp": created}
    }))
    .unwrap()
}

pub fn virtual_service(name: &str, host: &str) -> DynamicObject {
    serde_json::from_value(json!({
        "apiVersion": "networking.istio.io/v1beta1",
        "kind": "VirtualService",
        "metadata": {"name": name, "namespace": "ns1", "resourceVersion": "9"},
        "spec": {"hosts": [host], "http": [{"route": [{"destination": {"host": host}}]}]}
    }))
    .unwrap()
}

pub fn destination_rule(name: &str, host: &str) -> DynamicObject {
    serde_json::from_value(json!({
        "apiVersion": "networking.istio.io/v1beta1",
        "kind": "DestinationRule",
        "metadata": {"name": name, "namespace": "ns1"},
        "spec": {"host": host}
    }))
    .unwrap()
}

pub fn workload_ref(workload: &str) -> WorkloadRef {
    WorkloadRef {
        namespace: "ns1".to_string(),
        app: workload.split('-').next().unwrap_or_default().to_string(),
        workload: workload.to_string(),
        version: "v1".to_string(),
    }
}
