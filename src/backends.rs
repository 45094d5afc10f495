//! Backend query ports
//!
//! Narrow capability traits over the cluster API, the mesh configuration
//! API, the metrics backend and the access reviewer. Every call is
//! independent, side-effect free and may fail. Production implementations
//! live in [`crate::kube`] and [`crate::prometheus`]; tests substitute mocks
//! or in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Pod, Service};
use kube::core::DynamicObject;

use crate::error::Result;
use crate::models::{MeshResourceKind, WorkloadSources};

/// Cluster-state queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// List the services of a namespace, in API order
    async fn get_services(&self, namespace: &str) -> Result<Vec<Service>>;

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service>;

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Endpoints>;

    /// List pods matching a label selector string; an empty selector lists all pods
    async fn get_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>>;

    async fn get_namespace(&self, namespace: &str) -> Result<Namespace>;

    async fn get_deployments(&self, namespace: &str) -> Result<Vec<Deployment>>;

    async fn get_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>>;

    async fn get_stateful_sets(&self, namespace: &str) -> Result<Vec<StatefulSet>>;
}

/// Mesh configuration queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeshBackend: Send + Sync {
    /// Virtual services of the namespace that route to `service`
    async fn get_virtual_services(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<DynamicObject>>;

    /// Destination rules of the namespace whose host is `service`
    async fn get_destination_rules(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<Vec<DynamicObject>>;
}

/// Inbound request rate of a service for one response code
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCodeRate {
    pub code: String,
    pub rate: f64,
}

/// Telemetry queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Per-response-code inbound request rates over `interval` ending at `as_of`
    async fn get_service_request_rates(
        &self,
        namespace: &str,
        service: &str,
        interval: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ResponseCodeRate>>;

    /// Workloads that sent requests to `service` since `since`
    async fn get_source_workloads(
        &self,
        namespace: &str,
        since: DateTime<Utc>,
        service: &str,
    ) -> Result<WorkloadSources>;
}

/// Access-control queries, evaluated for the caller's identity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessBackend: Send + Sync {
    /// Whether the caller may perform `verb` on `kind` objects in `namespace`
    async fn can_i(&self, namespace: &str, kind: MeshResourceKind, verb: &str) -> Result<bool>;
}
