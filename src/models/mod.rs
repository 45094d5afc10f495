//! Service view models
//!
//! Request-scoped, serializable views built from raw cluster, mesh and
//! telemetry records. Every view is constructed fresh per request and is
//! never mutated after assembly.

mod endpoints;
mod health;
mod mesh;
mod pods;
mod services;
mod workloads;

pub use endpoints::{EndpointAddress, EndpointSubset, PortInfo};
pub use health::{RequestHealth, ServiceHealth};
pub use mesh::{MeshObject, MeshObjectList, MeshResourceKind, ResourcePermissions};
pub use pods::{ContainerInfo, PodInfo, Reference, any_has_istio_sidecar};
pub use services::{NamespaceRef, ServiceDetails, ServiceInfo, ServiceList, ServiceOverview};
pub use workloads::{Workload, WorkloadOverview, WorkloadRef, WorkloadSources};

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

/// Creation timestamp of an object as a UTC instant.
///
/// `Time` wraps a different timestamp type across k8s-openapi releases, so
/// this goes through its RFC 3339 wire form.
pub fn creation_time(meta: &ObjectMeta) -> Option<DateTime<Utc>> {
    meta.creation_timestamp.as_ref().and_then(time_to_utc)
}

/// Creation timestamp of an object in RFC 3339 form
pub fn created_at(meta: &ObjectMeta) -> Option<String> {
    creation_time(meta).map(|t| t.to_rfc3339())
}

fn time_to_utc(time: &Time) -> Option<DateTime<Utc>> {
    let raw = serde_json::to_value(time).ok()?;
    let text = raw.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
