//! Label-selector matching between services, pods and endpoints
//!
//! Pods and endpoints are fetched independently and arrive in no particular
//! order, so association is always by labels or addresses. A service with an
//! empty selector selects nothing.

use std::collections::{BTreeMap, HashSet};

use k8s_openapi::api::core::v1::Pod;
use kube::core::{Selector, SelectorExt};

use crate::models::{EndpointSubset, PodInfo};

/// Equality selector for a service's selector map, `None` when it is empty
pub fn service_selector(selector: &BTreeMap<String, String>) -> Option<Selector> {
    if selector.is_empty() {
        return None;
    }
    Some(Selector::from_iter(selector.clone()))
}

/// Selector in the API server's label-selector syntax (`k1=v1,k2=v2`)
pub fn selector_string(selector: &BTreeMap<String, String>) -> String {
    service_selector(selector)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// True iff every selector pair is present in `labels`; false for an empty selector
pub fn selector_matches(
    selector: &BTreeMap<String, String>,
    labels: Option<&BTreeMap<String, String>>,
) -> bool {
    let Some(selector) = service_selector(selector) else {
        return false;
    };
    match labels {
        Some(labels) => selector.matches(labels),
        None => false,
    }
}

/// Pods whose labels contain every pair of the selector, in fetch order
pub fn pods_for_selector<'p>(
    selector: &BTreeMap<String, String>,
    pods: &'p [Pod],
) -> Vec<&'p Pod> {
    pods.iter()
        .filter(|pod| selector_matches(selector, pod.metadata.labels.as_ref()))
        .collect()
}

/// Pods whose IP backs one of the endpoint addresses, in pod order
pub fn pods_for_endpoints(endpoints: &[EndpointSubset], pods: &[PodInfo]) -> Vec<PodInfo> {
    let ips: HashSet<&str> = endpoints.iter().flat_map(EndpointSubset::ips).collect();
    pods.iter()
        .filter(|pod| pod.ip.as_deref().is_some_and(|ip| ips.contains(ip)))
        .cloned()
        .collect()
}

/// Endpoint subsets restricted to addresses of the given pods.
///
/// Subsets left without addresses are dropped.
pub fn endpoints_for_pods(endpoints: &[EndpointSubset], pods: &[PodInfo]) -> Vec<EndpointSubset> {
    let ips: HashSet<&str> = pods.iter().filter_map(|p| p.ip.as_deref()).collect();
    endpoints
        .iter()
        .filter_map(|subset| {
            let addresses: Vec<_> = subset
                .addresses
                .iter()
                .filter(|a| ips.contains(a.ip.as_str()))
                .cloned()
                .collect();
            (!addresses.is_empty()).then(|| EndpointSubset {
                addresses,
                ports: subset.ports.clone(),
            })
        })
        .collect()
}
