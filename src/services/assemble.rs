//! Composite views built from raw fetch results
//!
//! Everything here is pure: the aggregation has already succeeded by the
//! time these run.

use k8s_openapi::api::core::v1::{Endpoints, Pod, Service};
use kube::api::DynamicObject;

use super::AggregatorSettings;
use crate::models::{
    EndpointSubset, MeshObjectList, NamespaceRef, PodInfo, ResourcePermissions, ServiceDetails,
    ServiceHealth, ServiceInfo, ServiceList, ServiceOverview, Workload, WorkloadOverview,
    WorkloadSources, any_has_istio_sidecar,
};
use crate::selector::{endpoints_for_pods, pods_for_endpoints, pods_for_selector};

/// One overview per service, in fetch order.
pub fn build_service_list(
    namespace: &str,
    services: &[Service],
    pods: &[Pod],
    settings: &AggregatorSettings,
) -> ServiceList {
    let services = services
        .iter()
        .map(|service| {
            let info = ServiceInfo::parse(service);
            let selected: Vec<PodInfo> = pods_for_selector(&info.selector, pods)
                .into_iter()
                .map(|p| PodInfo::parse(p, &settings.sidecar_annotation))
                .collect();
            ServiceOverview {
                istio_sidecar: any_has_istio_sidecar(&selected),
                app_label: info.selector.contains_key(&settings.app_label),
                name: info.name,
            }
        })
        .collect();

    ServiceList {
        namespace: NamespaceRef {
            name: namespace.to_string(),
        },
        services,
    }
}

/// Raw results of a successful details aggregation
pub struct DetailParts {
    pub service: Service,
    pub endpoints: Endpoints,
    pub pods: Vec<Pod>,
    pub virtual_services: Vec<DynamicObject>,
    pub virtual_service_permissions: ResourcePermissions,
    pub destination_rules: Vec<DynamicObject>,
    pub destination_rule_permissions: ResourcePermissions,
    pub health: ServiceHealth,
    pub workloads: Vec<Workload>,
    pub source_workloads: WorkloadSources,
}

pub fn build_service_details(parts: DetailParts, settings: &AggregatorSettings) -> ServiceDetails {
    let service = ServiceInfo::parse(&parts.service);
    let selected: Vec<PodInfo> = pods_for_selector(&service.selector, &parts.pods)
        .into_iter()
        .map(|p| PodInfo::parse(p, &settings.sidecar_annotation))
        .collect();
    let subsets = EndpointSubset::parse_all(&parts.endpoints);

    ServiceDetails {
        pods: pods_for_endpoints(&subsets, &selected),
        endpoints: endpoints_for_pods(&subsets, &selected),
        virtual_services: MeshObjectList::new(
            &parts.virtual_services,
            parts.virtual_service_permissions,
        ),
        destination_rules: MeshObjectList::new(
            &parts.destination_rules,
            parts.destination_rule_permissions,
        ),
        health: parts.health,
        workloads: parts
            .workloads
            .iter()
            .map(|w| WorkloadOverview::parse(w, &settings.app_label, &settings.version_label))
            .collect(),
        dependencies: parts.source_workloads,
        service,
    }
}
