//! Service list and service details aggregation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::AggregatorSettings;
use super::assemble::{DetailParts, build_service_details, build_service_list};
use super::health::resolve_health;
use super::permissions::resolve_permissions;
use super::workloads::fetch_workloads;
use crate::backends::{AccessBackend, ClusterBackend, MeshBackend, MetricsBackend};
use crate::error::{Error, FetchKind, Result};
use crate::fanout::{Wave, filled};
use crate::models::{MeshResourceKind, ServiceDetails, ServiceList, creation_time};
use crate::selector::selector_string;

/// Builds composite service views from the cluster, mesh, metrics and
/// access backends.
///
/// Holds no per-request state, so one instance serves any number of
/// concurrent requests.
#[derive(Clone)]
pub struct ServiceAggregator {
    cluster: Arc<dyn ClusterBackend>,
    mesh: Arc<dyn MeshBackend>,
    metrics: Arc<dyn MetricsBackend>,
    access: Arc<dyn AccessBackend>,
    settings: AggregatorSettings,
}

impl ServiceAggregator {
    pub fn new(
        cluster: Arc<dyn ClusterBackend>,
        mesh: Arc<dyn MeshBackend>,
        metrics: Arc<dyn MetricsBackend>,
        access: Arc<dyn AccessBackend>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            cluster,
            mesh,
            metrics,
            access,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Services of `namespace` with their sidecar and app-label flags.
    pub async fn get_service_list(&self, namespace: &str) -> Result<ServiceList> {
        self.service_list(namespace, None).await
    }

    /// Like [`Self::get_service_list`], abandoning the fetches once `cancel` fires.
    pub async fn get_service_list_cancellable(
        &self,
        namespace: &str,
        cancel: CancellationToken,
    ) -> Result<ServiceList> {
        self.service_list(namespace, Some(cancel)).await
    }

    /// Composite view of one service.
    ///
    /// `interval` is the health rate window (a Prometheus duration such as
    /// `10m`) ending at `as_of`.
    pub async fn get_service_details(
        &self,
        namespace: &str,
        service: &str,
        interval: &str,
        as_of: DateTime<Utc>,
    ) -> Result<ServiceDetails> {
        self.service_details(namespace, service, interval, as_of, None)
            .await
    }

    /// Like [`Self::get_service_details`], abandoning the fetches once `cancel` fires.
    pub async fn get_service_details_cancellable(
        &self,
        namespace: &str,
        service: &str,
        interval: &str,
        as_of: DateTime<Utc>,
        cancel: CancellationToken,
    ) -> Result<ServiceDetails> {
        self.service_details(namespace, service, interval, as_of, Some(cancel))
            .await
    }

    async fn service_list(
        &self,
        namespace: &str,
        cancel: Option<CancellationToken>,
    ) -> Result<ServiceList> {
        let mut services = None;
        let mut pods = None;

        let mut wave = Wave::new("service-list").with_cancellation(cancel);
        wave.push("services", &mut services, async {
            self.cluster
                .get_services(namespace)
                .await
                .map_err(|e| Error::fetch(FetchKind::Services, namespace, None, e))
        });
        wave.push("pods", &mut pods, async {
            self.cluster
                .get_pods(namespace, "")
                .await
                .map_err(|e| Error::fetch(FetchKind::Pods, namespace, None, e))
        });
        wave.run().await?;

        let services = filled(services, "services")?;
        let pods = filled(pods, "pods")?;

        let list = build_service_list(namespace, &services, &pods, &self.settings);
        info!(namespace, services = list.services.len(), "built service list");
        Ok(list)
    }

    async fn service_details(
        &self,
        namespace: &str,
        service: &str,
        interval: &str,
        as_of: DateTime<Utc>,
        cancel: Option<CancellationToken>,
    ) -> Result<ServiceDetails> {
        let fetch_err =
            |what: FetchKind| move |e: Error| Error::fetch(what, namespace, Some(service), e);

        // Wave 1: the service object itself and its endpoints
        let mut svc = None;
        let mut endpoints = None;

        let mut wave = Wave::new("service-details").with_cancellation(cancel.clone());
        wave.push("service", &mut svc, async {
            self.cluster
                .get_service(namespace, service)
                .await
                .map_err(fetch_err(FetchKind::Service))
        });
        wave.push("endpoints", &mut endpoints, async {
            self.cluster
                .get_endpoints(namespace, service)
                .await
                .map_err(fetch_err(FetchKind::Endpoints))
        });
        wave.run().await?;

        let svc = filled(svc, "service")?;
        let endpoints = filled(endpoints, "endpoints")?;

        let selector = svc
            .spec
            .as_ref()
            .and_then(|s| s.selector.clone())
            .unwrap_or_default();
        let selector_str = selector_string(&selector);
        debug!(namespace, service, selector = %selector_str, "resolved service selector");

        // Wave 2: everything that depends on the selector or is independent of it
        let mut pods = None;
        let mut health = None;
        let mut virtual_services = None;
        let mut destination_rules = None;
        let mut source_workloads = None;
        let mut workloads = None;
        let mut vs_permissions = None;
        let mut dr_permissions = None;

        let mut wave = Wave::new("service-details-dependents").with_cancellation(cancel);
        wave.push("pods", &mut pods, async {
            self.cluster
                .get_pods(namespace, &selector_str)
                .await
                .map_err(fetch_err(FetchKind::Pods))
        });
        wave.push_soft(
            &mut health,
            resolve_health(self.metrics.as_ref(), namespace, service, interval, as_of),
        );
        wave.push("virtual_services", &mut virtual_services, async {
            self.mesh
                .get_virtual_services(namespace, service)
                .await
                .map_err(fetch_err(FetchKind::VirtualServices))
        });
        wave.push("destination_rules", &mut destination_rules, async {
            self.mesh
                .get_destination_rules(namespace, service)
                .await
                .map_err(fetch_err(FetchKind::DestinationRules))
        });
        wave.push("source_workloads", &mut source_workloads, async {
            let ns = self
                .cluster
                .get_namespace(namespace)
                .await
                .map_err(fetch_err(FetchKind::NamespaceMetadata))?;
            let since = creation_time(&ns.metadata).unwrap_or(as_of);
            self.metrics
                .get_source_workloads(namespace, since, service)
                .await
                .map_err(fetch_err(FetchKind::SourceWorkloads))
        });
        wave.push("workloads", &mut workloads, async {
            fetch_workloads(
                self.cluster.as_ref(),
                namespace,
                &selector,
                &self.settings.sidecar_annotation,
            )
            .await
            .map_err(fetch_err(FetchKind::Workloads))
        });
        wave.push_soft(
            &mut vs_permissions,
            resolve_permissions(
                self.access.as_ref(),
                namespace,
                MeshResourceKind::VirtualServices,
                self.settings.read_only,
            ),
        );
        wave.push_soft(
            &mut dr_permissions,
            resolve_permissions(
                self.access.as_ref(),
                namespace,
                MeshResourceKind::DestinationRules,
                self.settings.read_only,
            ),
        );
        wave.run().await?;

        let parts = DetailParts {
            service: svc,
            endpoints,
            pods: filled(pods, "pods")?,
            virtual_services: filled(virtual_services, "virtual_services")?,
            virtual_service_permissions: filled(vs_permissions, "virtual_service_permissions")?,
            destination_rules: filled(destination_rules, "destination_rules")?,
            destination_rule_permissions: filled(dr_permissions, "destination_rule_permissions")?,
            health: filled(health, "health")?,
            workloads: filled(workloads, "workloads")?,
            source_workloads: filled(source_workloads, "source_workloads")?,
        };

        let details = build_service_details(parts, &self.settings);
        info!(
            namespace,
            service,
            pods = details.pods.len(),
            workloads = details.workloads.len(),
            "built service details"
        );
        Ok(details)
    }
}
