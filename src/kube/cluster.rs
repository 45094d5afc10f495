//! Cluster-state backend over the Kubernetes API

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Pod, Service};
use kube::api::ListParams;
use kube::{Api, Client};

use crate::backends::ClusterBackend;
use crate::error::Result;

/// [`ClusterBackend`] backed by a kube-rs client
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = kube::core::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterBackend for KubeClusterClient {
    async fn get_services(&self, namespace: &str) -> Result<Vec<Service>> {
        let api: Api<Service> = self.namespaced(namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service> {
        let api: Api<Service> = self.namespaced(namespace);
        Ok(api.get(name).await?)
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> Result<Endpoints> {
        let api: Api<Endpoints> = self.namespaced(namespace);
        Ok(api.get(name).await?)
    }

    async fn get_pods(&self, namespace: &str, selector: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = self.namespaced(namespace);
        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(selector);
        }
        Ok(api.list(&params).await?.items)
    }

    async fn get_namespace(&self, namespace: &str) -> Result<Namespace> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get(namespace).await?)
    }

    async fn get_deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let api: Api<Deployment> = self.namespaced(namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>> {
        let api: Api<ReplicaSet> = self.namespaced(namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_stateful_sets(&self, namespace: &str) -> Result<Vec<StatefulSet>> {
        let api: Api<StatefulSet> = self.namespaced(namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }
}
