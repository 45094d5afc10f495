//! HTTP client for the Prometheus query API

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use super::queries::{group_source_workloads, request_rates_query, source_workloads_query};
use super::response::{ApiResponse, QueryData};
use crate::backends::{MetricsBackend, ResponseCodeRate};
use crate::error::Result;
use crate::models::WorkloadSources;

/// [`MetricsBackend`] querying a Prometheus server
#[derive(Clone)]
pub struct PrometheusClient {
    http_client: reqwest::Client,
    query_url: Url,
    /// Traffic into the control plane is only reported by the destination
    istio_namespace: String,
}

impl PrometheusClient {
    pub fn new(base_url: &str, timeout: Duration, istio_namespace: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let query_url = base.join("api/v1/query")?;

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        tracing::debug!("Created Prometheus client for {}", query_url);

        Ok(Self {
            http_client,
            query_url,
            istio_namespace: istio_namespace.into(),
        })
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    /// Evaluate an instant query at `time`
    pub async fn query(&self, query: &str, time: DateTime<Utc>) -> Result<QueryData> {
        tracing::debug!(query, "Prometheus query");
        let time = time.to_rfc3339();
        let response: ApiResponse = self
            .http_client
            .get(self.query_url.clone())
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await?
            .json()
            .await?;
        response.into_data()
    }

    fn reporter_for(&self, namespace: &str) -> &'static str {
        if namespace == self.istio_namespace {
            "destination"
        } else {
            "source"
        }
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    async fn get_service_request_rates(
        &self,
        namespace: &str,
        service: &str,
        interval: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ResponseCodeRate>> {
        let query = request_rates_query(namespace, service, interval);
        let rates = match self.query(&query, as_of).await? {
            QueryData::Vector(samples) => samples
                .iter()
                .filter_map(|s| {
                    s.number().map(|rate| ResponseCodeRate {
                        code: s.metric.get("response_code").cloned().unwrap_or_default(),
                        rate,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(rates)
    }

    async fn get_source_workloads(
        &self,
        namespace: &str,
        since: DateTime<Utc>,
        service: &str,
    ) -> Result<WorkloadSources> {
        let now = Utc::now();
        let range = (now - since).num_seconds();
        let query = source_workloads_query(self.reporter_for(namespace), namespace, service, range);
        let routes = match self.query(&query, now).await? {
            QueryData::Matrix(series) => group_source_workloads(series.iter().map(|s| &s.metric)),
            QueryData::Vector(samples) => {
                group_source_workloads(samples.iter().map(|s| &s.metric))
            }
            _ => WorkloadSources::new(),
        };
        Ok(routes)
    }
}
