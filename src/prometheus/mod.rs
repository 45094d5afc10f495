//! Metrics backend over the Prometheus HTTP API
//!
//! Queries Istio's standard `istio_requests_total` metric for service health
//! and for the workloads sending traffic to a service.

mod client;
mod queries;
mod response;

pub use client::PrometheusClient;
pub use queries::{group_source_workloads, request_rates_query, source_workloads_query};
pub use response::{MatrixSeries, QueryData, VectorSample};
