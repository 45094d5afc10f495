//! meshscope library
//!
//! Composite service views for Istio service-mesh clusters, aggregated
//! concurrently from the cluster API, mesh configuration, Prometheus
//! telemetry and access review. The binary is a thin CLI over
//! [`ServiceAggregator`].

pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod fanout;
pub mod kube;
pub mod models;
pub mod prometheus;
pub mod selector;
pub mod services;

// Re-export commonly used types for convenience
pub use backends::{AccessBackend, ClusterBackend, MeshBackend, MetricsBackend, ResponseCodeRate};
pub use error::{Error, FetchKind, Result};
pub use models::{ServiceDetails, ServiceList};
pub use services::{AggregatorSettings, ServiceAggregator};
