//! Error types for meshscope
//!
//! Sub-fetch failures are wrapped in [`Error::Fetch`] so the caller can tell
//! which backend query aborted an aggregation and for which namespace/object.

use std::fmt;

use thiserror::Error;

/// Which required sub-fetch of an aggregation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Services,
    Service,
    Pods,
    Endpoints,
    VirtualServices,
    DestinationRules,
    SourceWorkloads,
    NamespaceMetadata,
    Workloads,
}

impl FetchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Service => "service",
            Self::Pods => "pods",
            Self::Endpoints => "endpoints",
            Self::VirtualServices => "virtual services",
            Self::DestinationRules => "destination rules",
            Self::SourceWorkloads => "source workloads",
            Self::NamespaceMetadata => "namespace metadata",
            Self::Workloads => "workloads",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for meshscope operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },

    /// Transport error talking to the metrics backend
    #[error("http error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The Prometheus query API answered with a non-success status
    #[error("prometheus query failed ({error_type}): {message}")]
    Prometheus { error_type: String, message: String },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid url: {source}")]
    InvalidUrl {
        #[from]
        source: url::ParseError,
    },

    /// A required sub-fetch failed; the whole aggregation is discarded
    #[error("failed to fetch {what} in namespace {namespace}{}: {source}", target_suffix(.target))]
    Fetch {
        what: FetchKind,
        namespace: String,
        /// Service (or other object) the fetch was scoped to, if any
        target: Option<String>,
        #[source]
        source: Box<Error>,
    },

    /// The caller cancelled the wave before every task completed
    #[error("aggregation cancelled")]
    Cancelled,

    /// A wave reported success but a result slot was never filled
    #[error("wave task {task} completed without producing a value")]
    IncompleteWave { task: &'static str },
}

fn target_suffix(target: &Option<String>) -> String {
    target
        .as_deref()
        .map(|t| format!(" for {}", t))
        .unwrap_or_default()
}

impl Error {
    /// Wrap a backend error as a hard fetch failure
    pub fn fetch(
        what: FetchKind,
        namespace: &str,
        target: Option<&str>,
        source: impl Into<Error>,
    ) -> Self {
        Self::Fetch {
            what,
            namespace: namespace.to_string(),
            target: target.map(str::to_string),
            source: Box::new(source.into()),
        }
    }

    /// The sub-fetch that failed, if this is a fetch failure
    pub fn fetch_kind(&self) -> Option<FetchKind> {
        match self {
            Self::Fetch { what, .. } => Some(*what),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for meshscope operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
