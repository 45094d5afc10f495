//! Service health snapshot

use serde::Serialize;

/// Inbound request rates over the health interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHealth {
    pub request_count: f64,
    pub request_error_count: f64,
}

impl RequestHealth {
    /// Share of failed requests, or `None` when there was no traffic
    pub fn error_ratio(&self) -> Option<f64> {
        (self.request_count > 0.0).then(|| self.request_error_count / self.request_count)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ServiceHealth {
    pub requests: RequestHealth,
}
