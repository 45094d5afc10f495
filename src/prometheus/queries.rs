//! PromQL builders and result shaping

use std::collections::BTreeMap;

use crate::models::{WorkloadRef, WorkloadSources};

/// Escape a value for use inside a double-quoted PromQL label matcher
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Inbound request rate of a service, per response code
pub fn request_rates_query(namespace: &str, service: &str, interval: &str) -> String {
    format!(
        "sum(rate(istio_requests_total{{reporter=\"destination\",destination_service_name=\"{}\",destination_service_namespace=\"{}\"}}[{}])) by (response_code)",
        escape(service),
        escape(namespace),
        interval
    )
}

/// Raw request counters of a service over the last `range_seconds`
pub fn source_workloads_query(
    reporter: &str,
    namespace: &str,
    service: &str,
    range_seconds: i64,
) -> String {
    format!(
        "istio_requests_total{{reporter=\"{}\",destination_service_name=\"{}\",destination_service_namespace=\"{}\"}}[{}s]",
        reporter,
        escape(service),
        escape(namespace),
        range_seconds.max(1)
    )
}

/// Group request series by destination and collect distinct source workloads.
///
/// The key is `destination_app`, suffixed with `/destination_version` when
/// the series carries one. Sources keep first-seen order and are distinct by
/// workload name.
pub fn group_source_workloads<'a>(
    series: impl IntoIterator<Item = &'a BTreeMap<String, String>>,
) -> WorkloadSources {
    let label = |metric: &BTreeMap<String, String>, name: &str| {
        metric.get(name).cloned().unwrap_or_default()
    };

    let mut routes = WorkloadSources::new();
    for metric in series {
        let mut key = label(metric, "destination_app");
        if let Some(version) = metric.get("destination_version") {
            key = format!("{}/{}", key, version);
        }

        let source = WorkloadRef {
            namespace: label(metric, "source_workload_namespace"),
            app: label(metric, "source_app"),
            workload: label(metric, "source_workload"),
            version: label(metric, "source_version"),
        };

        let sources = routes.entry(key).or_default();
        if !sources.iter().any(|s| s.workload == source.workload) {
            sources.push(source);
        }
    }
    routes
}
