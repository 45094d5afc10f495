//! Service health resolution
//!
//! Health is a soft resolution: a telemetry failure yields the zero-value
//! snapshot and never aborts the aggregation.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::backends::{MetricsBackend, ResponseCodeRate};
use crate::models::{RequestHealth, ServiceHealth};

/// Response codes counted as failed requests (`4xx`, `5xx`)
fn is_error_code(code: &str) -> bool {
    code.len() == 3
        && code.chars().all(|c| c.is_ascii_digit())
        && matches!(code.as_bytes()[0], b'4' | b'5')
}

/// Sum per-code rates into request and error totals
pub fn request_health(rates: &[ResponseCodeRate]) -> RequestHealth {
    rates.iter().fold(RequestHealth::default(), |mut acc, r| {
        acc.request_count += r.rate;
        if is_error_code(&r.code) {
            acc.request_error_count += r.rate;
        }
        acc
    })
}

/// Health of a service over `interval` ending at `as_of`
pub async fn resolve_health(
    metrics: &dyn MetricsBackend,
    namespace: &str,
    service: &str,
    interval: &str,
    as_of: DateTime<Utc>,
) -> ServiceHealth {
    match metrics
        .get_service_request_rates(namespace, service, interval, as_of)
        .await
    {
        Ok(rates) => ServiceHealth {
            requests: request_health(&rates),
        },
        Err(err) => {
            warn!(namespace, service, error = %err, "service health unavailable, using empty health");
            ServiceHealth::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockMetricsBackend;
    use crate::error::Error;

    fn rate(code: &str, rate: f64) -> ResponseCodeRate {
        ResponseCodeRate {
            code: code.to_string(),
            rate,
        }
    }

    #[test]
    fn test_request_health_counts_4xx_and_5xx() {
        let health = request_health(&[
            rate("200", 8.0),
            rate("404", 1.0),
            rate("503", 0.5),
            rate("", 0.5),
        ]);
        assert_eq!(health.request_count, 10.0);
        assert_eq!(health.request_error_count, 1.5);
    }

    #[test]
    fn test_is_error_code() {
        assert!(is_error_code("500"));
        assert!(is_error_code("429"));
        assert!(!is_error_code("200"));
        assert!(!is_error_code("5xx"));
        assert!(!is_error_code("0"));
    }

    #[tokio::test]
    async fn test_metrics_failure_degrades_to_empty_health() {
        let mut metrics = MockMetricsBackend::new();
        metrics
            .expect_get_service_request_rates()
            .returning(|_, _, _, _| {
                Err(Error::Prometheus {
                    error_type: "timeout".to_string(),
                    message: "query timed out".to_string(),
                })
            });

        let health = resolve_health(&metrics, "ns1", "svc", "10m", Utc::now()).await;
        assert_eq!(health, ServiceHealth::default());
    }
}
