//! Wave executor tests
//!
//! Exercise the fan-out contract through the public API: every task is
//! started and awaited, failures are collected after the barrier, and
//! nested fetches compose sequentially inside one slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use meshscope::fanout::{Wave, filled};
use meshscope::{Error, FetchKind};

fn failure(what: FetchKind) -> Error {
    Error::fetch(
        what,
        "ns1",
        Some("reviews"),
        Error::Prometheus {
            error_type: "unavailable".to_string(),
            message: "backend down".to_string(),
        },
    )
}

#[tokio::test]
async fn test_every_task_completes_before_failure_is_reported() {
    let completed = Arc::new(AtomicUsize::new(0));
    let mut slots: Vec<Option<u32>> = vec![None; 5];
    let mut failed = None::<u32>;

    let mut wave = Wave::new("barrier");
    for (i, slot) in slots.iter_mut().enumerate() {
        let completed = completed.clone();
        wave.push("sibling", slot, async move {
            tokio::time::sleep(Duration::from_millis(5 * (i as u64 + 1))).await;
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(i as u32)
        });
    }
    wave.push("failing", &mut failed, async {
        Err(failure(FetchKind::Endpoints))
    });
    assert_eq!(wave.len(), 6);

    let err = wave.run().await.unwrap_err();
    assert_eq!(err.fetch_kind(), Some(FetchKind::Endpoints));
    assert_eq!(completed.load(Ordering::SeqCst), 5);
    assert!(failed.is_none());
}

#[tokio::test]
async fn test_nested_fetch_runs_sequentially_in_one_slot() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut nested = None;
    let mut sibling = None;

    let mut wave = Wave::new("nested");
    {
        let order = order.clone();
        wave.push("nested", &mut nested, async move {
            order.lock().unwrap().push("namespace");
            tokio::time::sleep(Duration::from_millis(5)).await;
            order.lock().unwrap().push("traffic");
            Ok("sources")
        });
    }
    wave.push("sibling", &mut sibling, async { Ok(1u8) });
    wave.run().await.unwrap();

    assert_eq!(filled(nested, "nested").unwrap(), "sources");
    assert_eq!(filled(sibling, "sibling").unwrap(), 1);
    let order = order.lock().unwrap();
    let namespace_at = order.iter().position(|s| *s == "namespace").unwrap();
    let traffic_at = order.iter().position(|s| *s == "traffic").unwrap();
    assert!(namespace_at < traffic_at);
}

#[tokio::test]
async fn test_soft_tasks_never_fail_the_wave() {
    let mut soft = None;
    let mut hard = None;

    let mut wave = Wave::new("soft");
    wave.push_soft(&mut soft, async { 0.0_f64 });
    wave.push("hard", &mut hard, async { Ok("ok") });
    wave.run().await.unwrap();

    assert_eq!(soft, Some(0.0));
    assert_eq!(hard, Some("ok"));
}

#[tokio::test]
async fn test_multiple_failures_surface_exactly_one() {
    let mut a = None::<()>;
    let mut b = None::<()>;
    let mut c = None::<()>;

    let mut wave = Wave::new("many-failures");
    wave.push("a", &mut a, async { Err(failure(FetchKind::Pods)) });
    wave.push("b", &mut b, async { Err(failure(FetchKind::VirtualServices)) });
    wave.push("c", &mut c, async { Ok(()) });

    let err = wave.run().await.unwrap_err();
    assert!(matches!(
        err.fetch_kind(),
        Some(FetchKind::Pods) | Some(FetchKind::VirtualServices)
    ));
    assert_eq!(c, Some(()));
}

#[tokio::test]
async fn test_uncancelled_token_does_not_interfere() {
    let token = tokio_util::sync::CancellationToken::new();
    let mut slot = None;

    let mut wave = Wave::new("token").with_cancellation(Some(token));
    wave.push("value", &mut slot, async { Ok(7) });
    wave.run().await.unwrap();

    assert_eq!(slot, Some(7));
}
