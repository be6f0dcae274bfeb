//! Behavioral tests for the convergence waiter
//!
//! All tests run on paused tokio time, so sleeps complete instantly and
//! elapsed-time assertions are exact.

use converge_core::{
    ApiError, DeletedSentinel, StateSpec, WaitError, wait, wait_with_report,
};
use converge_test_utils::{ScriptedApi, ScriptedPoller, Step, init_test_tracing};
use std::time::Duration;

const DELETED: &str = "tf-marker-for-deleted-route-aggregation";

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn provisioning_spec(
    poller: ScriptedPoller<&'static str, u32>,
    interval: u64,
    deadline: u64,
) -> StateSpec<ScriptedPoller<&'static str, u32>> {
    StateSpec::new("ra-1", poller)
        .pending(["PROVISIONING"])
        .target(["PROVISIONED"])
        .interval(secs(interval))
        .min_interval(secs(interval))
        .deadline(secs(deadline))
}

#[tokio::test(start_paused = true)]
async fn test_pending_then_target_takes_n_plus_one_polls() {
    init_test_tracing();
    for n in 0..5usize {
        let mut states = vec!["PROVISIONING"; n];
        states.push("PROVISIONED");
        let poller = ScriptedPoller::from_states(states);
        let log = poller.log();

        let converged = wait_with_report(provisioning_spec(poller, 1, 100))
            .await
            .unwrap();

        assert_eq!(converged.attempts as usize, n + 1);
        assert_eq!(log.count() as usize, n + 1);
        assert_eq!(converged.snapshot as usize, n + 1, "snapshot of the last poll");
    }
}

#[tokio::test(start_paused = true)]
async fn test_provisioning_scenario_elapsed_bounds() {
    let poller = ScriptedPoller::from_states(["PROVISIONING", "PROVISIONING", "PROVISIONED"]);
    let log = poller.log();

    let converged = wait_with_report(provisioning_spec(poller, 1, 100))
        .await
        .unwrap();

    assert_eq!(log.count(), 3);
    assert!(converged.elapsed >= secs(2));
    assert!(converged.elapsed < secs(100));
    assert!(!log.overlapped());
}

#[tokio::test(start_paused = true)]
async fn test_polls_are_spaced_by_the_interval() {
    let poller = ScriptedPoller::from_states(["PROVISIONING", "PROVISIONING", "PROVISIONED"]);
    let log = poller.log();

    wait(provisioning_spec(poller, 7, 100)).await.unwrap();

    let instants = log.instants();
    for pair in instants.windows(2) {
        assert!(pair[1] - pair[0] >= secs(7));
    }
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_first_state_fails_after_one_poll() {
    let poller = ScriptedPoller::from_states(["FAILED", "PROVISIONED"]);
    let log = poller.log();

    let err = wait(provisioning_spec(poller, 1, 100)).await.unwrap_err();

    assert!(err.is_terminal_failure());
    assert_eq!(err.observed_state(), Some(&"FAILED"));
    assert_eq!(log.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_always_pending_hits_the_deadline() {
    let poller = ScriptedPoller::from_states(["PROVISIONING"]);
    let log = poller.log();
    let interval = secs(3);
    let deadline = secs(20);

    let err = wait(provisioning_spec(poller, 3, 20)).await.unwrap_err();

    match err {
        WaitError::DeadlineExceeded {
            last_state,
            snapshot,
            attempts,
            elapsed,
            ..
        } => {
            assert_eq!(last_state, Some("PROVISIONING"));
            assert_eq!(snapshot, Some(1));
            assert_eq!(attempts, log.count());
            assert!(elapsed >= deadline);
            assert!(elapsed <= deadline + interval);
        }
        other => panic!("expected DeadlineExceeded, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_interval_longer_than_deadline_times_out_without_polling() {
    let poller = ScriptedPoller::from_states(["PROVISIONING"]);
    let log = poller.log();

    let err = wait(provisioning_spec(poller, 10, 5)).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.observed_state(), None);
    assert_eq!(log.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_poll_is_allowed_to_finish() {
    // Each poll takes longer than the remaining budget.
    let poller = ScriptedPoller::from_states(["PROVISIONING", "PROVISIONED"]).with_latency(secs(8));
    let log = poller.log();

    let err = wait(provisioning_spec(poller, 1, 5)).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(log.count(), 1);
    assert_eq!(err.observed_state(), Some(&"PROVISIONING"));
}

#[tokio::test(start_paused = true)]
async fn test_poll_error_is_not_retried() {
    let poller = ScriptedPoller::new([
        Step::State("PROVISIONING", 1),
        Step::Fail("connection reset by peer".to_string()),
        Step::State("PROVISIONING", 3),
        Step::State("PROVISIONING", 4),
        Step::State("PROVISIONED", 5),
    ]);
    let log = poller.log();

    let err = wait(provisioning_spec(poller, 1, 100)).await.unwrap_err();

    match &err {
        WaitError::Poll { attempts, source } => {
            assert_eq!(*attempts, 2);
            assert!(source.to_string().contains("connection reset"));
        }
        other => panic!("expected Poll error, got {other:?}"),
    }
    assert_eq!(log.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_delete_converges_on_first_poll() {
    let api: ScriptedApi<&'static str, ()> = ScriptedApi::always(ApiError::http(404, "not found"));
    let log = api.log();
    let spec = StateSpec::new("ra-1", DeletedSentinel::new(DELETED).classify(api))
        .pending(["DEPROVISIONING"])
        .target([DELETED])
        .interval(secs(10))
        .min_interval(secs(5))
        .deadline(secs(600));

    let converged = wait_with_report(spec).await.unwrap();

    assert_eq!(converged.state, DELETED);
    assert_eq!(converged.snapshot, None);
    assert_eq!(converged.attempts, 1);
    assert_eq!(log.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sentinel_is_stable_across_polls() {
    let mut poller = DeletedSentinel::new(DELETED)
        .classify(ScriptedApi::<&'static str, ()>::always(ApiError::http(404, "gone")));

    for _ in 0..5 {
        let result = converge_core::Poller::poll(&mut poller).await;
        assert_eq!(result.state(), Some(&DELETED));
    }
}

#[tokio::test(start_paused = true)]
async fn test_delete_waits_through_deprovisioning_then_sentinel() {
    let api = ScriptedApi::new([
        Ok(("DEPROVISIONING", "ra-1")),
        Ok(("DEPROVISIONING", "ra-1")),
        Err(ApiError::http(400, "cannot read").with_code("EQ-3044301")),
    ]);
    let log = api.log();
    let sentinel = DeletedSentinel::new(DELETED).with_code("EQ-3044301");
    let spec = StateSpec::new("ra-1", sentinel.classify(api))
        .pending(["DEPROVISIONING"])
        .target([DELETED])
        .interval(secs(10))
        .min_interval(secs(5))
        .deadline(secs(600));

    let snapshot = wait(spec).await.unwrap();

    assert_eq!(snapshot, None);
    assert_eq!(log.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unclassified_delete_error_is_a_poll_error() {
    let api: ScriptedApi<&'static str, ()> =
        ScriptedApi::always(ApiError::http(500, "internal server error"));
    let spec = StateSpec::new("ra-1", DeletedSentinel::new(DELETED).classify(api))
        .pending(["DEPROVISIONING"])
        .target([DELETED])
        .deadline(secs(600));

    let err = wait(spec).await.unwrap_err();

    match err {
        WaitError::Poll { source, .. } => {
            let api_err = source.downcast_ref::<ApiError>().expect("ApiError cause");
            assert_eq!(api_err.status, Some(500));
        }
        other => panic!("expected Poll error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_independent_waits_run_concurrently() {
    let slow = ScriptedPoller::from_states(["PROVISIONING", "PROVISIONING", "PROVISIONED"]);
    let fast = ScriptedPoller::from_states(["PROVISIONED"]);
    let slow_log = slow.log();
    let fast_log = fast.log();

    let (a, b) = tokio::join!(
        wait(provisioning_spec(slow, 1, 100)),
        wait(provisioning_spec(fast, 1, 100)),
    );

    assert_eq!(a.unwrap(), 3);
    assert_eq!(b.unwrap(), 1);
    assert_eq!(slow_log.count(), 3);
    assert_eq!(fast_log.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_wait_future_can_run_on_a_spawned_task() {
    let poller = ScriptedPoller::from_states(["PROVISIONING", "PROVISIONED"]);
    let handle = tokio::spawn(wait(provisioning_spec(poller, 1, 100)));
    assert_eq!(handle.await.unwrap().unwrap(), 2);
}
