//! Fetch-cycle behaviour of the Dashboard against a scripted backend.

mod support;

use std::sync::Arc;
use std::time::Duration;

use skywatch_dashboard::{Dashboard, DashboardOptions, FETCH_ERROR_MESSAGE};
use skywatch_weather::WeatherApi;
use support::{city_data, settle, Failure, MockApi};

fn dashboard(api: &Arc<MockApi>) -> Dashboard {
    let api: Arc<dyn WeatherApi> = api.clone();
    Dashboard::new(api, DashboardOptions::default())
}

#[tokio::test]
async fn test_activation_runs_one_cycle() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 31.5, &["42"]));
    let dashboard = dashboard(&api);

    assert!(dashboard.activate("Delhi").await.unwrap());

    assert_eq!(api.calls_for("current", "Delhi"), 1);
    assert_eq!(api.calls_for("summary", "Delhi"), 1);
    assert_eq!(api.calls_for("alerts", "Delhi"), 1);

    let state = dashboard.snapshot();
    assert_eq!(state.city.as_deref(), Some("Delhi"));
    assert_eq!(state.current_weather.as_ref().map(|r| r.temperature), Some(31.5));
    assert_eq!(state.alerts.len(), 1);
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_reads_are_issued_concurrently() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    // Each read waits until all three are in flight; sequential reads would hang.
    api.rendezvous(3);
    let dashboard = dashboard(&api);

    let applied = tokio::time::timeout(Duration::from_secs(5), dashboard.activate("Delhi"))
        .await
        .expect("reads were not issued together")
        .unwrap();

    assert!(applied);
    assert!(dashboard.snapshot().current_weather.is_some());
}

#[tokio::test]
async fn test_loading_while_in_flight() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    api.close("Delhi");
    let dashboard = dashboard(&api);

    let cycle = dashboard.activate("Delhi");
    settle().await;

    let state = dashboard.snapshot();
    assert!(state.loading);
    assert!(state.error.is_none());
    assert!(state.is_empty());

    api.open("Delhi");
    assert!(cycle.await.unwrap());
    assert!(!dashboard.snapshot().loading);
}

#[tokio::test]
async fn test_weekly_summary_feeds_daily_section() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();

    let state = dashboard.snapshot();
    assert_eq!(state.historical_data.len(), 7);
    assert!(state
        .historical_data
        .windows(2)
        .all(|w| w[0].day() < w[1].day()));
    assert_eq!(state.today_summary(), state.historical_data.first());
    assert_eq!(
        state.today_summary().map(|s| s.date.as_str()),
        Some("2024-10-14")
    );
}

#[tokio::test]
async fn test_all_reads_empty_is_not_an_error() {
    let api = MockApi::new();
    let dashboard = dashboard(&api);

    assert!(dashboard.activate("Kolkata").await.unwrap());

    let state = dashboard.snapshot();
    assert!(state.is_empty());
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_transport_failure_looks_like_empty_data() {
    let failing = MockApi::new();
    failing.set_city("Delhi", city_data("Delhi", 30.0, &["42"]));
    failing.fail("alerts", Failure::Transport);

    let empty = MockApi::new();
    let mut data = city_data("Delhi", 30.0, &[]);
    data.alerts.clear();
    empty.set_city("Delhi", data);

    let a = dashboard(&failing);
    let b = dashboard(&empty);
    a.activate("Delhi").await.unwrap();
    b.activate("Delhi").await.unwrap();

    assert!(a.snapshot().error.is_none());
    assert_eq!(a.snapshot(), b.snapshot());
}

#[tokio::test]
async fn test_malformed_response_fails_cycle() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &["42"]));
    api.fail("summary", Failure::Malformed);
    let dashboard = dashboard(&api);

    assert!(dashboard.activate("Delhi").await.unwrap());

    let state = dashboard.snapshot();
    assert_eq!(state.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
    assert!(!state.loading);
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_failed_cycle_clears_previous_data() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &["42"]));
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    assert!(!dashboard.snapshot().is_empty());

    api.fail("current", Failure::Malformed);
    assert!(dashboard.refresh().await);

    let state = dashboard.snapshot();
    assert!(state.is_empty());
    assert!(state.error.is_some());

    api.recover("current");
    assert!(dashboard.refresh().await);

    let state = dashboard.snapshot();
    assert!(state.error.is_none());
    assert_eq!(state.alerts.len(), 1);
}

#[tokio::test]
async fn test_repeated_cycles_are_idempotent() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &["42", "43"]));
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    let once = dashboard.snapshot();

    dashboard.refresh().await;
    let twice = dashboard.snapshot();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn test_stale_city_does_not_overwrite() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &["42"]));
    api.set_city("Mumbai", city_data("Mumbai", 28.0, &[]));
    api.close("Delhi");
    let dashboard = dashboard(&api);

    let delhi = dashboard.activate("Delhi");
    settle().await;
    assert!(dashboard.activate("Mumbai").await.unwrap());

    api.open("Delhi");
    assert!(!delhi.await.unwrap());

    let state = dashboard.snapshot();
    assert_eq!(state.city.as_deref(), Some("Mumbai"));
    assert_eq!(state.current_weather.map(|r| r.city), Some("Mumbai".to_string()));
    assert!(state.alerts.is_empty());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_city_change_drops_old_data_immediately() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &["42"]));
    api.set_city("Chennai", city_data("Chennai", 33.0, &[]));
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    api.close("Chennai");

    let chennai = dashboard.activate("Chennai");
    let state = dashboard.snapshot();
    assert_eq!(state.city.as_deref(), Some("Chennai"));
    assert!(state.is_empty());
    assert!(state.loading);

    api.open("Chennai");
    chennai.await.unwrap();
    assert_eq!(
        dashboard.snapshot().current_weather.map(|r| r.city),
        Some("Chennai".to_string())
    );
}

#[tokio::test]
async fn test_deactivate_discards_in_flight_cycle() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &["42"]));
    api.close("Delhi");
    let dashboard = dashboard(&api);

    let cycle = dashboard.activate("Delhi");
    settle().await;
    dashboard.deactivate();
    assert!(!dashboard.is_active());

    api.open("Delhi");
    assert!(!cycle.await.unwrap());

    let state = dashboard.snapshot();
    assert!(!state.loading);
    assert!(state.is_empty());
    assert!(!dashboard.refresh().await);
}

#[tokio::test]
async fn test_subscribers_see_settled_state() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    let dashboard = dashboard(&api);
    let mut rx = dashboard.subscribe();

    dashboard.activate("Delhi").await.unwrap();

    assert!(rx.has_changed().unwrap());
    let state = rx.borrow_and_update().clone();
    assert_eq!(state, dashboard.snapshot());
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn test_timer_fires_once_per_interval() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    settle().await;
    assert_eq!(api.calls("current"), 1);

    tokio::time::advance(Duration::from_millis(299_999)).await;
    settle().await;
    assert_eq!(api.calls("current"), 1);

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(api.calls("current"), 2);
    assert_eq!(api.calls("summary"), 2);
    assert_eq!(api.calls("alerts"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_custom_interval() {
    let api = MockApi::new();
    let options = DashboardOptions {
        refresh_interval: Duration::from_secs(30),
        summary_days: 3,
    };
    let dashboard = Dashboard::new(api.clone(), options);

    dashboard.activate("Delhi").await.unwrap();
    settle().await;

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
    }

    assert_eq!(api.calls("current"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_city_change_restarts_timer() {
    let api = MockApi::new();
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    tokio::time::advance(Duration::from_secs(200)).await;
    settle().await;

    dashboard.activate("Mumbai").await.unwrap();
    settle().await;

    // Delhi's timer would have fired here.
    tokio::time::advance(Duration::from_secs(100)).await;
    settle().await;
    assert_eq!(api.calls_for("current", "Delhi"), 1);
    assert_eq!(api.calls_for("current", "Mumbai"), 1);

    tokio::time::advance(Duration::from_secs(200)).await;
    settle().await;
    assert_eq!(api.calls_for("current", "Delhi"), 1);
    assert_eq!(api.calls_for("current", "Mumbai"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_ticks_after_deactivate() {
    let api = MockApi::new();
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    dashboard.deactivate();
    settle().await;

    tokio::time::advance(Duration::from_secs(900)).await;
    settle().await;

    assert_eq!(api.calls("current"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_timer() {
    let api = MockApi::new();
    let dashboard = dashboard(&api);

    dashboard.activate("Delhi").await.unwrap();
    drop(dashboard);
    settle().await;

    tokio::time::advance(Duration::from_secs(900)).await;
    settle().await;

    assert_eq!(api.calls("current"), 1);
}

#[tokio::test]
async fn test_dropped_refresh_still_settles() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    let dashboard = dashboard(&api);
    dashboard.activate("Delhi").await.unwrap();

    api.close("Delhi");
    let dropped = tokio::time::timeout(Duration::from_millis(50), dashboard.refresh()).await;
    assert!(dropped.is_err());
    assert!(dashboard.snapshot().loading);

    api.open("Delhi");
    let mut rx = dashboard.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|state| !state.loading))
        .await
        .expect("abandoned refresh never settled")
        .unwrap();

    assert!(dashboard.refresh().await);
    let state = dashboard.snapshot();
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_overlapping_cycles_last_to_settle_wins() {
    let api = MockApi::new();
    api.set_city("Delhi", city_data("Delhi", 30.0, &[]));
    let dashboard = Arc::new(dashboard(&api));
    dashboard.activate("Delhi").await.unwrap();

    let gate = api.close("Delhi");
    let first = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.refresh().await }
    });
    settle().await;
    let second = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.refresh().await }
    });
    settle().await;

    assert_eq!(api.calls_for("current", "Delhi"), 3);
    assert!(dashboard.snapshot().loading);

    api.set_city("Delhi", city_data("Delhi", 31.0, &[]));
    gate.add_permits(3);
    assert!(first.await.unwrap());

    let state = dashboard.snapshot();
    assert!(state.loading, "second cycle is still in flight");
    assert_eq!(state.current_weather.map(|r| r.temperature), Some(31.0));

    api.set_city("Delhi", city_data("Delhi", 35.0, &["44"]));
    gate.add_permits(3);
    assert!(second.await.unwrap());

    let state = dashboard.snapshot();
    assert!(!state.loading);
    assert_eq!(state.current_weather.map(|r| r.temperature), Some(35.0));
    assert_eq!(state.alerts.len(), 1);
}
