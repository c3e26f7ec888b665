//! Lifecycle tests for the simulation engine.
//!
//! All tests run on a paused tokio clock, so every timer fires
//! deterministically and the scenarios are exact.

use std::time::Duration;

use gateway_sim::config::{BackendConfig, Health, Method, RouteConfig, SimConfig};
use gateway_sim::engine::{Engine, ForcedGate, GateDecider, RequestState, RoundRobin, RoutePicker};
use gateway_sim::routing::MatchContext;
use gateway_sim::stats::Stats;
use gateway_sim::ConfigError;

fn backend(id: &str) -> BackendConfig {
    BackendConfig {
        id: id.into(),
        name: format!("Backend {id}"),
        health: Health::Healthy,
    }
}

fn route(id: &str, path: &str, backend: &str, cacheable: bool) -> RouteConfig {
    RouteConfig {
        id: id.into(),
        path: path.into(),
        method: Method::Get,
        backend: backend.into(),
        cacheable,
        predicates: Vec::new(),
    }
}

fn single_route_config(cacheable: bool) -> SimConfig {
    SimConfig {
        routes: vec![route("r1", "/api/one", "b1", cacheable)],
        backends: vec![backend("b1")],
        ..SimConfig::default()
    }
}

fn engine(config: SimConfig, gate: impl GateDecider + 'static) -> Engine {
    Engine::new(config, Box::new(gate), Box::new(RoundRobin::new())).unwrap()
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn forwarded_request_completes_and_releases_load() {
    let eng = engine(single_route_config(false), ForcedGate::default());

    let req = eng.admit_one(&MatchContext::any()).unwrap();
    assert_eq!(req.state, RequestState::Processing);
    assert_eq!(req.progress, 0);

    // Load is taken immediately; stats only move at completion.
    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 20);
    assert_eq!(snap.stats, Stats::default());

    sleep_ms(2100).await;
    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(
        snap.stats,
        Stats {
            total: 1,
            success: 1,
            cached: 0,
            rate_limited: 0,
        }
    );
    assert_eq!(snap.requests.len(), 1);
    assert_eq!(snap.requests[0].state, RequestState::Completed);
    assert_eq!(snap.requests[0].progress, 100);

    // Lingers for a second after completion, then retires.
    sleep_ms(1100).await;
    assert!(eng.snapshot().requests.is_empty());
    assert_eq!(eng.stats().total, 1);
}

#[tokio::test(start_paused = true)]
async fn cached_request_skips_backend_entirely() {
    let eng = engine(
        single_route_config(true),
        ForcedGate {
            rate_limit: false,
            cache: true,
        },
    );

    let req = eng.admit_one(&MatchContext::any()).unwrap();
    assert_eq!(req.state, RequestState::Cached);

    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(
        snap.stats,
        Stats {
            total: 1,
            success: 1,
            cached: 1,
            rate_limited: 0,
        }
    );

    // Cache hits resolve faster than processing: gone after the short
    // linger, with load never having moved.
    sleep_ms(1600).await;
    let snap = eng.snapshot();
    assert!(snap.requests.is_empty());
    assert_eq!(snap.backends[0].load, 0);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_request_counts_and_leaves_load_alone() {
    let eng = engine(
        single_route_config(true),
        ForcedGate {
            rate_limit: true,
            cache: true,
        },
    );

    let req = eng.admit_one(&MatchContext::any()).unwrap();
    assert_eq!(req.state, RequestState::RateLimited);

    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(
        snap.stats,
        Stats {
            total: 1,
            success: 0,
            cached: 0,
            rate_limited: 1,
        }
    );

    sleep_ms(1600).await;
    assert!(eng.snapshot().requests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_limit_gate_is_checked_before_cache() {
    // Both gates fire; rate limit must win.
    let eng = engine(
        single_route_config(true),
        ForcedGate {
            rate_limit: true,
            cache: true,
        },
    );
    let req = eng.admit_one(&MatchContext::any()).unwrap();
    assert_eq!(req.state, RequestState::RateLimited);
    assert_eq!(eng.stats().cached, 0);
}

#[tokio::test(start_paused = true)]
async fn cache_gate_ignored_for_uncacheable_route() {
    let eng = engine(
        single_route_config(false),
        ForcedGate {
            rate_limit: false,
            cache: true,
        },
    );
    let req = eng.admit_one(&MatchContext::any()).unwrap();
    assert_eq!(req.state, RequestState::Processing);
    assert_eq!(eng.snapshot().backends[0].load, 20);
}

#[tokio::test(start_paused = true)]
async fn overlapping_routes_select_the_earlier_one() {
    let config = SimConfig {
        routes: vec![
            route("rA", "/api/shared", "b1", false),
            route("rB", "/api/shared", "b2", false),
        ],
        backends: vec![backend("b1"), backend("b2")],
        ..SimConfig::default()
    };
    let eng = engine(config, ForcedGate::default());

    for _ in 0..5 {
        let req = eng.admit_one(&MatchContext::for_path("/api/shared")).unwrap();
        assert_eq!(req.route_id, "rA");
        assert_eq!(req.backend_id, "b1");
    }

    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 100); // 5 * 20, clamped anyway
    assert_eq!(snap.backends[1].load, 0);
}

#[tokio::test(start_paused = true)]
async fn no_route_matched_leaves_engine_untouched() {
    let eng = engine(single_route_config(false), ForcedGate::default());

    let err = eng.admit_one(&MatchContext::for_path("/nope")).unwrap_err();
    assert_eq!(err, gateway_sim::AdmitError::NoRouteMatched);

    // Rejected admissions are not counted and nothing is in flight.
    let snap = eng.snapshot();
    assert!(snap.requests.is_empty());
    assert_eq!(snap.stats, Stats::default());
    assert_eq!(snap.backends[0].load, 0);
}

#[tokio::test(start_paused = true)]
async fn predicate_override_redirects_selection() {
    let mut config = SimConfig {
        routes: vec![
            route("rA", "/api/shared", "b1", false),
            route("rB", "/api/shared", "b2", false),
        ],
        backends: vec![backend("b1"), backend("b2")],
        ..SimConfig::default()
    };
    config.routes[0].predicates = vec![gateway_sim::config::PredicateConfig {
        id: "p1".into(),
        matched: false,
    }];
    let eng = engine(config, ForcedGate::default());

    // rA's predicate fails, so rB matches first.
    let req = eng.admit_one(&MatchContext::for_path("/api/shared")).unwrap();
    assert_eq!(req.route_id, "rB");

    // Overriding the predicate restores rA.
    let ctx = MatchContext::for_path("/api/shared").with_override("p1", true);
    let req = eng.admit_one(&ctx).unwrap();
    assert_eq!(req.route_id, "rA");
}

#[tokio::test(start_paused = true)]
async fn progress_advances_only_while_processing() {
    let eng = engine(single_route_config(false), ForcedGate::default());
    eng.admit_one(&MatchContext::any()).unwrap();

    sleep_ms(650).await;
    let snap = eng.snapshot();
    assert_eq!(snap.requests[0].progress, 30);

    sleep_ms(1250).await; // t = 1900, one tick shy of completion
    let snap = eng.snapshot();
    assert_eq!(snap.requests[0].state, RequestState::Processing);
    assert_eq!(snap.requests[0].progress, 90);

    sleep_ms(200).await; // past completion
    let snap = eng.snapshot();
    assert_eq!(snap.requests[0].state, RequestState::Completed);
    assert_eq!(snap.requests[0].progress, 100);
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_pending_timers() {
    let eng = engine(single_route_config(false), ForcedGate::default());
    eng.admit_one(&MatchContext::any()).unwrap();
    assert_eq!(eng.snapshot().backends[0].load, 20);

    eng.reset();
    let snap = eng.snapshot();
    assert!(snap.requests.is_empty());
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(snap.stats, Stats::default());

    // The completion timer scheduled before the reset must not fire
    // after it: no late stats, no spurious decrement.
    sleep_ms(3500).await;
    let snap = eng.snapshot();
    assert!(snap.requests.is_empty());
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(snap.stats, Stats::default());
}

#[tokio::test(start_paused = true)]
async fn admissions_after_reset_run_normally() {
    let eng = engine(single_route_config(false), ForcedGate::default());
    eng.admit_one(&MatchContext::any()).unwrap();
    eng.reset();

    eng.admit_one(&MatchContext::any()).unwrap();
    sleep_ms(2100).await;
    let snap = eng.snapshot();
    assert_eq!(snap.stats.total, 1);
    assert_eq!(snap.backends[0].load, 0);
}

#[tokio::test(start_paused = true)]
async fn eviction_from_visible_window_still_releases_load() {
    let config = SimConfig {
        visible_window: 2,
        ..single_route_config(false)
    };
    let eng = engine(config, ForcedGate::default());

    let first = eng.admit_one(&MatchContext::any()).unwrap();
    eng.admit_one(&MatchContext::any()).unwrap();
    eng.admit_one(&MatchContext::any()).unwrap();

    // Only the two most recent admissions are observable, oldest
    // evicted first, and the window preserves admission order.
    let snap = eng.snapshot();
    assert_eq!(snap.requests.len(), 2);
    assert!(snap.requests.iter().all(|r| r.id != first.id));
    assert!(snap.requests[0].id < snap.requests[1].id);

    // The evicted request still holds and then releases its load.
    assert_eq!(snap.backends[0].load, 60);
    sleep_ms(2100).await;
    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(snap.stats.total, 3);
    assert_eq!(snap.stats.success, 3);
}

#[tokio::test(start_paused = true)]
async fn ticker_admits_on_cadence_and_stop_halts_admission() {
    let eng = engine(
        SimConfig::demo(),
        ForcedGate {
            rate_limit: true,
            cache: false,
        },
    );

    eng.start();
    eng.start(); // idempotent
    assert!(eng.is_running());

    sleep_ms(4600).await; // admissions at 1500, 3000, 4500
    assert_eq!(eng.stats().rate_limited, 3);

    eng.stop();
    eng.stop(); // idempotent
    assert!(!eng.is_running());

    sleep_ms(4500).await;
    assert_eq!(eng.stats().rate_limited, 3);
    // All short-circuit lingers have elapsed by now.
    assert!(eng.snapshot().requests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_lets_in_flight_requests_complete() {
    // Round-robin picker starts at the first demo route (backend api1).
    let eng = engine(SimConfig::demo(), ForcedGate::default());

    eng.start();
    sleep_ms(1600).await; // one admission at t=1500
    eng.stop();

    let snap = eng.snapshot();
    assert_eq!(snap.requests.len(), 1);
    assert_eq!(snap.requests[0].state, RequestState::Processing);
    assert_eq!(snap.backends[0].load, 20);

    // Stopping must not strand the load: the completion timer still
    // fires and releases it.
    sleep_ms(2500).await;
    let snap = eng.snapshot();
    assert_eq!(snap.backends[0].load, 0);
    assert_eq!(snap.stats.total, 1);
    assert_eq!(snap.stats.success, 1);
}

#[tokio::test(start_paused = true)]
async fn round_robin_ticker_spreads_load_across_backends() {
    let eng = engine(SimConfig::demo(), ForcedGate::default());

    eng.start();
    sleep_ms(4600).await; // three admissions, one per route
    eng.stop();

    let snap = eng.snapshot();
    let loaded: Vec<u32> = snap.backends.iter().map(|b| b.load).collect();
    // Last admission (t=4500) is still processing; earlier ones may
    // have completed (t=3500) or not (t=5000 > 4600).
    assert_eq!(loaded[2], 20);
    assert!(snap.requests.iter().any(|r| r.backend_id == "api3"));
}

#[tokio::test(start_paused = true)]
async fn engine_rejects_invalid_config() {
    let config = SimConfig {
        routes: vec![route("r1", "/api/one", "missing", false)],
        backends: vec![backend("b1")],
        ..SimConfig::default()
    };
    let err = Engine::new(
        config,
        Box::new(ForcedGate::default()),
        Box::new(RoundRobin::new()),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[tokio::test(start_paused = true)]
async fn pickers_are_swappable_strategies() {
    // Any RoutePicker implementation can drive the ticker; verify the
    // trait object path works with a custom one.
    #[derive(Debug)]
    struct AlwaysOrders;
    impl RoutePicker for AlwaysOrders {
        fn pick(&self, _table: &gateway_sim::routing::RouteTable) -> MatchContext {
            MatchContext::for_path("/api/orders")
        }
    }

    let eng = Engine::new(
        SimConfig::demo(),
        Box::new(ForcedGate::default()),
        Box::new(AlwaysOrders),
    )
    .unwrap();

    eng.start();
    sleep_ms(3100).await; // admissions at 1500 and 3000
    eng.stop();

    let snap = eng.snapshot();
    assert!(snap.requests.iter().all(|r| r.backend_id == "api2"));
    assert_eq!(snap.backends[1].load, 40);
}
