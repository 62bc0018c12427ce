use estransport_types::models::DeadConnectionPolicy;
use estransport_types::TransportError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::connection::Connection;
use crate::pool::{ConnectionPool, StatusConnectionPool};
use crate::resurrect::ResurrectPolicy;
use crate::selector::RoundRobinSelector;

fn conn(host: &str) -> Connection {
    Connection::new(Url::parse(&format!("http://{host}:9200")).unwrap())
}

fn pool_of(hosts: &[&str]) -> StatusConnectionPool {
    StatusConnectionPool::with_round_robin(hosts.iter().map(|h| conn(h)).collect())
        .with_resurrect_policy(ResurrectPolicy::new(Duration::from_secs(60), 5))
}

fn host(c: &Arc<Connection>) -> String {
    c.url().host_str().unwrap().to_string()
}

#[test]
fn test_empty_pool_has_no_connection() {
    let pool = pool_of(&[]);
    assert!(pool.is_empty());
    assert!(matches!(pool.next(), Err(TransportError::NoConnectionAvailable)));
}

#[test]
fn test_round_robin_visits_each_once_then_wraps() {
    let pool = pool_of(&["a", "b", "c"]);

    let picks: Vec<String> = (0..6).map(|_| host(&pool.next().unwrap())).collect();
    assert_eq!(picks, vec!["a", "b", "c", "a", "b", "c"]);
}

#[test]
fn test_dead_connection_rejoins_rotation_after_backoff() {
    let pool = pool_of(&["a", "b", "c"]);
    let t0 = Instant::now();
    let conns = pool.connections();

    pool.on_failure_at(&conns[1], t0);

    for _ in 0..10 {
        let picked = pool.next_at(t0 + Duration::from_secs(59)).unwrap();
        assert_ne!(host(&picked), "b");
        assert!(!pool.health_of(&picked).unwrap().is_dead());
    }

    let picks: HashSet<String> =
        (0..3).map(|_| host(&pool.next_at(t0 + Duration::from_secs(60)).unwrap())).collect();
    assert!(picks.contains("b"), "b not back in rotation: {picks:?}");

    let health = pool.health_of(&conns[1]).unwrap();
    assert!(!health.is_dead());
    assert_eq!(health.failures(), 1);
    assert_eq!(pool.stats_at(t0 + Duration::from_secs(60)).alive, 3);
}

#[test]
fn test_resurrected_connection_backs_off_longer_on_next_failure() {
    let pool = pool_of(&["a", "b"]);
    let t0 = Instant::now();
    let conns = pool.connections();

    pool.on_failure_at(&conns[1], t0);
    let t1 = t0 + Duration::from_secs(60);
    pool.next_at(t1).unwrap();
    assert!(!pool.health_of(&conns[1]).unwrap().is_dead());

    // Fails again before any success: second backoff is 120s.
    pool.on_failure_at(&conns[1], t1);
    assert_eq!(pool.health_of(&conns[1]).unwrap().failures(), 2);

    for _ in 0..4 {
        assert_eq!(host(&pool.next_at(t1 + Duration::from_secs(119)).unwrap()), "a");
    }
    pool.next_at(t1 + Duration::from_secs(120)).unwrap();
    assert!(!pool.health_of(&conns[1]).unwrap().is_dead());

    pool.on_success(&conns[1]);
    assert_eq!(pool.health_of(&conns[1]).unwrap().failures(), 0);
}

#[test]
fn test_oversized_backoff_keeps_connection_dead() {
    let pool = StatusConnectionPool::with_round_robin(vec![conn("a"), conn("b")])
        .with_resurrect_policy(ResurrectPolicy::new(Duration::MAX, 5));
    let t0 = Instant::now();
    let conns = pool.connections();

    pool.on_failure_at(&conns[0], t0);
    pool.on_failure_at(&conns[0], t0);

    for _ in 0..4 {
        assert_eq!(host(&pool.next_at(t0 + Duration::from_secs(86_400)).unwrap()), "b");
    }
    let stats = pool.stats_at(t0 + Duration::from_secs(86_400));
    assert_eq!(stats.dead, 1);
    assert_eq!(stats.connections[0].resurrect_in_secs, Some(u64::MAX));
}

#[test]
fn test_repeated_failure_keeps_dead_since() {
    let pool = pool_of(&["a"]);
    let t0 = Instant::now();
    let a = pool.next_at(t0).unwrap();

    pool.on_failure_at(&a, t0);
    pool.on_failure_at(&a, t0 + Duration::from_secs(1));
    pool.on_failure_at(&a, t0 + Duration::from_secs(2));

    let health = pool.health_of(&a).unwrap();
    assert!(health.is_dead());
    assert_eq!(health.failures(), 3);
    assert_eq!(health.dead_since(), Some(t0));
}

#[test]
fn test_success_revives_connection() {
    let pool = pool_of(&["a", "b"]);
    let conns = pool.connections();
    pool.on_failure(&conns[0]);
    pool.on_failure(&conns[0]);

    pool.on_success(&conns[0]);

    let health = pool.health_of(&conns[0]).unwrap();
    assert!(!health.is_dead());
    assert_eq!(health.failures(), 0);
    assert_eq!(health.dead_since(), None);
    assert_eq!(pool.stats().alive, 2);
}

#[test]
fn test_all_dead_returns_oldest_dead() {
    let pool = pool_of(&["a", "b", "c"]);
    let t0 = Instant::now();
    let conns = pool.connections();

    pool.on_failure_at(&conns[2], t0);
    pool.on_failure_at(&conns[0], t0 + Duration::from_secs(5));
    pool.on_failure_at(&conns[1], t0 + Duration::from_secs(10));

    let picked = pool.next_at(t0 + Duration::from_secs(11)).unwrap();
    assert_eq!(host(&picked), "c");
    assert_eq!(pool.stats_at(t0 + Duration::from_secs(11)).dead, 3);

    // Every backoff has elapsed: all three rejoin the rotation.
    let picks: HashSet<String> =
        (0..3).map(|_| host(&pool.next_at(t0 + Duration::from_secs(600)).unwrap())).collect();
    assert_eq!(picks.len(), 3);
    assert_eq!(pool.stats_at(t0 + Duration::from_secs(600)).alive, 3);
}

#[test]
fn test_dead_ties_break_by_failures_then_order() {
    let pool = pool_of(&["a", "b", "c"]);
    let t0 = Instant::now();
    let conns = pool.connections();

    for c in &conns {
        pool.on_failure_at(c, t0);
    }
    pool.on_failure_at(&conns[0], t0 + Duration::from_secs(1));

    assert_eq!(host(&pool.next_at(t0 + Duration::from_secs(2)).unwrap()), "b");

    pool.on_failure_at(&conns[1], t0 + Duration::from_secs(3));
    assert_eq!(host(&pool.next_at(t0 + Duration::from_secs(4)).unwrap()), "c");
}

#[test]
fn test_eligible_dead_preferred_over_backing_off() {
    let pool = pool_of(&["a", "b"]);
    let t0 = Instant::now();
    let conns = pool.connections();

    // "a" died first but failed three times: 240s backoff.
    pool.on_failure_at(&conns[0], t0);
    pool.on_failure_at(&conns[0], t0);
    pool.on_failure_at(&conns[0], t0);
    // "b" died later with a single failure: 60s backoff.
    pool.on_failure_at(&conns[1], t0 + Duration::from_secs(10));

    assert_eq!(host(&pool.next_at(t0 + Duration::from_secs(30)).unwrap()), "a");
    assert_eq!(host(&pool.next_at(t0 + Duration::from_secs(70)).unwrap()), "b");
    assert!(pool.health_of(&conns[0]).unwrap().is_dead());

    pool.next_at(t0 + Duration::from_secs(240)).unwrap();
    assert!(!pool.health_of(&conns[0]).unwrap().is_dead());
    assert_eq!(pool.stats_at(t0 + Duration::from_secs(240)).alive, 2);
}

#[test]
fn test_single_dead_connection_availability_policy() {
    let pool = pool_of(&["a"]).with_dead_connection_policy(DeadConnectionPolicy::Availability);
    let t0 = Instant::now();
    let a = pool.next_at(t0).unwrap();
    pool.on_failure_at(&a, t0);

    let before = pool.next_at(t0 + Duration::from_secs(1)).unwrap();
    assert!(Arc::ptr_eq(&before, &a));

    let after = pool.next_at(t0 + Duration::from_secs(60)).unwrap();
    assert!(Arc::ptr_eq(&after, &a));
}

#[test]
fn test_single_dead_connection_strict_policy() {
    let pool = pool_of(&["a"]).with_dead_connection_policy(DeadConnectionPolicy::StrictBackoff);
    let t0 = Instant::now();
    let a = pool.next_at(t0).unwrap();
    pool.on_failure_at(&a, t0);

    assert!(matches!(
        pool.next_at(t0 + Duration::from_secs(59)),
        Err(TransportError::NoConnectionAvailable)
    ));

    let resurrected = pool.next_at(t0 + Duration::from_secs(60)).unwrap();
    assert!(Arc::ptr_eq(&resurrected, &a));
}

#[test]
fn test_rebuild_replaces_set_and_resets_rotation() {
    let pool = pool_of(&["a", "b", "c"]);
    pool.next().unwrap();
    pool.next().unwrap();

    pool.rebuild(vec![conn("x"), conn("y")], Arc::new(RoundRobinSelector::new()));

    assert_eq!(pool.len(), 2);
    let hosts: Vec<String> =
        pool.urls().iter().map(|u| u.host_str().unwrap().to_string()).collect();
    assert_eq!(hosts, vec!["x", "y"]);
    assert_eq!(host(&pool.next().unwrap()), "x");
    assert_eq!(host(&pool.next().unwrap()), "y");
}

#[test]
fn test_reports_against_removed_connection_are_ignored() {
    let pool = pool_of(&["a"]);
    let stale = pool.next().unwrap();

    pool.rebuild(vec![conn("a")], Arc::new(RoundRobinSelector::new()));

    pool.on_failure(&stale);
    pool.on_success(&stale);
    assert_eq!(pool.health_of(&stale), None);

    let stats = pool.stats();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.dead, 0);
}

#[test]
fn test_stats_reports_dead_connections() {
    let pool = pool_of(&["a", "b"]);
    let t0 = Instant::now();
    let conns = pool.connections();
    pool.on_failure_at(&conns[1], t0);

    let stats = pool.stats_at(t0 + Duration::from_secs(20));
    assert_eq!(stats.total, 2);
    assert_eq!(stats.alive, 1);
    assert_eq!(stats.dead, 1);

    let dead = &stats.connections[1];
    assert!(dead.is_dead);
    assert_eq!(dead.failures, 1);
    assert!(dead.dead_since.is_some());
    assert_eq!(dead.resurrect_in_secs, Some(40));
    assert_eq!(stats.connections[0].resurrect_in_secs, None);
}

#[test]
fn test_concurrent_next_and_failures() {
    let pool = Arc::new(pool_of(&["a", "b", "c", "d"]));

    std::thread::scope(|s| {
        for worker in 0..8 {
            let pool = Arc::clone(&pool);
            s.spawn(move || {
                for i in 0..200 {
                    let c = pool.next().unwrap();
                    if (i + worker) % 7 == 0 {
                        pool.on_failure(&c);
                    } else {
                        pool.on_success(&c);
                    }
                }
            });
        }
    });

    let stats = pool.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.alive + stats.dead, 4);
    for status in &stats.connections {
        assert_eq!(status.is_dead, status.failures > 0);
        assert_eq!(status.is_dead, status.dead_since.is_some());
    }
}

#[test]
fn test_rebuild_is_atomic_for_concurrent_readers() {
    let old: Vec<&str> = vec!["old-1", "old-2", "old-3"];
    let new: Vec<&str> = vec!["new-1", "new-2"];
    let pool = Arc::new(pool_of(&old));

    std::thread::scope(|s| {
        let writer = Arc::clone(&pool);
        s.spawn(move || {
            for i in 0..500 {
                let hosts = if i % 2 == 0 { &new } else { &old };
                writer.rebuild(
                    hosts.iter().map(|h| conn(h)).collect(),
                    Arc::new(RoundRobinSelector::new()),
                );
            }
        });

        for _ in 0..4 {
            let reader = Arc::clone(&pool);
            s.spawn(move || {
                for _ in 0..500 {
                    let hosts: HashSet<String> = reader
                        .urls()
                        .iter()
                        .map(|u| u.host_str().unwrap().to_string())
                        .collect();
                    let all_old = hosts.iter().all(|h| h.starts_with("old-"));
                    let all_new = hosts.iter().all(|h| h.starts_with("new-"));
                    assert!(all_old || all_new, "observed mixed set: {hosts:?}");
                    assert!(hosts.len() == 3 || hosts.len() == 2);

                    reader.next().unwrap();
                }
            });
        }
    });
}
