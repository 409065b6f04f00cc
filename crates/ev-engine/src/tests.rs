//! Unit tests for ev-engine.

#[cfg(test)]
mod fixture {
    use ev_core::EngineConfig;
    use ev_spatial::{RawEdge, RawNode, SafePoint};

    use crate::Session;

    /// ```text
    ///   1 ──── 2 ──── 3 ◄ Norte
    ///   │             │
    ///   4 ─────────── 5
    ///   │ (one-way ↓)
    ///   6
    /// Sur ► 4
    /// ```
    ///
    /// 1–4 is highly vulnerable, so from 1 the cheapest safe point is Norte.
    /// Nodes 7–8 form a separate fragment and are discarded.
    pub fn records() -> (Vec<RawNode>, Vec<RawEdge>, Vec<SafePoint>) {
        let nodes = vec![
            RawNode::new(1, 0.000, 0.000),
            RawNode::new(2, 0.000, 0.010),
            RawNode::new(3, 0.000, 0.020),
            RawNode::new(4, 0.010, 0.000),
            RawNode::new(5, 0.010, 0.020),
            RawNode::new(6, 0.020, 0.000),
            RawNode::new(7, 1.000, 1.000),
            RawNode::new(8, 1.000, 1.010),
        ];
        let edges = vec![
            RawEdge::new(1, 2, 1_000.0),
            RawEdge::new(2, 3, 1_000.0),
            RawEdge::new(1, 4, 1_000.0).with_vulnerability(1.0),
            RawEdge::new(4, 5, 2_000.0),
            RawEdge::new(3, 5, 1_000.0).with_speed(60.0),
            RawEdge::new(4, 6, 500.0).one_way(),
            RawEdge::new(7, 8, 100.0),
        ];
        let safe = vec![
            SafePoint::new(0.0, 0.0201, "Norte"),
            SafePoint::new(0.0101, 0.0, "Sur"),
            SafePoint::new(f64::NAN, 0.0, "Sin coordenadas"),
        ];
        (nodes, edges, safe)
    }

    pub fn session() -> Session {
        let (nodes, edges, safe) = records();
        Session::load(&nodes, &edges, &safe, &EngineConfig::default()).unwrap()
    }
}

// ── Session loading ───────────────────────────────────────────────────────────

#[cfg(test)]
mod load {
    use ev_core::EngineConfig;

    use super::fixture::{records, session};
    use crate::{EngineError, Session};

    #[test]
    fn report_counts() {
        let s = session();
        let r = s.report();
        assert_eq!(r.node_count, 6);
        assert_eq!(r.edge_count, 6);
        assert_eq!(r.arc_count, 11);
        assert_eq!(r.usable_safe_points, 2);
        assert_eq!(r.discarded_safe_points, 1);
        assert_eq!(r.stats.discarded_nodes, 2);
        assert_eq!(s.network().component_count(), 1);
    }

    #[test]
    fn safe_points_keep_load_order() {
        let s = session();
        let names: Vec<&str> = s.safe_points().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Norte", "Sur"]);
    }

    #[test]
    fn empty_input_is_a_data_error() {
        let r = Session::load(&[], &[], &[], &EngineConfig::default());
        assert!(matches!(r, Err(EngineError::Data(_))));
    }

    #[test]
    fn bad_config_is_rejected() {
        let (nodes, edges, safe) = records();
        let cfg = EngineConfig { risk_factor: -1.0, ..EngineConfig::default() };
        let r = Session::load(&nodes, &edges, &safe, &cfg);
        assert!(matches!(r, Err(EngineError::Config(_))));
    }

    #[test]
    fn risk_factor_flows_into_costs() {
        let (nodes, edges, safe) = records();
        let cfg = EngineConfig { risk_factor: 0.0, ..EngineConfig::default() };
        let s = Session::load(&nodes, &edges, &safe, &cfg).unwrap();
        // Without the risk penalty 1–4 costs 2 minutes.
        let r = s.find_route(ev_core::GeoPoint::new(0.0, 0.0), Default::default()).unwrap();
        assert_eq!(r.destination.name, "Sur");
        assert!((r.cost - 2.0).abs() < 1e-9);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod route {
    use ev_core::GeoPoint;
    use ev_spatial::Algorithm;

    use super::fixture::session;
    use crate::EngineError;

    #[test]
    fn cheapest_safe_point_wins() {
        let s = session();
        for alg in Algorithm::ALL {
            let r = s.find_route(GeoPoint::new(0.0001, 0.0), alg).unwrap();
            assert_eq!(r.destination.name, "Norte", "{alg}");
            assert_eq!(r.algorithm, alg);
            // 1 → 2 → 3: two 1 km segments at 30 km/h.
            assert!((r.cost - 4.0).abs() < 1e-9, "{alg}: {}", r.cost);
            let ids: Vec<i64> = r.nodes.iter().map(|&n| s.network().external_id(n)).collect();
            assert_eq!(ids, vec![1, 2, 3]);
            assert_eq!(s.network().external_id(r.destination_node()), 3);
        }
    }

    #[test]
    fn origin_on_safe_point_costs_nothing() {
        let s = session();
        for alg in Algorithm::ALL {
            let r = s.find_route(GeoPoint::new(0.0099, 0.0), alg).unwrap();
            assert_eq!(r.destination.name, "Sur");
            assert_eq!(r.cost, 0.0);
            assert_eq!(r.nodes.len(), 1);
        }
    }

    #[test]
    fn dead_end_origin_has_no_route() {
        // Node 6 is only reachable through the one-way 4 → 6.
        let s = session();
        let six = s.network().node_by_external(6).unwrap();
        for alg in Algorithm::ALL {
            let r = s.find_route(GeoPoint::new(0.02, 0.0), alg);
            match r {
                Err(EngineError::NoRouteFound { origin }) => assert_eq!(origin, six),
                other => panic!("{alg}: {other:?}"),
            }
        }
    }

    #[test]
    fn non_finite_origin_is_invalid() {
        let s = session();
        let r = s.find_route(GeoPoint::new(f64::NAN, 0.0), Algorithm::Dijkstra);
        assert!(matches!(r, Err(EngineError::InvalidCoordinate(_))));
    }

    #[test]
    fn repeated_queries_are_identical() {
        let s = session();
        let origin = GeoPoint::new(0.011, 0.019);
        for alg in Algorithm::ALL {
            let a = s.find_route(origin, alg).unwrap();
            let b = s.find_route(origin, alg).unwrap();
            assert_eq!(a.nodes, b.nodes);
            assert_eq!(a.cost, b.cost);
            assert_eq!(a.destination, b.destination);
        }
    }

    #[test]
    fn path_coords_follow_nodes() {
        let s = session();
        let r = s.find_route(GeoPoint::new(0.0, 0.0), Algorithm::AStar).unwrap();
        let coords = s.path_coords(&r);
        assert_eq!(coords.len(), r.nodes.len());
        assert_eq!(coords[0], GeoPoint::new(0.0, 0.0));
        assert_eq!(coords[coords.len() - 1], GeoPoint::new(0.0, 0.02));
        assert_eq!(r.origin_node(), r.nodes[0]);
    }
}

// ── Critical nodes ────────────────────────────────────────────────────────────

#[cfg(test)]
mod critical {
    use super::fixture::session;

    #[test]
    fn ranking_is_truncated_and_sorted() {
        let s = session();
        let r = s.find_critical_nodes(3, None).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.pivots, 6);
        assert!(r.nodes.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(r.nodes[0].score > 0.0);
    }

    #[test]
    fn dead_end_scores_zero() {
        // 6 hangs off 4, so every path to 6 crosses 4 and none crosses 6.
        let s = session();
        let r = s.find_critical_nodes(6, None).unwrap();
        let score = |id: i64| r.nodes.iter().find(|c| c.external_id == id).unwrap().score;
        assert_eq!(score(6), 0.0);
        assert!(score(4) > score(2));
        assert!(score(2) > score(1));
    }

    #[test]
    fn sampled_ranking_is_repeatable() {
        let s = session();
        let a = s.find_critical_nodes(6, Some(3)).unwrap();
        let b = s.find_critical_nodes(6, Some(3)).unwrap();
        assert_eq!(a.pivots, 3);
        assert_eq!(a.nodes, b.nodes);
    }
}

// ── Task queue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queue {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use ev_core::{EngineConfig, GeoPoint, NodeId};
    use ev_spatial::Algorithm;

    use super::fixture::{records, session};
    use crate::{EngineError, Supersede, TaskKind, TaskOutcome, TaskQueue, Ticket};

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn load_then_route() {
        let q = TaskQueue::new(&EngineConfig::default()).unwrap();
        let (nodes, edges, safe) = records();
        let t = q.spawn_load(nodes, edges, safe, EngineConfig::default()).unwrap();

        let session = match q.wait_next(WAIT) {
            Some(TaskOutcome::Loaded { ticket, result }) => {
                assert_eq!(ticket, t);
                result.unwrap()
            }
            other => panic!("unexpected {other:?}"),
        };
        assert!(!q.is_loading());

        let t2 = q.spawn_route(Arc::clone(&session), GeoPoint::new(0.0, 0.0), Algorithm::Dijkstra)
            .unwrap();
        assert!(t2 > t);
        match q.wait_next(WAIT) {
            Some(TaskOutcome::Routed { ticket, result }) => {
                assert_eq!(ticket, t2);
                assert_eq!(result.unwrap().destination.name, "Norte");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn second_load_is_refused() {
        let q = TaskQueue::new(&EngineConfig::default()).unwrap();
        let held = q.loading.acquire().unwrap();
        assert!(q.is_loading());
        let (nodes, edges, safe) = records();
        let r = q.spawn_load(nodes, edges, safe, EngineConfig::default());
        assert!(matches!(r, Err(EngineError::AlreadyLoading)));
        drop(held);
        assert!(!q.is_loading());
        assert!(q.loading.acquire().is_some());
    }

    #[test]
    fn failed_load_is_delivered() {
        let q = TaskQueue::new(&EngineConfig::default()).unwrap();
        q.spawn_load(vec![], vec![], vec![], EngineConfig::default()).unwrap();
        match q.wait_next(WAIT) {
            Some(TaskOutcome::Loaded { result, .. }) => {
                assert!(matches!(result, Err(EngineError::Data(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn drain_collects_every_outcome() {
        let cfg = EngineConfig { queue_capacity: Some(1), poll_interval_ms: 5, ..EngineConfig::default() };
        let q = TaskQueue::new(&cfg).unwrap();
        let s = Arc::new(session());
        let a = q.spawn_route(Arc::clone(&s), GeoPoint::new(0.0, 0.0), Algorithm::AStar).unwrap();
        let b = q.spawn_critical(Arc::clone(&s), 2, None).unwrap();

        let mut got = Vec::new();
        let deadline = Instant::now() + WAIT;
        while got.len() < 2 && Instant::now() < deadline {
            got.extend(q.drain());
            std::thread::sleep(q.poll_interval());
        }
        let mut tickets: Vec<Ticket> = got.iter().map(TaskOutcome::ticket).collect();
        tickets.sort();
        assert_eq!(tickets, vec![a, b]);
        assert!(got.iter().all(TaskOutcome::is_ok));
        assert!(q.drain().is_empty());
    }

    #[test]
    fn wait_next_times_out_when_idle() {
        let q = TaskQueue::new(&EngineConfig::default()).unwrap();
        assert!(q.wait_next(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = EngineConfig { queue_capacity: Some(0), ..EngineConfig::default() };
        assert!(matches!(TaskQueue::new(&cfg), Err(EngineError::Config(_))));
    }

    fn routed(n: u64) -> TaskOutcome {
        TaskOutcome::Routed {
            ticket: Ticket(n),
            result: Err(EngineError::NoRouteFound { origin: NodeId(0) }),
        }
    }

    #[test]
    fn supersede_drops_late_results() {
        let mut s = Supersede::new();
        assert!(s.accept(&routed(2)));
        assert!(!s.accept(&routed(1)));
        assert!(s.accept(&routed(5)));
        assert_eq!(s.newest(TaskKind::Route), Some(Ticket(5)));
        assert_eq!(s.newest(TaskKind::Critical), None);

        let ranked = TaskOutcome::Ranked {
            ticket: Ticket(3),
            result: Err(EngineError::AlreadyLoading),
        };
        assert!(s.accept(&ranked));
        assert_eq!(ranked.kind(), TaskKind::Critical);
    }
}
