//! Unit tests for ev-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ArcId, NodeId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::from_index(42), id);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(ArcId::INVALID.0, u32::MAX);
        assert!(!NodeId::default().is_valid());
        assert!(NodeId(0).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn planar_distance_is_euclidean_in_degrees() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(3.0, 4.0);
        assert_eq!(a.planar_distance(b), 5.0);
        assert_eq!(a.planar_distance_2(b), 25.0);
    }

    #[test]
    fn validity() {
        assert!(GeoPoint::new(-12.119, -77.021).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
    }
}

#[cfg(test)]
mod weight {
    use std::cmp::Ordering;

    use crate::Weight;

    #[test]
    fn float_weights() {
        assert_eq!(<f64 as Weight>::ZERO, 0.0);
        assert!(!<f64 as Weight>::UNREACHABLE.is_finite());
        assert_eq!(Weight::plus(1.5f64, 2.0), 3.5);
        assert!(Weight::cheaper_than(&1.0f64, &2.0));
        assert!(!Weight::cheaper_than(&2.0f64, &2.0));
        assert!(!Weight::is_usable(f64::NAN));
        assert!(!Weight::is_usable(-1.0f64));
    }

    #[test]
    fn integer_weights_saturate() {
        assert_eq!(Weight::plus(u32::MAX - 1, 5), u32::MAX);
        assert_eq!(Weight::total_cmp(&3u32, &4u32), Ordering::Less);
        assert_eq!(<u32 as Weight>::from_f64(2.9), 2);
        assert_eq!(<u32 as Weight>::from_f64(-1.0), 0);
    }
}

#[cfg(test)]
mod rng {
    use crate::PivotRng;

    #[test]
    fn same_seed_same_sample() {
        let a = PivotRng::new(7).sample_indices(1_000, 25);
        let b = PivotRng::new(7).sample_indices(1_000, 25);
        assert_eq!(a, b);
    }

    #[test]
    fn sample_is_sorted_and_distinct() {
        let s = PivotRng::new(1).sample_indices(200, 50);
        assert_eq!(s.len(), 50);
        assert!(s.windows(2).all(|w| w[0] < w[1]));
        assert!(s.iter().all(|&i| i < 200));
    }

    #[test]
    fn oversized_sample_returns_everything() {
        assert_eq!(PivotRng::new(3).sample_indices(4, 10), vec![0, 1, 2, 3]);
    }

    #[test]
    fn children_diverge() {
        let mut root = PivotRng::new(99);
        let a = root.child(0).sample_indices(10_000, 5);
        let b = root.child(1).sample_indices(10_000, 5);
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod config {
    use crate::{CoreError, EngineConfig};

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_speed_kmh, 30.0);
        assert_eq!(cfg.risk_factor, 2.0);
        assert_eq!(cfg.poll_interval().as_millis(), 100);
    }

    #[test]
    fn rejects_non_positive_speed() {
        let cfg = EngineConfig { default_speed_kmh: 0.0, ..EngineConfig::default() };
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn rejects_zero_capacity_queue() {
        let cfg = EngineConfig { queue_capacity: Some(0), ..EngineConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
