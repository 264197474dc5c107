//! Ordered stop-path resolution for a route.
//!
//! The actual-sequence table defines visiting order, but load order carries
//! no guarantee, so entries are sorted by `sequence_order` before the join.
//! Sequence entries pointing at stops that don't exist are skipped (missing
//! join target), and a path with fewer than two resolved stops is not
//! drawable.

use std::collections::HashMap;

use itertools::Itertools;

use crate::model::{SequenceEntry, Stop};

/// Minimum number of resolved stops for a route path to be drawable.
pub const MIN_PATH_STOPS: usize = 2;

/// Resolve a route's stops in visiting order, as `(sequence_order, stop)`
/// pairs. Missing stops are skipped silently.
pub fn ordered_route_stops<'a>(
    route_id: &str,
    sequences: &[SequenceEntry],
    stops: &'a [Stop],
) -> Vec<(u32, &'a Stop)> {
    let by_id: HashMap<&str, &Stop> = stops
        .iter()
        .filter(|s| s.route_id == route_id)
        .map(|s| (s.stop_id.as_str(), s))
        .collect();

    sequences
        .iter()
        .filter(|seq| seq.route_id == route_id)
        .sorted_by_key(|seq| seq.sequence_order)
        .filter_map(|seq| Some((seq.sequence_order, *by_id.get(seq.stop_id.as_str())?)))
        .collect()
}

/// Like [`ordered_route_stops`], but `None` when the path is too short to
/// draw as a polyline.
pub fn drawable_path<'a>(
    route_id: &str,
    sequences: &[SequenceEntry],
    stops: &'a [Stop],
) -> Option<Vec<(u32, &'a Stop)>> {
    let path = ordered_route_stops(route_id, sequences, stops);
    (path.len() >= MIN_PATH_STOPS).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(route_id: &str, stop_id: &str) -> Stop {
        Stop {
            route_id: route_id.to_string(),
            stop_id: stop_id.to_string(),
            lat: 0.0,
            lng: 0.0,
            zone_id: String::new(),
            kind: String::new(),
        }
    }

    fn seq(route_id: &str, stop_id: &str, order: u32) -> SequenceEntry {
        SequenceEntry {
            route_id: route_id.to_string(),
            stop_id: stop_id.to_string(),
            sequence_order: order,
        }
    }

    #[test]
    fn test_path_sorted_by_sequence_order() {
        let stops = vec![stop("R1", "A"), stop("R1", "B"), stop("R1", "C")];
        // Loaded out of order: [3, 1, 2].
        let sequences = vec![seq("R1", "C", 3), seq("R1", "A", 1), seq("R1", "B", 2)];
        let path = ordered_route_stops("R1", &sequences, &stops);
        let ids: Vec<&str> = path.iter().map(|(_, s)| s.stop_id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert_eq!(path[0].0, 1);
    }

    #[test]
    fn test_missing_stops_are_skipped() {
        let stops = vec![stop("R1", "A")];
        let sequences = vec![seq("R1", "A", 1), seq("R1", "GONE", 2)];
        let path = ordered_route_stops("R1", &sequences, &stops);
        assert_eq!(path.len(), 1);
        // One resolved stop is below the drawable minimum.
        assert!(drawable_path("R1", &sequences, &stops).is_none());
    }

    #[test]
    fn test_stop_identity_is_route_scoped() {
        // "A" exists on both routes at different coordinates.
        let mut other = stop("R2", "A");
        other.lat = 50.0;
        let stops = vec![stop("R1", "A"), stop("R1", "B"), other];
        let sequences = vec![seq("R1", "A", 1), seq("R1", "B", 2)];
        let path = drawable_path("R1", &sequences, &stops).unwrap();
        assert_eq!(path[0].1.lat, 0.0);
    }
}
