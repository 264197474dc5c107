//! Pie-chart aggregation and level-scoped populations.
//!
//! Aggregations never silently drop records: routes with unrecognized
//! scores bucket as `"UNKNOWN"`, packages bucket into exactly
//! `DELIVERED` / `OTHER`. Zero-count categories are dropped from the pie
//! data, and the departure chart additionally suppresses slivers below a
//! minimum share so labels stay readable.

use crate::model::{Package, Route, RouteScore};
use crate::state::{DashboardState, Level};
use crate::store::DataStore;

/// Minimum share (percent) a departure-time slice needs to be drawn.
pub const DEPARTURE_SLIVER_PERCENT: f64 = 0.5;

/// One two-hour clock bucket for departure times. `start > end` marks the
/// interval that wraps past midnight.
pub struct TimeInterval {
    pub label: &'static str,
    pub start: u32,
    pub end: u32,
}

/// The twelve departure buckets, starting at the 5 AM wave.
pub const TIME_INTERVALS: [TimeInterval; 12] = [
    TimeInterval { label: "5-7AM", start: 5, end: 7 },
    TimeInterval { label: "7-9AM", start: 7, end: 9 },
    TimeInterval { label: "9-11AM", start: 9, end: 11 },
    TimeInterval { label: "11-1PM", start: 11, end: 13 },
    TimeInterval { label: "1-3PM", start: 13, end: 15 },
    TimeInterval { label: "3-5PM", start: 15, end: 17 },
    TimeInterval { label: "5-7PM", start: 17, end: 19 },
    TimeInterval { label: "7-9PM", start: 19, end: 21 },
    TimeInterval { label: "9-11PM", start: 21, end: 23 },
    TimeInterval { label: "11-1AM", start: 23, end: 1 },
    TimeInterval { label: "1-3AM", start: 1, end: 3 },
    TimeInterval { label: "3-5AM", start: 3, end: 5 },
];

impl TimeInterval {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start < self.end {
            hour >= self.start && hour < self.end
        } else {
            // Wraparound interval spanning midnight.
            hour >= self.start || hour < self.end
        }
    }
}

/// Index into [`TIME_INTERVALS`] for an hour of day.
pub fn departure_interval_index(hour: u32) -> Option<usize> {
    TIME_INTERVALS.iter().position(|t| t.contains(hour))
}

/// One slice of prepared pie data.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: u64,
    pub percent: f64,
}

/// Turn labeled counts into drawable slices: zero counts are dropped, and
/// slices under `threshold_percent` of the total are suppressed.
pub fn build_pie_slices(counts: &[(String, u64)], threshold_percent: f64) -> Vec<PieSlice> {
    let total: u64 = counts.iter().map(|(_, v)| v).sum();
    counts
        .iter()
        .filter(|(_, value)| *value > 0)
        .map(|(label, value)| PieSlice {
            label: label.clone(),
            value: *value,
            percent: if total > 0 {
                *value as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
        .filter(|slice| slice.percent >= threshold_percent)
        .collect()
}

/// Route-score counts in display order (High, Medium, Low, UNKNOWN).
pub fn score_counts<'a>(routes: impl Iterator<Item = &'a Route>) -> Vec<(String, u64)> {
    let order = [
        RouteScore::High,
        RouteScore::Medium,
        RouteScore::Low,
        RouteScore::Unknown,
    ];
    let mut counts = [0u64; 4];
    for route in routes {
        let slot = order
            .iter()
            .position(|s| *s == route.score)
            .unwrap_or(order.len() - 1);
        counts[slot] += 1;
    }
    order
        .iter()
        .zip(counts)
        .map(|(score, count)| (score.label().to_string(), count))
        .collect()
}

/// Departure-time counts in [`TIME_INTERVALS`] order. Routes without a
/// parseable departure hour are omitted (there is no bucket to place them
/// in); this only affects the departure chart.
pub fn departure_counts<'a>(routes: impl Iterator<Item = &'a Route>) -> Vec<(String, u64)> {
    let mut counts = [0u64; TIME_INTERVALS.len()];
    for route in routes {
        if let Some(index) = route.departure_hour().and_then(departure_interval_index) {
            counts[index] += 1;
        }
    }
    TIME_INTERVALS
        .iter()
        .zip(counts)
        .map(|(interval, count)| (interval.label.to_string(), count))
        .collect()
}

/// Binary delivered / other package counts. Explicit bucketing, nothing
/// dropped.
pub fn delivered_counts<'a>(packages: impl Iterator<Item = &'a Package>) -> Vec<(String, u64)> {
    let mut delivered = 0u64;
    let mut other = 0u64;
    for package in packages {
        if package.is_delivered() {
            delivered += 1;
        } else {
            other += 1;
        }
    }
    vec![
        ("DELIVERED".to_string(), delivered),
        ("OTHER".to_string(), other),
    ]
}

// ---------------------------------------------------------------------------
// Level-scoped populations
// ---------------------------------------------------------------------------

/// The routes a chart aggregates over at the given level: the whole network
/// at Nation, the filtered set at Station, the selection at Route.
pub fn routes_for_level<'a>(
    level: Level,
    store: &'a DataStore,
    state: &'a DashboardState,
) -> Vec<&'a Route> {
    match level {
        Level::Nation => store.all_routes().collect(),
        Level::Station => state.filtered_routes.iter().collect(),
        Level::Route => state.selected_route_record().into_iter().collect(),
    }
}

/// The packages a chart aggregates over: all packages at Nation, the
/// filtered routes' packages at Station, the selected route's at Route.
pub fn packages_for_level<'a>(
    level: Level,
    store: &'a DataStore,
    state: &'a DashboardState,
) -> Vec<&'a Package> {
    match level {
        Level::Nation => store.all_packages().collect(),
        Level::Station => {
            let Some(detail) = state
                .selected_station
                .as_deref()
                .and_then(|code| store.station(code))
            else {
                return Vec::new();
            };
            detail
                .packages
                .iter()
                .filter(|p| {
                    state
                        .filtered_routes
                        .iter()
                        .any(|r| r.route_id == p.route_id)
                })
                .collect()
        }
        Level::Route => state.route_packages.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, score: RouteScore, departure: &str) -> Route {
        Route {
            route_id: id.to_string(),
            station_code: "A1".to_string(),
            date: None,
            departure_time_utc: departure.to_string(),
            executor_capacity_cm3: 0.0,
            score,
            total_service_time_sec: None,
            total_transit_time_sec: None,
        }
    }

    fn package(id: &str, status: &str) -> Package {
        Package {
            package_id: id.to_string(),
            route_id: "R1".to_string(),
            stop_id: "A".to_string(),
            scan_status: status.to_string(),
            planned_service_time_seconds: 0.0,
            time_window_start_utc: String::new(),
            time_window_end_utc: String::new(),
            depth_cm: 0.0,
            height_cm: 0.0,
            width_cm: 0.0,
        }
    }

    #[test]
    fn test_score_counts_bucket_unknown_without_drops() {
        let routes = vec![
            route("R1", RouteScore::High, "06:00:00"),
            route("R2", RouteScore::High, "06:00:00"),
            route("R3", RouteScore::Unknown, "06:00:00"),
        ];
        let counts = score_counts(routes.iter());
        let total: u64 = counts.iter().map(|(_, v)| v).sum();
        assert_eq!(total, routes.len() as u64, "no silent drops");
        assert!(counts.contains(&("UNKNOWN".to_string(), 1)));
        assert!(counts.contains(&("High".to_string(), 2)));
    }

    #[test]
    fn test_filtered_high_scenario_pie() {
        // Filtering [High, High, Low] for {High} then aggregating gives
        // exactly {High: 2}.
        let filtered = vec![
            route("R1", RouteScore::High, "06:00:00"),
            route("R2", RouteScore::High, "06:00:00"),
        ];
        let slices = build_pie_slices(&score_counts(filtered.iter()), 0.0);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "High");
        assert_eq!(slices[0].value, 2);
        assert!((slices[0].percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_departure_wraparound_bucket() {
        assert_eq!(departure_interval_index(23), Some(9));
        assert_eq!(departure_interval_index(0), Some(9));
        assert_eq!(departure_interval_index(1), Some(10));
        assert_eq!(departure_interval_index(5), Some(0));
        assert_eq!(departure_interval_index(12), Some(3));
    }

    #[test]
    fn test_departure_counts_skip_unparseable() {
        let routes = vec![
            route("R1", RouteScore::High, "23:30:00"),
            route("R2", RouteScore::High, "00:10:00"),
            route("R3", RouteScore::High, "nonsense"),
        ];
        let counts = departure_counts(routes.iter());
        assert_eq!(counts[9], ("11-1AM".to_string(), 2));
        let total: u64 = counts.iter().map(|(_, v)| v).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_delivered_binary_bucketing_is_exhaustive() {
        let packages = vec![
            package("P1", "DELIVERED"),
            package("P2", "DELIVERED"),
            package("P3", "REJECTED"),
            package("P4", ""),
        ];
        let counts = delivered_counts(packages.iter());
        let total: u64 = counts.iter().map(|(_, v)| v).sum();
        assert_eq!(total, packages.len() as u64);
        assert_eq!(counts[0], ("DELIVERED".to_string(), 2));
        assert_eq!(counts[1], ("OTHER".to_string(), 2));
    }

    #[test]
    fn test_pie_slices_drop_zero_and_slivers() {
        let counts = vec![
            ("big".to_string(), 995),
            ("tiny".to_string(), 4),
            ("sliver".to_string(), 1),
            ("empty".to_string(), 0),
        ];
        let slices = build_pie_slices(&counts, DEPARTURE_SLIVER_PERCENT);
        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        // 0.1% sliver and the zero bucket disappear; 0.4% -> 0.4 < 0.5 gone too.
        assert_eq!(labels, ["big"]);

        let slices = build_pie_slices(&counts, 0.0);
        let labels: Vec<&str> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["big", "tiny", "sliver"]);
    }
}
