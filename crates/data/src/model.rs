//! Domain model for the delivery network.
//!
//! All records are immutable once loaded. Identity rules worth keeping in
//! mind: routes are globally unique by `route_id`, but stop identity is
//! scoped to `(route_id, stop_id)`: the same `stop_id` can appear on
//! several routes.

use std::collections::HashMap;

use chrono::NaiveDate;

/// Scan status value marking a successfully delivered package; everything
/// else buckets as "OTHER" in the delivery pie.
pub const SCAN_DELIVERED: &str = "DELIVERED";

/// Route quality score. Source strings outside the known set parse to
/// [`RouteScore::Unknown`] and are bucketed as `"UNKNOWN"` in aggregation,
/// never dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteScore {
    High,
    Medium,
    Low,
    Unknown,
}

impl RouteScore {
    /// The scores the filter panel exposes as checkboxes.
    pub const KNOWN: [RouteScore; 3] = [RouteScore::High, RouteScore::Medium, RouteScore::Low];

    pub fn parse(raw: &str) -> Self {
        match raw {
            "High" => RouteScore::High,
            "Medium" => RouteScore::Medium,
            "Low" => RouteScore::Low,
            _ => RouteScore::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RouteScore::High => "High",
            RouteScore::Medium => "Medium",
            RouteScore::Low => "Low",
            RouteScore::Unknown => "UNKNOWN",
        }
    }
}

/// One depot station, aggregated for the nation view.
#[derive(Debug, Clone)]
pub struct Station {
    pub code: String,
    /// Arithmetic-mean centroid of the station's stops; falls back to the
    /// continental default when the station has no stops.
    pub lat: f64,
    pub lng: f64,
    pub total_routes: usize,
}

/// One vehicle's delivery run for a given date.
#[derive(Debug, Clone)]
pub struct Route {
    pub route_id: String,
    pub station_code: String,
    /// `None` when the source date failed to parse; such routes fail the
    /// date filter rather than being compared as strings.
    pub date: Option<NaiveDate>,
    pub departure_time_utc: String,
    pub executor_capacity_cm3: f64,
    pub score: RouteScore,
    /// Joined from the global metrics table; `None` means "no data",
    /// never zero.
    pub total_service_time_sec: Option<f64>,
    pub total_transit_time_sec: Option<f64>,
}

impl Route {
    /// Hour-of-day (0..24) parsed from `departure_time_utc` ("HH:MM:SS").
    pub fn departure_hour(&self) -> Option<u32> {
        let hour: u32 = self.departure_time_utc.split(':').next()?.parse().ok()?;
        (hour < 24).then_some(hour)
    }
}

/// One delivery location visited by a route.
#[derive(Debug, Clone)]
pub struct Stop {
    pub route_id: String,
    pub stop_id: String,
    pub lat: f64,
    pub lng: f64,
    pub zone_id: String,
    pub kind: String,
}

/// Visiting-order entry; must be sorted by `sequence_order` before use
/// (load order carries no guarantee).
#[derive(Debug, Clone)]
pub struct SequenceEntry {
    pub route_id: String,
    pub stop_id: String,
    pub sequence_order: u32,
}

/// One package assigned to a stop on a route.
#[derive(Debug, Clone)]
pub struct Package {
    pub package_id: String,
    pub route_id: String,
    pub stop_id: String,
    pub scan_status: String,
    pub planned_service_time_seconds: f64,
    pub time_window_start_utc: String,
    pub time_window_end_utc: String,
    pub depth_cm: f64,
    pub height_cm: f64,
    pub width_cm: f64,
}

impl Package {
    pub fn is_delivered(&self) -> bool {
        self.scan_status == SCAN_DELIVERED
    }
}

/// Everything preloaded for one station.
#[derive(Debug, Clone, Default)]
pub struct StationDetail {
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub sequences: Vec<SequenceEntry>,
    pub packages: Vec<Package>,
}

/// Pairwise transit durations between the stops of a single route, loaded
/// lazily when the route is selected. Sparse: absent pairs mean "unknown".
#[derive(Debug, Clone, Default)]
pub struct TravelTimeMatrix {
    times: HashMap<String, HashMap<String, f64>>,
}

impl TravelTimeMatrix {
    pub fn insert(&mut self, from: &str, to: &str, seconds: f64) {
        self.times
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), seconds);
    }

    /// Seconds from `from` to `to`, or `None` when the pair is absent.
    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        self.times.get(from)?.get(to).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of origin stops with at least one recorded duration.
    pub fn origin_count(&self) -> usize {
        self.times.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_score_parse_unknown_bucket() {
        assert_eq!(RouteScore::parse("High"), RouteScore::High);
        assert_eq!(RouteScore::parse("Poor"), RouteScore::Unknown);
        assert_eq!(RouteScore::parse(""), RouteScore::Unknown);
        assert_eq!(RouteScore::Unknown.label(), "UNKNOWN");
    }

    #[test]
    fn test_departure_hour_parsing() {
        let mut route = Route {
            route_id: "R1".into(),
            station_code: "DAU1".into(),
            date: None,
            departure_time_utc: "15:32:00".into(),
            executor_capacity_cm3: 0.0,
            score: RouteScore::High,
            total_service_time_sec: None,
            total_transit_time_sec: None,
        };
        assert_eq!(route.departure_hour(), Some(15));

        route.departure_time_utc = "garbage".into();
        assert_eq!(route.departure_hour(), None);

        route.departure_time_utc = "25:00:00".into();
        assert_eq!(route.departure_hour(), None);
    }

    #[test]
    fn test_travel_time_matrix_sparse_lookup() {
        let mut matrix = TravelTimeMatrix::default();
        matrix.insert("A", "B", 120.0);
        assert_eq!(matrix.get("A", "B"), Some(120.0));
        assert_eq!(matrix.get("A", "C"), None);
        assert_eq!(matrix.get("B", "A"), None);
        assert_eq!(matrix.origin_count(), 1);
    }
}
