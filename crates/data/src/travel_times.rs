//! Lazy travel-time matrix lookup and link-pace math.
//!
//! The matrix file is wide-format CSV: the first column is the origin stop
//! id, every other column header is a destination stop id, and cells hold
//! seconds (blank cells are simply absent from the matrix). It is loaded on
//! route selection only, on the IO task pool, and the poll system refuses to
//! commit a result that no longer matches the current selection.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};
use futures_lite::future;
use itertools::Itertools;

use crate::level::RefreshViews;
use crate::model::{Stop, TravelTimeMatrix};
use crate::state::DashboardState;
use crate::store::LoadError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Link pace (s/km) below which a segment counts as free-flowing; used as
/// the green anchor of the map's link scale.
pub const PACE_GREEN_S_PER_KM: f64 = 0.0;
/// Midpoint (yellow) anchor of the link pace scale.
pub const PACE_YELLOW_S_PER_KM: f64 = 300.0;
/// Pace at and beyond which a link renders fully red (clamped).
pub const PACE_RED_S_PER_KM: f64 = 600.0;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a wide-format travel-time matrix.
pub fn parse_travel_times<R: Read>(reader: R) -> Result<TravelTimeMatrix, LoadError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut matrix = TravelTimeMatrix::default();
    for record in csv_reader.records() {
        let record = record?;
        let Some(from) = record.get(0) else {
            continue;
        };
        for (index, cell) in record.iter().enumerate().skip(1) {
            let Some(to) = headers.get(index) else {
                continue;
            };
            if let Ok(seconds) = cell.trim().parse::<f64>() {
                matrix.insert(from, to, seconds);
            }
        }
    }
    Ok(matrix)
}

/// Load `dir/<station>/travel_times/<route>_travel_times.csv`.
pub fn load_route_travel_times(
    dir: &Path,
    station_code: &str,
    route_id: &str,
) -> Result<TravelTimeMatrix, LoadError> {
    let path = dir
        .join(station_code)
        .join("travel_times")
        .join(format!("{route_id}_travel_times.csv"));
    parse_travel_times(File::open(path)?)
}

// ---------------------------------------------------------------------------
// Link math
// ---------------------------------------------------------------------------

/// Haversine great-circle distance in kilometers.
pub fn great_circle_km(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let d_lat = (lat_b - lat_a).to_radians();
    let d_lng = (lng_b - lng_a).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Seconds-per-kilometer pace for a link. A degenerate distance with
/// nonzero travel time clamps to the red end of the scale.
pub fn link_pace_s_per_km(travel_seconds: f64, distance_km: f64) -> f64 {
    if distance_km < 1e-6 {
        return if travel_seconds > 0.0 {
            PACE_RED_S_PER_KM
        } else {
            PACE_GREEN_S_PER_KM
        };
    }
    travel_seconds / distance_km
}

/// Aggregate transit time along an ordered path. Pairs absent from the
/// matrix contribute zero rather than failing the computation.
pub fn route_transit_time_sec(path: &[(u32, &Stop)], matrix: &TravelTimeMatrix) -> f64 {
    path.iter()
        .tuple_windows()
        .filter_map(|((_, a), (_, b))| matrix.get(&a.stop_id, &b.stop_id))
        .sum()
}

// ---------------------------------------------------------------------------
// Lazy fetch
// ---------------------------------------------------------------------------

/// The single in-flight matrix fetch, keyed by the selection that requested
/// it. A newer selection replaces it; a result whose key no longer matches
/// the current selection is discarded.
pub struct TravelTimeFetch {
    pub station_code: String,
    pub route_id: String,
    pub task: Task<Result<TravelTimeMatrix, LoadError>>,
}

#[derive(Resource, Default)]
pub struct PendingTravelTimes(pub Option<TravelTimeFetch>);

/// Spawn the fetch for the current selection onto the IO pool.
pub fn spawn_travel_time_fetch(
    pending: &mut PendingTravelTimes,
    data_dir: &Path,
    station_code: &str,
    route_id: &str,
) {
    let dir: PathBuf = data_dir.to_path_buf();
    let station = station_code.to_string();
    let route = route_id.to_string();
    let task = IoTaskPool::get()
        .spawn(async move { load_route_travel_times(&dir, &station, &route) });
    pending.0 = Some(TravelTimeFetch {
        station_code: station_code.to_string(),
        route_id: route_id.to_string(),
        task,
    });
}

/// Commit a finished fetch if (and only if) it still matches the current
/// selection. Returns whether the state changed. A fetch error degrades to
/// `None`, and the route view renders without link coloring.
pub fn commit_travel_times(
    state: &mut DashboardState,
    station_code: &str,
    route_id: &str,
    result: Result<TravelTimeMatrix, LoadError>,
) -> bool {
    let current = state.selected_station.as_deref() == Some(station_code)
        && state.selected_route.as_deref() == Some(route_id);
    if !current {
        info!("discarding stale travel-time matrix for route {route_id} ({station_code})");
        return false;
    }
    state.route_travel_times = match result {
        Ok(matrix) => Some(matrix),
        Err(err) => {
            warn!("travel times unavailable for route {route_id}: {err}");
            None
        }
    };
    true
}

/// Poll the in-flight fetch and commit its result through the stale guard.
pub fn poll_travel_times(
    mut pending: ResMut<PendingTravelTimes>,
    mut state: ResMut<DashboardState>,
    mut refresh: EventWriter<RefreshViews>,
) {
    let Some(fetch) = pending.0.as_mut() else {
        return;
    };
    let Some(result) = block_on(future::poll_once(&mut fetch.task)) else {
        return;
    };
    let fetch = pending.0.take().expect("fetch checked above");
    if commit_travel_times(&mut state, &fetch.station_code, &fetch.route_id, result) {
        refresh.send(RefreshViews);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(stop_id: &str, lat: f64, lng: f64) -> Stop {
        Stop {
            route_id: "R1".to_string(),
            stop_id: stop_id.to_string(),
            lat,
            lng,
            zone_id: String::new(),
            kind: String::new(),
        }
    }

    #[test]
    fn test_parse_wide_matrix() {
        let raw = "from_stop,A,B,C\nA,0,120,\nB,130,0,240\n";
        let matrix = parse_travel_times(raw.as_bytes()).unwrap();
        assert_eq!(matrix.get("A", "B"), Some(120.0));
        assert_eq!(matrix.get("B", "C"), Some(240.0));
        // Blank cell stays absent.
        assert_eq!(matrix.get("A", "C"), None);
        assert_eq!(matrix.origin_count(), 2);
    }

    #[test]
    fn test_great_circle_one_degree_latitude() {
        // One degree of latitude is ~111.2 km everywhere.
        let km = great_circle_km(34.0, -118.0, 35.0, -118.0);
        assert!((km - 111.2).abs() < 1.0, "got {km}");
        assert_eq!(great_circle_km(34.0, -118.0, 34.0, -118.0), 0.0);
    }

    #[test]
    fn test_link_pace_degenerate_distance() {
        assert_eq!(link_pace_s_per_km(300.0, 0.0), PACE_RED_S_PER_KM);
        assert_eq!(link_pace_s_per_km(0.0, 0.0), PACE_GREEN_S_PER_KM);
        assert!((link_pace_s_per_km(600.0, 2.0) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_transit_time_missing_pairs_contribute_zero() {
        let a = stop("A", 34.0, -118.0);
        let b = stop("B", 34.1, -118.1);
        let c = stop("C", 34.2, -118.2);
        let path = vec![(1, &a), (2, &b), (3, &c)];

        let mut matrix = TravelTimeMatrix::default();
        matrix.insert("A", "B", 100.0);
        // B -> C absent: unknown, so it adds nothing.
        assert_eq!(route_transit_time_sec(&path, &matrix), 100.0);
        assert_eq!(route_transit_time_sec(&path, &TravelTimeMatrix::default()), 0.0);
    }

    #[test]
    fn test_commit_rejects_stale_result() {
        let mut state = DashboardState::default();
        state.selected_station = Some("DAU1".to_string());
        state.selected_route = Some("R2".to_string());

        // Result for a route the user has already left.
        let committed =
            commit_travel_times(&mut state, "DAU1", "R1", Ok(TravelTimeMatrix::default()));
        assert!(!committed);
        assert!(state.route_travel_times.is_none());

        let committed =
            commit_travel_times(&mut state, "DAU1", "R2", Ok(TravelTimeMatrix::default()));
        assert!(committed);
        assert!(state.route_travel_times.is_some());
    }

    #[test]
    fn test_commit_degrades_on_fetch_error() {
        let mut state = DashboardState::default();
        state.selected_station = Some("DAU1".to_string());
        state.selected_route = Some("R1".to_string());
        let err = LoadError::Io(std::io::Error::other("disk on fire"));
        assert!(commit_travel_times(&mut state, "DAU1", "R1", Err(err)));
        assert!(state.route_travel_times.is_none());
    }
}
