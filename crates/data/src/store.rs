//! The preloaded, immutable data store.
//!
//! [`preload_all`] loads every station concurrently on the IO task pool and
//! joins the shared route-metrics table into each route. A failure in one
//! station's files omits that station and records the error; it never aborts
//! the other stations. The shared metrics and borders files degrade on
//! failure (no time fields / no background) instead of failing the load.
//!
//! Travel-time matrices are deliberately *not* part of the preload; see
//! [`crate::travel_times`] for the lazy per-route fetch.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, TaskPool};
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;

use crate::borders::{parse_borders, BorderSet};
use crate::config::{DEFAULT_STATION_LAT, DEFAULT_STATION_LNG};
use crate::model::{Package, Route, RouteScore, SequenceEntry, Station, StationDetail, Stop};

/// Everything the Data Store can fail at while reading the data tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv decode error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Precomputed per-route totals joined from `route_time_metrics.csv`.
/// Absent values stay `None` ("no data"), never zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteMetrics {
    pub total_service_time_sec: Option<f64>,
    pub total_transit_time_sec: Option<f64>,
}

// ---------------------------------------------------------------------------
// Raw CSV records
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RouteRecord {
    route_id: String,
    station_code: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    departure_time_utc: String,
    #[serde(default)]
    executor_capacity_cm3: Option<f64>,
    #[serde(default)]
    route_score: String,
}

#[derive(Deserialize)]
struct StopRecord {
    route_id: String,
    stop_id: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    zone_id: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct SequenceRecord {
    route_id: String,
    stop_id: String,
    #[serde(default)]
    sequence_order: Option<u32>,
}

#[derive(Deserialize)]
struct PackageRecord {
    package_id: String,
    route_id: String,
    stop_id: String,
    #[serde(default)]
    scan_status: String,
    #[serde(default)]
    planned_service_time_seconds: Option<f64>,
    #[serde(default)]
    time_window_start_utc: String,
    #[serde(default)]
    time_window_end_utc: String,
    #[serde(default)]
    depth_cm: Option<f64>,
    #[serde(default)]
    height_cm: Option<f64>,
    #[serde(default)]
    width_cm: Option<f64>,
}

#[derive(Deserialize)]
struct MetricsRecord {
    route_id: String,
    #[serde(default)]
    total_service_time_sec: Option<f64>,
    #[serde(default)]
    total_transit_time_sec: Option<f64>,
}

// ---------------------------------------------------------------------------
// Table readers
// ---------------------------------------------------------------------------

pub fn read_route_metrics<R: Read>(reader: R) -> Result<HashMap<String, RouteMetrics>, LoadError> {
    let mut metrics = HashMap::new();
    for record in csv::Reader::from_reader(reader).into_deserialize() {
        let record: MetricsRecord = record?;
        metrics.insert(
            record.route_id,
            RouteMetrics {
                total_service_time_sec: record.total_service_time_sec,
                total_transit_time_sec: record.total_transit_time_sec,
            },
        );
    }
    Ok(metrics)
}

pub fn read_routes<R: Read>(
    reader: R,
    metrics: &HashMap<String, RouteMetrics>,
) -> Result<Vec<Route>, LoadError> {
    let mut routes = Vec::new();
    for record in csv::Reader::from_reader(reader).into_deserialize() {
        let record: RouteRecord = record?;
        let joined = metrics.get(&record.route_id).copied().unwrap_or_default();
        routes.push(Route {
            date: NaiveDate::parse_from_str(&record.date, "%Y-%m-%d").ok(),
            departure_time_utc: record.departure_time_utc,
            executor_capacity_cm3: record.executor_capacity_cm3.unwrap_or(0.0),
            score: RouteScore::parse(&record.route_score),
            total_service_time_sec: joined.total_service_time_sec,
            total_transit_time_sec: joined.total_transit_time_sec,
            route_id: record.route_id,
            station_code: record.station_code,
        });
    }
    Ok(routes)
}

/// Rows without coordinates are skipped; every other use of a stop needs a
/// position, so an unlocatable stop is treated as a missing join target.
pub fn read_stops<R: Read>(reader: R) -> Result<Vec<Stop>, LoadError> {
    let mut stops = Vec::new();
    for record in csv::Reader::from_reader(reader).into_deserialize() {
        let record: StopRecord = record?;
        let (Some(lat), Some(lng)) = (record.lat, record.lng) else {
            continue;
        };
        stops.push(Stop {
            route_id: record.route_id,
            stop_id: record.stop_id,
            lat,
            lng,
            zone_id: record.zone_id,
            kind: record.kind,
        });
    }
    Ok(stops)
}

pub fn read_sequences<R: Read>(reader: R) -> Result<Vec<SequenceEntry>, LoadError> {
    let mut sequences = Vec::new();
    for record in csv::Reader::from_reader(reader).into_deserialize() {
        let record: SequenceRecord = record?;
        let Some(sequence_order) = record.sequence_order else {
            continue;
        };
        sequences.push(SequenceEntry {
            route_id: record.route_id,
            stop_id: record.stop_id,
            sequence_order,
        });
    }
    Ok(sequences)
}

pub fn read_packages<R: Read>(reader: R) -> Result<Vec<Package>, LoadError> {
    let mut packages = Vec::new();
    for record in csv::Reader::from_reader(reader).into_deserialize() {
        let record: PackageRecord = record?;
        packages.push(Package {
            package_id: record.package_id,
            route_id: record.route_id,
            stop_id: record.stop_id,
            scan_status: record.scan_status,
            planned_service_time_seconds: record.planned_service_time_seconds.unwrap_or(0.0),
            time_window_start_utc: record.time_window_start_utc,
            time_window_end_utc: record.time_window_end_utc,
            depth_cm: record.depth_cm.unwrap_or(0.0),
            height_cm: record.height_cm.unwrap_or(0.0),
            width_cm: record.width_cm.unwrap_or(0.0),
        });
    }
    Ok(packages)
}

// ---------------------------------------------------------------------------
// Station assembly
// ---------------------------------------------------------------------------

/// Arithmetic-mean centroid of a station's stops, with the continental
/// fallback for stationless data so the nation view never sees `NaN`.
pub fn station_centroid(stops: &[Stop]) -> (f64, f64) {
    if stops.is_empty() {
        return (DEFAULT_STATION_LAT, DEFAULT_STATION_LNG);
    }
    let n = stops.len() as f64;
    let (lat_sum, lng_sum) = stops
        .iter()
        .fold((0.0, 0.0), |(la, ln), s| (la + s.lat, ln + s.lng));
    (lat_sum / n, lng_sum / n)
}

/// Load the four per-station tables from `dir/<code>/`.
pub fn load_station_detail(
    dir: &Path,
    code: &str,
    metrics: &HashMap<String, RouteMetrics>,
) -> Result<StationDetail, LoadError> {
    let station_dir = dir.join(code);
    Ok(StationDetail {
        routes: read_routes(File::open(station_dir.join("routes.csv"))?, metrics)?,
        stops: read_stops(File::open(station_dir.join("stops.csv"))?)?,
        sequences: read_sequences(File::open(station_dir.join("actual_sequences.csv"))?)?,
        packages: read_packages(File::open(station_dir.join("packages.csv"))?)?,
    })
}

/// Result of the bulk preload. `failures` lists stations that were omitted,
/// with the reason; the load as a whole only counts as failed when no
/// station survived.
pub struct PreloadOutcome {
    pub stations: Vec<Station>,
    pub details: HashMap<String, StationDetail>,
    pub borders: Option<BorderSet>,
    pub failures: Vec<(String, String)>,
}

/// Preload every station concurrently. Runs on the IO task pool; the two
/// shared files are read first so each station task can join the metrics.
pub async fn preload_all(dir: PathBuf, codes: Vec<String>) -> PreloadOutcome {
    let metrics = match File::open(dir.join("route_time_metrics.csv")) {
        Ok(file) => match read_route_metrics(file) {
            Ok(map) => map,
            Err(err) => {
                warn!("route_time_metrics.csv unreadable, routes will have no time data: {err}");
                HashMap::new()
            }
        },
        Err(err) => {
            warn!("route_time_metrics.csv missing, routes will have no time data: {err}");
            HashMap::new()
        }
    };
    let metrics = Arc::new(metrics);

    let borders = match File::open(dir.join("borders.json")).map_err(LoadError::from) {
        Ok(file) => match parse_borders(file) {
            Ok(set) => Some(set),
            Err(err) => {
                warn!("borders.json unreadable, map renders without background: {err}");
                None
            }
        },
        Err(err) => {
            warn!("borders.json missing, map renders without background: {err}");
            None
        }
    };

    let pool = IoTaskPool::get_or_init(TaskPool::new);
    let tasks: Vec<_> = codes
        .into_iter()
        .map(|code| {
            let dir = dir.clone();
            let metrics = Arc::clone(&metrics);
            pool.spawn(async move {
                let result = load_station_detail(&dir, &code, &metrics);
                (code, result)
            })
        })
        .collect();

    let mut outcome = PreloadOutcome {
        stations: Vec::new(),
        details: HashMap::new(),
        borders,
        failures: Vec::new(),
    };
    for task in tasks {
        let (code, result) = task.await;
        match result {
            Ok(detail) => {
                let (lat, lng) = station_centroid(&detail.stops);
                outcome.stations.push(Station {
                    code: code.clone(),
                    lat,
                    lng,
                    total_routes: detail.routes.len(),
                });
                outcome.details.insert(code, detail);
            }
            Err(err) => outcome.failures.push((code, err.to_string())),
        }
    }
    outcome.stations.sort_by(|a, b| a.code.cmp(&b.code));
    outcome
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// The preloaded network, immutable after commit. Renderers and controllers
/// read it; only the loader writes it (once per successful preload).
#[derive(Resource, Default)]
pub struct DataStore {
    pub stations: Vec<Station>,
    pub details: HashMap<String, StationDetail>,
    pub borders: Option<BorderSet>,
}

impl DataStore {
    pub fn from_outcome(outcome: PreloadOutcome) -> Self {
        Self {
            stations: outcome.stations,
            details: outcome.details,
            borders: outcome.borders,
        }
    }

    pub fn station(&self, code: &str) -> Option<&StationDetail> {
        self.details.get(code)
    }

    pub fn all_routes(&self) -> impl Iterator<Item = &Route> {
        self.details.values().flat_map(|d| d.routes.iter())
    }

    pub fn all_packages(&self) -> impl Iterator<Item = &Package> {
        self.details.values().flat_map(|d| d.packages.iter())
    }

    pub fn total_route_count(&self) -> usize {
        self.details.values().map(|d| d.routes.len()).sum()
    }

    /// Mean number of stops per route across the whole network, `None` when
    /// there are no routes.
    pub fn average_stops_per_route(&self) -> Option<f64> {
        let routes = self.total_route_count();
        if routes == 0 {
            return None;
        }
        let stops: usize = self.details.values().map(|d| d.stops.len()).sum();
        Some(stops as f64 / routes as f64)
    }

    /// Distinct route dates across the network, ascending.
    pub fn all_dates(&self) -> Vec<NaiveDate> {
        self.all_routes()
            .filter_map(|r| r.date)
            .sorted()
            .dedup()
            .collect()
    }

    /// First and last observed route date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.all_dates();
        Some((*dates.first()?, *dates.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::tasks::block_on;

    const ROUTES_CSV: &str = "\
route_id,station_code,date,departure_time_utc,executor_capacity_cm3,route_score
R1,DAU1,2018-07-15,07:15:00,4000000,High
R2,DAU1,2018-07-16,15:30:00,3500000,Poor
R3,DAU1,bad-date,23:10:00,,Low
";

    const STOPS_CSV: &str = "\
route_id,stop_id,lat,lng,zone_id,type
R1,AA,34.1,-118.2,Z-1.1A,Dropoff
R1,AB,34.2,-118.3,Z-1.2B,Dropoff
R2,AA,34.3,-118.4,Z-2.1A,Dropoff
R2,XX,,,Z-9.9X,Dropoff
";

    #[test]
    fn test_read_routes_joins_metrics_and_buckets_scores() {
        let mut metrics = HashMap::new();
        metrics.insert(
            "R1".to_string(),
            RouteMetrics {
                total_service_time_sec: Some(1800.0),
                total_transit_time_sec: Some(3600.0),
            },
        );
        let routes = read_routes(ROUTES_CSV.as_bytes(), &metrics).unwrap();
        assert_eq!(routes.len(), 3);
        assert_eq!(routes[0].total_transit_time_sec, Some(3600.0));
        // No metrics row: "no data", not zero.
        assert_eq!(routes[1].total_service_time_sec, None);
        // Unrecognized score buckets as Unknown instead of being dropped.
        assert_eq!(routes[1].score, RouteScore::Unknown);
        // Unparseable date stays None.
        assert_eq!(routes[2].date, None);
        assert_eq!(routes[2].executor_capacity_cm3, 0.0);
        assert_eq!(
            routes[0].date,
            NaiveDate::from_ymd_opt(2018, 7, 15)
        );
    }

    #[test]
    fn test_read_stops_skips_unlocatable_rows() {
        let stops = read_stops(STOPS_CSV.as_bytes()).unwrap();
        assert_eq!(stops.len(), 3);
        assert!(stops.iter().all(|s| s.stop_id != "XX"));
    }

    #[test]
    fn test_centroid_mean_and_fallback() {
        let stops = read_stops(STOPS_CSV.as_bytes()).unwrap();
        let (lat, lng) = station_centroid(&stops);
        assert!((lat - 34.2).abs() < 1e-9);
        assert!((lng - (-118.3)).abs() < 1e-9);

        // Centroid stays inside the stops' bounding box.
        let min_lat = stops.iter().map(|s| s.lat).fold(f64::INFINITY, f64::min);
        let max_lat = stops.iter().map(|s| s.lat).fold(f64::NEG_INFINITY, f64::max);
        assert!(lat >= min_lat && lat <= max_lat);

        let (lat, lng) = station_centroid(&[]);
        assert_eq!((lat, lng), (DEFAULT_STATION_LAT, DEFAULT_STATION_LNG));
    }

    #[test]
    fn test_read_sequences_skips_orderless_rows() {
        let raw = "route_id,stop_id,sequence_order\nR1,AA,3\nR1,AB,\nR1,AC,1\n";
        let sequences = read_sequences(raw.as_bytes()).unwrap();
        assert_eq!(sequences.len(), 2);
    }

    #[test]
    fn test_read_packages_defaults() {
        let raw = "\
package_id,route_id,stop_id,scan_status,planned_service_time_seconds,time_window_start_utc,time_window_end_utc,depth_cm,height_cm,width_cm
P1,R1,AA,DELIVERED,42.5,,,10,20,30
P2,R1,AB,REJECTED,,,,,,
";
        let packages = read_packages(raw.as_bytes()).unwrap();
        assert_eq!(packages.len(), 2);
        assert!(packages[0].is_delivered());
        assert!(!packages[1].is_delivered());
        assert_eq!(packages[1].planned_service_time_seconds, 0.0);
    }

    #[test]
    fn test_preload_isolates_station_failures() {
        let dir = std::env::temp_dir().join(format!("lastmile_store_{}", std::process::id()));
        let good = dir.join("GOOD");
        std::fs::create_dir_all(&good).unwrap();
        std::fs::write(good.join("routes.csv"), ROUTES_CSV).unwrap();
        std::fs::write(good.join("stops.csv"), STOPS_CSV).unwrap();
        std::fs::write(
            good.join("actual_sequences.csv"),
            "route_id,stop_id,sequence_order\nR1,AA,1\nR1,AB,2\n",
        )
        .unwrap();
        std::fs::write(
            good.join("packages.csv"),
            "package_id,route_id,stop_id,scan_status,planned_service_time_seconds,time_window_start_utc,time_window_end_utc,depth_cm,height_cm,width_cm\n",
        )
        .unwrap();

        let outcome = block_on(preload_all(
            dir.clone(),
            vec!["GOOD".to_string(), "MISSING".to_string()],
        ));
        assert_eq!(outcome.stations.len(), 1);
        assert_eq!(outcome.stations[0].code, "GOOD");
        assert_eq!(outcome.stations[0].total_routes, 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, "MISSING");
        // Shared files were absent: degraded, not fatal.
        assert!(outcome.borders.is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
