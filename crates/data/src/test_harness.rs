//! Headless integration-test harness for the dashboard.
//!
//! Wraps `bevy::app::App` + [`DataPlugin`](crate::DataPlugin) with
//! `MinimalPlugins` (no window, no renderer) and a small synthetic network,
//! so tests can drive the level controller and filter engine through the
//! same events the UI sends and assert on the resulting session state.

use bevy::app::App;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::level::{FiltersChanged, NavigateBack, SelectRoute, SelectStation};
use crate::loader::{AppPhase, SkipPreload};
use crate::model::{
    Package, Route, RouteScore, SequenceEntry, Station, StationDetail, Stop,
};
use crate::state::{DashboardState, Filters, Level};
use crate::store::DataStore;
use crate::DataPlugin;

/// A headless app around [`DataPlugin`] starting directly in the dashboard
/// phase with [`sample_store`] committed.
pub struct TestDashboard {
    pub app: App,
}

impl TestDashboard {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        // Skip the filesystem preload and start on the dashboard; the
        // synthetic store below stands in for the preload's commit.
        app.insert_resource(SkipPreload);
        app.insert_state(AppPhase::Dashboard);
        app.add_plugins(DataPlugin);
        app.insert_resource(sample_store());
        // First update runs the initial state transitions.
        app.update();
        Self { app }
    }

    pub fn tick(&mut self) {
        self.app.update();
    }

    pub fn state(&self) -> &DashboardState {
        self.app.world().resource::<DashboardState>()
    }

    pub fn level(&self) -> Level {
        *self.app.world().resource::<State<Level>>().get()
    }

    /// Send an event and run two updates: one for the handler, one for the
    /// queued state transition to apply.
    fn send_and_settle<E: Event>(&mut self, event: E) {
        self.app.world_mut().send_event(event);
        self.tick();
        self.tick();
    }

    pub fn select_station(&mut self, code: &str) {
        self.send_and_settle(SelectStation(code.to_string()));
    }

    pub fn select_route(&mut self, route_id: &str) {
        self.send_and_settle(SelectRoute(route_id.to_string()));
    }

    pub fn back(&mut self) {
        self.send_and_settle(NavigateBack);
    }

    pub fn change_filters(&mut self, filters: Filters) {
        self.send_and_settle(FiltersChanged(filters));
    }
}

// ---------------------------------------------------------------------------
// Synthetic network
// ---------------------------------------------------------------------------

fn route(id: &str, station: &str, score: RouteScore, date: &str, departure: &str) -> Route {
    Route {
        route_id: id.to_string(),
        station_code: station.to_string(),
        date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        departure_time_utc: departure.to_string(),
        executor_capacity_cm3: 4_000_000.0,
        score,
        total_service_time_sec: Some(1800.0),
        total_transit_time_sec: Some(3600.0),
    }
}

fn stop(route_id: &str, stop_id: &str, lat: f64, lng: f64, zone: &str) -> Stop {
    Stop {
        route_id: route_id.to_string(),
        stop_id: stop_id.to_string(),
        lat,
        lng,
        zone_id: zone.to_string(),
        kind: "Dropoff".to_string(),
    }
}

fn seq(route_id: &str, stop_id: &str, order: u32) -> SequenceEntry {
    SequenceEntry {
        route_id: route_id.to_string(),
        stop_id: stop_id.to_string(),
        sequence_order: order,
    }
}

fn package(id: &str, route_id: &str, stop_id: &str, status: &str) -> Package {
    Package {
        package_id: id.to_string(),
        route_id: route_id.to_string(),
        stop_id: stop_id.to_string(),
        scan_status: status.to_string(),
        planned_service_time_seconds: 60.0,
        time_window_start_utc: String::new(),
        time_window_end_utc: String::new(),
        depth_cm: 10.0,
        height_cm: 10.0,
        width_cm: 10.0,
    }
}

/// Two stations: "A1" with three routes (scores High, High, Low) and "B2"
/// with one. Route R1's sequence is stored out of order on purpose.
pub fn sample_store() -> DataStore {
    let a1 = StationDetail {
        routes: vec![
            route("R1", "A1", RouteScore::High, "2018-07-14", "06:30:00"),
            route("R2", "A1", RouteScore::High, "2018-07-15", "15:30:00"),
            route("R3", "A1", RouteScore::Low, "2018-07-16", "23:30:00"),
        ],
        stops: vec![
            stop("R1", "S-A", 34.10, -118.20, "Z-1"),
            stop("R1", "S-B", 34.12, -118.22, "Z-1"),
            stop("R1", "S-C", 34.14, -118.24, "Z-2"),
            stop("R2", "S-A", 34.20, -118.30, "Z-2"),
            stop("R2", "S-D", 34.22, -118.32, "Z-2"),
            stop("R3", "S-E", 34.30, -118.40, "Z-3"),
            stop("R3", "S-F", 34.32, -118.42, "Z-3"),
        ],
        sequences: vec![
            seq("R1", "S-C", 3),
            seq("R1", "S-A", 1),
            seq("R1", "S-B", 2),
            seq("R2", "S-A", 1),
            seq("R2", "S-D", 2),
            seq("R3", "S-E", 1),
            seq("R3", "S-F", 2),
        ],
        packages: vec![
            package("P1", "R1", "S-A", "DELIVERED"),
            package("P2", "R1", "S-B", "DELIVERED"),
            package("P3", "R1", "S-B", "REJECTED"),
            package("P4", "R2", "S-D", "DELIVERED"),
            package("P5", "R3", "S-E", "DELIVERED"),
        ],
    };
    let b2 = StationDetail {
        routes: vec![route("R9", "B2", RouteScore::Medium, "2018-07-20", "09:15:00")],
        stops: vec![
            stop("R9", "S-X", 47.60, -122.30, "Z-9"),
            stop("R9", "S-Y", 47.62, -122.32, "Z-9"),
        ],
        sequences: vec![seq("R9", "S-X", 1), seq("R9", "S-Y", 2)],
        packages: vec![package("P9", "R9", "S-X", "DELIVERED")],
    };

    let mut store = DataStore::default();
    for (code, detail) in [("A1", a1), ("B2", b2)] {
        let (lat, lng) = crate::store::station_centroid(&detail.stops);
        store.stations.push(Station {
            code: code.to_string(),
            lat,
            lng,
            total_routes: detail.routes.len(),
        });
        store.details.insert(code.to_string(), detail);
    }
    store
}
