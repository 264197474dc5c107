//! The level controller: the Nation → Station → Route state machine.
//!
//! All level changes flow through the events defined here, emitted by map
//! clicks and panel controls alike. Each handler validates its
//! precondition, clears any data scoped to levels being left (so no stale
//! selection survives), repopulates the session record from the immutable
//! store, and requests exactly one view refresh. Invalid transitions are
//! logged no-ops; state is left untouched.

use bevy::prelude::*;
use itertools::Itertools;

use crate::config::DataConfig;
use crate::state::{DashboardState, Filters, Level, ScatterAxis};
use crate::store::DataStore;
use crate::travel_times::{spawn_travel_time_fetch, PendingTravelTimes};

/// Enter Station level for the given station code.
#[derive(Event, Debug, Clone)]
pub struct SelectStation(pub String);

/// Enter Route level for the given route of the current station.
#[derive(Event, Debug, Clone)]
pub struct SelectRoute(pub String);

/// Leave the current level (no-op at Nation).
#[derive(Event, Debug, Clone, Copy)]
pub struct NavigateBack;

/// Replace the filter criteria; the filter engine recomputes and refreshes.
#[derive(Event, Debug, Clone)]
pub struct FiltersChanged(pub Filters);

/// State changed in a way that invalidates cached view artifacts (the map
/// projection fit). One event per transition, consumed by the renderers.
#[derive(Event, Debug, Clone, Copy)]
pub struct RefreshViews;

/// Scatter axis configuration commands, routed through the controller so
/// panels never write the session record directly.
#[derive(Event, Debug, Clone, Copy)]
pub enum ScatterAxisCommand {
    Swap,
    SetX(ScatterAxis),
    SetY(ScatterAxis),
}

/// Nation → Station. Precondition: the station exists in the store.
pub fn handle_station_selection(
    mut events: EventReader<SelectStation>,
    store: Res<DataStore>,
    mut state: ResMut<DashboardState>,
    mut next_level: ResMut<NextState<Level>>,
    mut filters_changed: EventWriter<FiltersChanged>,
    mut refresh: EventWriter<RefreshViews>,
) {
    for SelectStation(code) in events.read() {
        let Some(detail) = store.station(code) else {
            warn!("ignoring selection of unknown station {code}");
            continue;
        };

        state.clear_route_data();
        state.clear_station_data();
        state.selected_station = Some(code.clone());
        state.station_routes = detail.routes.clone();
        state.station_stops = detail.stops.clone();
        state.station_sequences = detail.sequences.clone();

        state.filter_options.zones = detail
            .stops
            .iter()
            .map(|s| s.zone_id.clone())
            .sorted()
            .dedup()
            .collect();
        state.filter_options.dates = store.all_dates();

        // Reset to pass-everything; the engine derives the filtered set in
        // this same frame, before any renderer runs.
        filters_changed.send(FiltersChanged(Filters::all_pass(store.date_bounds())));

        next_level.set(Level::Station);
        refresh.send(RefreshViews);
        info!("station {code} selected ({} routes)", detail.routes.len());
    }
}

/// Station → Route. Precondition: a station is selected and owns the route.
pub fn handle_route_selection(
    mut events: EventReader<SelectRoute>,
    store: Res<DataStore>,
    config: Res<DataConfig>,
    mut state: ResMut<DashboardState>,
    mut pending: ResMut<PendingTravelTimes>,
    mut next_level: ResMut<NextState<Level>>,
    mut refresh: EventWriter<RefreshViews>,
) {
    for SelectRoute(route_id) in events.read() {
        let Some(station_code) = state.selected_station.clone() else {
            warn!("ignoring route selection with no station selected");
            continue;
        };
        if !state.station_routes.iter().any(|r| &r.route_id == route_id) {
            warn!("ignoring selection of route {route_id} outside station {station_code}");
            continue;
        }

        state.clear_route_data();
        state.selected_route = Some(route_id.clone());
        let route_stops: Vec<_> = state
            .station_stops
            .iter()
            .filter(|s| &s.route_id == route_id)
            .cloned()
            .collect();
        state.route_stops = route_stops;
        state.route_packages = store
            .station(&station_code)
            .map(|detail| {
                detail
                    .packages
                    .iter()
                    .filter(|p| &p.route_id == route_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // The matrix arrives asynchronously; the route view renders in a
        // degraded mode (no link coloring) until the poll commits it.
        spawn_travel_time_fetch(&mut pending, &config.data_dir, &station_code, route_id);

        next_level.set(Level::Route);
        refresh.send(RefreshViews);
        info!("route {route_id} selected ({} stops)", state.route_stops.len());
    }
}

/// Back navigation: clear the data scoped to the level being exited before
/// switching. Backing out of Nation is a logged no-op.
pub fn handle_back_navigation(
    mut events: EventReader<NavigateBack>,
    level: Res<State<Level>>,
    mut state: ResMut<DashboardState>,
    mut next_level: ResMut<NextState<Level>>,
    mut filters_changed: EventWriter<FiltersChanged>,
    mut refresh: EventWriter<RefreshViews>,
) {
    for NavigateBack in events.read() {
        match level.get() {
            Level::Route => {
                state.clear_route_data();
                // Re-derive the station's filtered set for the returning view.
                filters_changed.send(FiltersChanged(state.filters.clone()));
                next_level.set(Level::Station);
                refresh.send(RefreshViews);
            }
            Level::Station => {
                state.clear_route_data();
                state.clear_station_data();
                next_level.set(Level::Nation);
                refresh.send(RefreshViews);
            }
            Level::Nation => {
                info!("already at nation level; nothing to go back to");
            }
        }
    }
}

/// Scatter axis configuration, applied to the session record.
pub fn handle_scatter_axis_commands(
    mut events: EventReader<ScatterAxisCommand>,
    mut state: ResMut<DashboardState>,
) {
    for command in events.read() {
        match command {
            ScatterAxisCommand::Swap => state.swap_scatter_axes(),
            ScatterAxisCommand::SetX(axis) => state.scatter_x = *axis,
            ScatterAxisCommand::SetY(axis) => state.scatter_y = *axis,
        }
    }
}
