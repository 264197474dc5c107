//! Level-transition behavior of the controller state machine.

use crate::state::Level;
use crate::test_harness::TestDashboard;

#[test]
fn test_starts_at_nation_level() {
    let dash = TestDashboard::new();
    assert_eq!(dash.level(), Level::Nation);
    assert!(dash.state().selected_station.is_none());
}

#[test]
fn test_station_selection_populates_scoped_data() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");

    assert_eq!(dash.level(), Level::Station);
    let state = dash.state();
    assert_eq!(state.selected_station.as_deref(), Some("A1"));
    assert_eq!(state.station_routes.len(), 3);
    assert_eq!(state.station_stops.len(), 7);
    // Filters were reset to pass-everything, so the derived set is full.
    assert_eq!(state.filtered_routes.len(), 3);
    // Zone options come from this station's stops, sorted and distinct.
    assert_eq!(state.filter_options.zones, ["Z-1", "Z-2", "Z-3"]);
}

#[test]
fn test_unknown_station_is_logged_noop() {
    let mut dash = TestDashboard::new();
    dash.select_station("NOPE");
    assert_eq!(dash.level(), Level::Nation);
    assert!(dash.state().selected_station.is_none());
}

#[test]
fn test_route_selection_requires_station() {
    let mut dash = TestDashboard::new();
    dash.select_route("R1");
    assert_eq!(dash.level(), Level::Nation);
    assert!(dash.state().selected_route.is_none());
}

#[test]
fn test_route_selection_requires_membership() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");
    // R9 belongs to station B2.
    dash.select_route("R9");
    assert_eq!(dash.level(), Level::Station);
    assert!(dash.state().selected_route.is_none());
}

#[test]
fn test_route_selection_derives_route_scope() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");
    dash.select_route("R1");

    assert_eq!(dash.level(), Level::Route);
    let state = dash.state();
    assert_eq!(state.selected_route.as_deref(), Some("R1"));
    assert_eq!(state.route_stops.len(), 3);
    assert_eq!(state.route_packages.len(), 3);
    assert!(state.route_stops.iter().all(|s| s.route_id == "R1"));
}

#[test]
fn test_route_roundtrip_leaves_no_stale_route_data() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");
    dash.select_route("R1");
    dash.back();

    assert_eq!(dash.level(), Level::Station);
    let state = dash.state();
    assert!(state.selected_route.is_none());
    assert!(state.route_stops.is_empty());
    assert!(state.route_packages.is_empty());
    assert!(state.route_travel_times.is_none());
    // Station scope survives the detour.
    assert_eq!(state.selected_station.as_deref(), Some("A1"));
    assert_eq!(state.filtered_routes.len(), 3);
}

#[test]
fn test_back_to_nation_clears_station_scope() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");
    dash.back();

    assert_eq!(dash.level(), Level::Nation);
    let state = dash.state();
    assert!(state.selected_station.is_none());
    assert!(state.station_routes.is_empty());
    assert!(state.station_stops.is_empty());
    assert!(state.station_sequences.is_empty());
    assert!(state.filtered_routes.is_empty());
}

#[test]
fn test_back_at_nation_is_noop() {
    let mut dash = TestDashboard::new();
    dash.back();
    assert_eq!(dash.level(), Level::Nation);
}

#[test]
fn test_reentering_station_resets_filters() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");

    let mut filters = dash.state().filters.clone();
    filters.zones.insert("Z-1".to_string());
    dash.change_filters(filters);
    assert_eq!(dash.state().filtered_routes.len(), 1);

    // Leaving and re-selecting the station resets to pass-everything.
    dash.back();
    dash.select_station("A1");
    assert!(dash.state().filters.zones.is_empty());
    assert_eq!(dash.state().filtered_routes.len(), 3);
}

#[test]
fn test_switching_station_replaces_scope() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");
    dash.select_station("B2");
    let state = dash.state();
    assert_eq!(state.selected_station.as_deref(), Some("B2"));
    assert_eq!(state.station_routes.len(), 1);
    assert_eq!(state.filter_options.zones, ["Z-9"]);
}
