//! Level-scoped chart populations, driven through real transitions.

use std::collections::HashSet;

use crate::aggregate::{
    build_pie_slices, delivered_counts, packages_for_level, routes_for_level, score_counts,
};
use crate::model::RouteScore;
use crate::state::Level;
use crate::store::DataStore;
use crate::test_harness::TestDashboard;

#[test]
fn test_nation_population_spans_all_stations() {
    let dash = TestDashboard::new();
    let store = dash.app.world().resource::<DataStore>();
    let routes = routes_for_level(Level::Nation, store, dash.state());
    assert_eq!(routes.len(), 4);
    let packages = packages_for_level(Level::Nation, store, dash.state());
    assert_eq!(packages.len(), 6);
}

#[test]
fn test_station_population_follows_filters() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");

    let mut filters = dash.state().filters.clone();
    filters.scores = HashSet::from([RouteScore::High]);
    dash.change_filters(filters);

    let store = dash.app.world().resource::<DataStore>();
    let routes = routes_for_level(Level::Station, store, dash.state());
    assert_eq!(routes.len(), 2);

    // Pie over the filtered set is exactly {High: 2}.
    let slices = build_pie_slices(&score_counts(routes.into_iter()), 0.0);
    assert_eq!(slices.len(), 1);
    assert_eq!((slices[0].label.as_str(), slices[0].value), ("High", 2));

    // Package population narrows to the filtered routes' packages.
    let packages = packages_for_level(Level::Station, store, dash.state());
    assert_eq!(packages.len(), 4);
    assert!(packages.iter().all(|p| p.route_id == "R1" || p.route_id == "R2"));
}

#[test]
fn test_route_population_is_the_selection() {
    let mut dash = TestDashboard::new();
    dash.select_station("A1");
    dash.select_route("R1");

    let store = dash.app.world().resource::<DataStore>();
    let routes = routes_for_level(Level::Route, store, dash.state());
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].route_id, "R1");

    let packages = packages_for_level(Level::Route, store, dash.state());
    let counts = delivered_counts(packages.into_iter());
    assert_eq!(counts[0], ("DELIVERED".to_string(), 2));
    assert_eq!(counts[1], ("OTHER".to_string(), 1));
}
