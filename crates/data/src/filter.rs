//! The filter engine: pure derivation of the filtered route set.
//!
//! Filtering is conjunctive across score, date, and zone. Dates compare as
//! parsed [`NaiveDate`]s, never as raw strings; string comparison is a
//! known source of locale bugs in this kind of data. Recomputation runs in
//! the `Derive` phase of the same frame as the triggering event, so every
//! renderer in that frame observes the same filtered snapshot.

use bevy::prelude::*;
use chrono::NaiveDate;
use itertools::Itertools;

use crate::level::{FiltersChanged, RefreshViews};
use crate::model::{Route, Stop};
use crate::state::{DashboardState, Filters};

fn date_passes(date: Option<NaiveDate>, filters: &Filters) -> bool {
    // A route without a parseable date can't prove membership in the range.
    let Some(date) = date else {
        return false;
    };
    let min_ok = filters.date_min.is_none_or(|min| date >= min);
    let max_ok = filters.date_max.is_none_or(|max| date <= max);
    min_ok && max_ok
}

/// Derive the filtered route set. Pure and idempotent: same inputs, same
/// output, in input order.
pub fn compute_filtered_routes(routes: &[Route], stops: &[Stop], filters: &Filters) -> Vec<Route> {
    let zones_by_route = stops
        .iter()
        .map(|s| (s.route_id.as_str(), s.zone_id.as_str()))
        .into_group_map();

    routes
        .iter()
        .filter(|route| {
            let score_ok = filters.scores.contains(&route.score);
            let date_ok = date_passes(route.date, filters);
            let zone_ok = filters.zones.is_empty()
                || zones_by_route
                    .get(route.route_id.as_str())
                    .is_some_and(|zones| zones.iter().any(|z| filters.zones.contains(*z)));
            score_ok && date_ok && zone_ok
        })
        .cloned()
        .collect()
}

/// Apply pending filter changes: commit the new criteria, recompute the
/// derived set once, and request exactly one view refresh.
pub fn apply_filters(
    mut events: EventReader<FiltersChanged>,
    mut state: ResMut<DashboardState>,
    mut refresh: EventWriter<RefreshViews>,
) {
    let Some(event) = events.read().last().cloned() else {
        return;
    };
    state.filters = event.0;
    state.filtered_routes =
        compute_filtered_routes(&state.station_routes, &state.station_stops, &state.filters);
    debug!(
        "filters applied: {} of {} routes pass",
        state.filtered_routes.len(),
        state.station_routes.len()
    );
    refresh.send(RefreshViews);
}
