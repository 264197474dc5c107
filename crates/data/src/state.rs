//! The dashboard session state.
//!
//! [`Level`] is the zoom state machine (Nation → Station → Route), defined
//! as a Bevy [`States`] enum so renderers and panels can gate on it without
//! circular dependencies. [`DashboardState`] is the single mutable session
//! record behind it: selections, scoped collections, filters, and chart
//! axis configuration.
//!
//! Discipline: only the level controller ([`crate::level`]), the filter
//! engine ([`crate::filter`]), and the travel-time poll write this
//! resource. Renderers take it read-only and derive anything else at render
//! time, so views can never cache stale copies.

use std::collections::HashSet;

use bevy::prelude::*;
use chrono::NaiveDate;

use crate::model::{Package, Route, RouteScore, SequenceEntry, Stop, TravelTimeMatrix};

/// The dashboard zoom level.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    /// Whole network: one circle per depot station.
    #[default]
    Nation,
    /// One station: its routes and stops, filterable.
    Station,
    /// One route: per-link pace coloring and per-stop detail.
    Route,
}

impl Level {
    pub fn number(self) -> u8 {
        match self {
            Level::Nation => 1,
            Level::Station => 2,
            Level::Route => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Nation => "Nation",
            Level::Station => "Station",
            Level::Route => "Route",
        }
    }

    /// Level indicator text, e.g. "2 (Station)".
    pub fn indicator(self) -> String {
        format!("{} ({})", self.number(), self.label())
    }
}

/// A numeric per-route quantity the scatter plot can put on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScatterAxis {
    TransitTime,
    ServiceTime,
    ExecutorCapacity,
}

impl ScatterAxis {
    pub const ALL: [ScatterAxis; 3] = [
        ScatterAxis::TransitTime,
        ScatterAxis::ServiceTime,
        ScatterAxis::ExecutorCapacity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ScatterAxis::TransitTime => "Total Transit Time",
            ScatterAxis::ServiceTime => "Total Service Time",
            ScatterAxis::ExecutorCapacity => "Executor Capacity (cm3)",
        }
    }

    /// Whether values are durations in seconds (ticks format as h/m).
    pub fn is_duration(self) -> bool {
        !matches!(self, ScatterAxis::ExecutorCapacity)
    }

    /// The route's value on this axis; `None` excludes the route from the
    /// plot rather than plotting a sentinel zero.
    pub fn value(self, route: &Route) -> Option<f64> {
        match self {
            ScatterAxis::TransitTime => route.total_transit_time_sec,
            ScatterAxis::ServiceTime => route.total_service_time_sec,
            ScatterAxis::ExecutorCapacity => Some(route.executor_capacity_cm3),
        }
    }
}

/// Conjunctive route filters. An empty zone set means "no zone filter"
/// (pass-through), not "exclude everything".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub scores: HashSet<RouteScore>,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    pub zones: HashSet<String>,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            scores: RouteScore::KNOWN.into_iter().collect(),
            date_min: None,
            date_max: None,
            zones: HashSet::new(),
        }
    }
}

impl Filters {
    /// The pass-everything filter over a known date span.
    pub fn all_pass(date_bounds: Option<(NaiveDate, NaiveDate)>) -> Self {
        let mut filters = Self::default();
        if let Some((min, max)) = date_bounds {
            filters.date_min = Some(min);
            filters.date_max = Some(max);
        }
        filters
    }
}

/// Choices the filter panel offers for the current station.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Distinct zone ids of the selected station's stops, ascending.
    pub zones: Vec<String>,
    /// Distinct route dates across the network, ascending.
    pub dates: Vec<NaiveDate>,
}

/// The single mutable session record driving every view.
#[derive(Resource, Debug)]
pub struct DashboardState {
    pub selected_station: Option<String>,
    pub station_routes: Vec<Route>,
    pub station_stops: Vec<Stop>,
    pub station_sequences: Vec<SequenceEntry>,

    pub selected_route: Option<String>,
    pub route_stops: Vec<Stop>,
    pub route_packages: Vec<Package>,
    pub route_travel_times: Option<TravelTimeMatrix>,

    pub filters: Filters,
    pub filter_options: FilterOptions,
    pub filtered_routes: Vec<Route>,

    pub scatter_x: ScatterAxis,
    pub scatter_y: ScatterAxis,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            selected_station: None,
            station_routes: Vec::new(),
            station_stops: Vec::new(),
            station_sequences: Vec::new(),
            selected_route: None,
            route_stops: Vec::new(),
            route_packages: Vec::new(),
            route_travel_times: None,
            filters: Filters::default(),
            filter_options: FilterOptions::default(),
            filtered_routes: Vec::new(),
            scatter_x: ScatterAxis::TransitTime,
            scatter_y: ScatterAxis::ServiceTime,
        }
    }
}

impl DashboardState {
    /// Reset every station-scoped field (leaving Station level).
    pub fn clear_station_data(&mut self) {
        self.selected_station = None;
        self.station_routes.clear();
        self.station_stops.clear();
        self.station_sequences.clear();
        self.filtered_routes.clear();
        self.filter_options = FilterOptions::default();
        self.filters = Filters::default();
    }

    /// Reset every route-scoped field (leaving Route level). Entering Route
    /// level again must start from these defaults.
    pub fn clear_route_data(&mut self) {
        self.selected_route = None;
        self.route_stops.clear();
        self.route_packages.clear();
        self.route_travel_times = None;
    }

    /// The full route record behind the current selection.
    pub fn selected_route_record(&self) -> Option<&Route> {
        let id = self.selected_route.as_deref()?;
        self.station_routes.iter().find(|r| r.route_id == id)
    }

    pub fn swap_scatter_axes(&mut self) {
        std::mem::swap(&mut self.scatter_x, &mut self.scatter_y);
    }
}
