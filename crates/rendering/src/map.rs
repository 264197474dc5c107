//! The central map viewport.
//!
//! One idempotent egui renderer for all three levels: station circles at
//! Nation, filtered route paths at Station, pace-colored links and
//! service-colored stop markers at Route. Every drawn element registers a
//! frame-local hit area; hover feeds the details panel, click feeds the
//! level controller. The projection fit is the only cached artifact and is
//! recomputed on [`RefreshViews`] or a viewport resize.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use itertools::Itertools;

use data::format::format_duration;
use data::level::{RefreshViews, SelectRoute, SelectStation};
use data::model::{Stop, TravelTimeMatrix};
use data::path::drawable_path;
use data::state::{DashboardState, Level};
use data::store::DataStore;
use data::travel_times::{great_circle_km, link_pace_s_per_km};

use crate::color_scales::{LINK_PACE_SCALE, STOP_SERVICE_SCALE, UNKNOWN_LINK_COLOR};
use crate::highlight::{DetailsPanel, HighlightState};
use crate::projection::{Mercator, FIT_PADDING};

const MAP_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(24, 26, 34);
const BORDER_COLOR: egui::Color32 = egui::Color32::from_rgb(62, 68, 84);
const STATION_FILL: egui::Color32 = egui::Color32::from_rgb(70, 130, 180);
const STATION_STROKE: egui::Color32 = egui::Color32::from_rgb(40, 44, 56);
const STOP_DOT: egui::Color32 = egui::Color32::from_rgb(224, 49, 49);
const ACCENT: egui::Color32 = egui::Color32::from_rgb(255, 196, 0);
const EMPTY_TEXT: egui::Color32 = egui::Color32::from_rgb(160, 165, 180);

/// Pointer slack around circles and segments, in pixels.
const CIRCLE_SLACK: f32 = 3.0;
const SEGMENT_SLACK: f32 = 5.0;

/// Cached view artifacts: the fitted projection and the viewport it was
/// fitted for.
#[derive(Resource)]
pub struct MapViewState {
    pub projection: Option<Mercator>,
    pub viewport: egui::Rect,
    pub fit_pending: bool,
}

impl Default for MapViewState {
    fn default() -> Self {
        Self {
            projection: None,
            viewport: egui::Rect::NOTHING,
            fit_pending: true,
        }
    }
}

/// Cosmetic route-path convention: the leg out of the station is drawn in
/// a different color from the rest of the path.
#[derive(Resource)]
pub struct RouteStyle {
    pub first_leg: egui::Color32,
    pub rest: egui::Color32,
    pub width: f32,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self {
            first_leg: egui::Color32::BLACK,
            rest: egui::Color32::WHITE,
            width: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum MapElement {
    Station(String),
    Route(String),
    /// Index into the route-level ordered path.
    Stop(usize),
    /// Index of the link leaving path stop `i`.
    Link(usize),
}

#[derive(Debug, Clone, Copy)]
enum HitShape {
    Circle { center: egui::Pos2, radius: f32 },
    Segment { a: egui::Pos2, b: egui::Pos2 },
}

struct Hit {
    element: MapElement,
    shape: HitShape,
    dist: f32,
}

fn segment_distance(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

struct HitTester {
    pointer: Option<egui::Pos2>,
    best: Option<Hit>,
}

impl HitTester {
    fn new(pointer: Option<egui::Pos2>) -> Self {
        Self { pointer, best: None }
    }

    fn consider(&mut self, element: MapElement, shape: HitShape) {
        let Some(pointer) = self.pointer else {
            return;
        };
        let dist = match shape {
            HitShape::Circle { center, radius } => {
                let d = (pointer - center).length();
                if d > radius + CIRCLE_SLACK {
                    return;
                }
                // Circles always beat nearby segments.
                d - radius - CIRCLE_SLACK
            }
            HitShape::Segment { a, b } => {
                let d = segment_distance(pointer, a, b);
                if d > SEGMENT_SLACK {
                    return;
                }
                d
            }
        };
        if self.best.as_ref().is_none_or(|hit| dist < hit.dist) {
            self.best = Some(Hit { element, shape, dist });
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Draw the map for the current level and resolve pointer interaction.
#[allow(clippy::too_many_arguments)]
pub fn map_ui(
    mut contexts: EguiContexts,
    level: Res<State<Level>>,
    store: Res<DataStore>,
    state: Res<DashboardState>,
    style: Res<RouteStyle>,
    highlight: Res<HighlightState>,
    mut view: ResMut<MapViewState>,
    mut details: ResMut<DetailsPanel>,
    mut refresh: EventReader<RefreshViews>,
    mut select_station: EventWriter<SelectStation>,
    mut select_route: EventWriter<SelectRoute>,
) {
    let refit_requested = !refresh.is_empty();
    refresh.clear();

    let ctx = contexts.ctx_mut();
    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(MAP_BACKGROUND))
        .show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click());
            let rect = response.rect;

            if view.fit_pending || refit_requested || view.viewport != rect {
                view.viewport = rect;
                view.projection = Some(fit_projection(*level.get(), &state, rect));
                view.fit_pending = false;
            }
            let Some(projection) = view.projection.clone() else {
                return;
            };

            draw_borders(&painter, &projection, &store);

            let mut tester = HitTester::new(response.hover_pos());
            let route_path = match level.get() {
                Level::Nation => {
                    draw_nation(&painter, &projection, &store, &highlight, &mut tester);
                    Vec::new()
                }
                Level::Station => {
                    draw_station(&painter, &projection, &state, &style, &highlight, &mut tester);
                    Vec::new()
                }
                Level::Route => draw_route(&painter, &projection, &state, rect, &mut tester),
            };

            let Some(hit) = tester.best else {
                return;
            };

            match hit.shape {
                HitShape::Circle { center, radius } => {
                    painter.circle_stroke(center, radius + 2.5, egui::Stroke::new(2.0, ACCENT));
                }
                HitShape::Segment { a, b } => {
                    painter.line_segment([a, b], egui::Stroke::new(style.width + 2.0, ACCENT));
                }
            }

            match &hit.element {
                MapElement::Station(code) => {
                    details.set("Station", station_details(&store, code));
                    if response.clicked() {
                        select_station.send(SelectStation(code.clone()));
                    }
                }
                MapElement::Route(route_id) => {
                    details.set("Route", route_details(&state, route_id));
                    if response.clicked() {
                        select_route.send(SelectRoute(route_id.clone()));
                    }
                }
                MapElement::Stop(index) => {
                    details.set("Stop", stop_details(&state, &route_path, *index));
                }
                MapElement::Link(index) => {
                    details.set("Travel link", link_details(&state, &route_path, *index));
                }
            }
        });
}

/// Projection for the current level: fixed nation view, or bounds fit over
/// the scoped stops with the nation view as the empty fallback.
fn fit_projection(level: Level, state: &DashboardState, rect: egui::Rect) -> Mercator {
    let stops_to_fit: &[Stop] = match level {
        Level::Nation => &[],
        Level::Station => &state.station_stops,
        Level::Route => &state.route_stops,
    };
    Mercator::fit(
        stops_to_fit.iter().map(|s| (s.lng, s.lat)),
        rect,
        FIT_PADDING,
    )
    .unwrap_or_else(|| Mercator::nation(rect))
}

fn draw_borders(painter: &egui::Painter, projection: &Mercator, store: &DataStore) {
    let Some(borders) = &store.borders else {
        return;
    };
    let stroke = egui::Stroke::new(1.0, BORDER_COLOR);
    for ring in &borders.rings {
        let points: Vec<egui::Pos2> = ring
            .iter()
            .map(|[lng, lat]| projection.project(*lng, *lat))
            .collect();
        painter.add(egui::Shape::line(points, stroke));
    }
}

fn draw_nation(
    painter: &egui::Painter,
    projection: &Mercator,
    store: &DataStore,
    highlight: &HighlightState,
    tester: &mut HitTester,
) {
    for station in &store.stations {
        let center = projection.project(station.lng, station.lat);
        let radius = ((station.total_routes as f32).sqrt() * 0.5).max(3.0);
        painter.circle(
            center,
            radius,
            STATION_FILL,
            egui::Stroke::new(1.0, STATION_STROKE),
        );
        if highlight.station.as_deref() == Some(station.code.as_str()) {
            painter.circle_stroke(center, radius + 3.0, egui::Stroke::new(2.5, ACCENT));
        }
        tester.consider(
            MapElement::Station(station.code.clone()),
            HitShape::Circle { center, radius },
        );
    }
}

fn draw_station(
    painter: &egui::Painter,
    projection: &Mercator,
    state: &DashboardState,
    style: &RouteStyle,
    highlight: &HighlightState,
    tester: &mut HitTester,
) {
    let mut drew_any = false;
    for route in &state.filtered_routes {
        let Some(path) = drawable_path(
            &route.route_id,
            &state.station_sequences,
            &state.station_stops,
        ) else {
            continue;
        };
        drew_any = true;

        let highlighted = highlight.route.as_deref() == Some(route.route_id.as_str());
        let dimmed = highlight.route.is_some() && !highlighted;
        let fade = |color: egui::Color32| {
            if dimmed {
                color.gamma_multiply(0.15)
            } else {
                color
            }
        };

        let points: Vec<egui::Pos2> = path
            .iter()
            .map(|(_, stop)| projection.project(stop.lng, stop.lat))
            .collect();
        for (index, (a, b)) in points.iter().tuple_windows().enumerate() {
            let color = if index == 0 { style.first_leg } else { style.rest };
            let width = if highlighted { style.width + 1.5 } else { style.width };
            painter.line_segment([*a, *b], egui::Stroke::new(width, fade(color)));
            tester.consider(
                MapElement::Route(route.route_id.clone()),
                HitShape::Segment { a: *a, b: *b },
            );
        }
        for point in &points {
            painter.circle_filled(*point, 2.5, fade(STOP_DOT));
        }
        if highlighted {
            painter.add(egui::Shape::line(points, egui::Stroke::new(1.0, ACCENT)));
        }
    }

    if !drew_any {
        painter.text(
            painter.clip_rect().center(),
            egui::Align2::CENTER_CENTER,
            "No routes match the current filters.",
            egui::FontId::proportional(14.0),
            EMPTY_TEXT,
        );
    }
}

/// Draw the selected route and return its ordered path (cloned stops) for
/// the interaction phase.
fn draw_route(
    painter: &egui::Painter,
    projection: &Mercator,
    state: &DashboardState,
    rect: egui::Rect,
    tester: &mut HitTester,
) -> Vec<(u32, Stop)> {
    let Some(route_id) = state.selected_route.as_deref() else {
        return Vec::new();
    };
    let Some(path) = drawable_path(route_id, &state.station_sequences, &state.route_stops) else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Route has too few resolved stops to draw.",
            egui::FontId::proportional(14.0),
            EMPTY_TEXT,
        );
        return Vec::new();
    };

    let points: Vec<egui::Pos2> = path
        .iter()
        .map(|(_, stop)| projection.project(stop.lng, stop.lat))
        .collect();

    // Links, colored by pace where the matrix knows the pair.
    for (index, (&(_, from), &(_, to))) in path.iter().tuple_windows().enumerate() {
        let color = link_color(from, to, state.route_travel_times.as_ref());
        let (a, b) = (points[index], points[index + 1]);
        painter.line_segment([a, b], egui::Stroke::new(3.0, color));
        tester.consider(MapElement::Link(index), HitShape::Segment { a, b });
    }

    // Stop markers, colored by mean planned service time.
    let service_by_stop = mean_service_times(state);
    for (index, (_, stop)) in path.iter().enumerate() {
        let mean = service_by_stop.get(stop.stop_id.as_str()).copied();
        let fill = mean
            .map(|secs| STOP_SERVICE_SCALE.sample(secs as f32))
            .unwrap_or(UNKNOWN_LINK_COLOR);
        let center = points[index];
        painter.circle(center, 4.5, fill, egui::Stroke::new(1.0, egui::Color32::WHITE));
        tester.consider(
            MapElement::Stop(index),
            HitShape::Circle { center, radius: 4.5 },
        );
    }

    path.into_iter()
        .map(|(order, stop)| (order, stop.clone()))
        .collect()
}

fn link_color(from: &Stop, to: &Stop, matrix: Option<&TravelTimeMatrix>) -> egui::Color32 {
    let Some(seconds) = matrix.and_then(|m| m.get(&from.stop_id, &to.stop_id)) else {
        return UNKNOWN_LINK_COLOR;
    };
    let km = great_circle_km(from.lat, from.lng, to.lat, to.lng);
    LINK_PACE_SCALE.sample(link_pace_s_per_km(seconds, km) as f32)
}

/// Mean planned service time (seconds) per stop of the selected route.
fn mean_service_times(state: &DashboardState) -> HashMap<&str, f64> {
    let mut sums: HashMap<&str, (f64, u32)> = HashMap::new();
    for package in &state.route_packages {
        let entry = sums.entry(package.stop_id.as_str()).or_insert((0.0, 0));
        entry.0 += package.planned_service_time_seconds;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(stop, (sum, count))| (stop, sum / count as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Hover details
// ---------------------------------------------------------------------------

fn station_details(store: &DataStore, code: &str) -> Vec<(String, String)> {
    let Some(station) = store.stations.iter().find(|s| s.code == code) else {
        return vec![("Code".to_string(), code.to_string())];
    };
    vec![
        ("Code".to_string(), station.code.clone()),
        ("Routes".to_string(), station.total_routes.to_string()),
        (
            "Centroid".to_string(),
            format!("{:.3}, {:.3}", station.lat, station.lng),
        ),
    ]
}

fn route_details(state: &DashboardState, route_id: &str) -> Vec<(String, String)> {
    let Some(route) = state.station_routes.iter().find(|r| r.route_id == route_id) else {
        return vec![("Route".to_string(), route_id.to_string())];
    };
    let date = route
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let duration = |value: Option<f64>| {
        value
            .map(format_duration)
            .unwrap_or_else(|| "no data".to_string())
    };
    vec![
        ("Route".to_string(), route.route_id.clone()),
        ("Date".to_string(), date),
        ("Departure".to_string(), route.departure_time_utc.clone()),
        ("Score".to_string(), route.score.label().to_string()),
        (
            "Capacity".to_string(),
            format!("{:.0} cm3", route.executor_capacity_cm3),
        ),
        ("Transit time".to_string(), duration(route.total_transit_time_sec)),
        ("Service time".to_string(), duration(route.total_service_time_sec)),
    ]
}

fn stop_details(
    state: &DashboardState,
    path: &[(u32, Stop)],
    index: usize,
) -> Vec<(String, String)> {
    let Some((order, stop)) = path.get(index) else {
        return Vec::new();
    };
    let packages = state
        .route_packages
        .iter()
        .filter(|p| p.stop_id == stop.stop_id)
        .count();
    let from_previous = index
        .checked_sub(1)
        .and_then(|prev| {
            let (_, prev_stop) = path.get(prev)?;
            state
                .route_travel_times
                .as_ref()?
                .get(&prev_stop.stop_id, &stop.stop_id)
        })
        .map(|secs| format!("{secs:.0} s"))
        .unwrap_or_else(|| "n/a".to_string());
    vec![
        ("Stop".to_string(), stop.stop_id.clone()),
        ("Sequence".to_string(), order.to_string()),
        ("Zone".to_string(), stop.zone_id.clone()),
        ("Type".to_string(), stop.kind.clone()),
        ("Packages".to_string(), packages.to_string()),
        ("From previous".to_string(), from_previous),
    ]
}

fn link_details(
    state: &DashboardState,
    path: &[(u32, Stop)],
    index: usize,
) -> Vec<(String, String)> {
    let (Some((_, from)), Some((_, to))) = (path.get(index), path.get(index + 1)) else {
        return Vec::new();
    };
    let km = great_circle_km(from.lat, from.lng, to.lat, to.lng);
    let seconds = state
        .route_travel_times
        .as_ref()
        .and_then(|m| m.get(&from.stop_id, &to.stop_id));
    let time = seconds
        .map(|s| format!("{s:.0} s"))
        .unwrap_or_else(|| "unknown".to_string());
    let pace = seconds
        .map(|s| format!("{:.0} s/km", link_pace_s_per_km(s, km)))
        .unwrap_or_else(|| "unknown".to_string());
    vec![
        ("From".to_string(), from.stop_id.clone()),
        ("To".to_string(), to.stop_id.clone()),
        ("Distance".to_string(), format!("{km:.2} km")),
        ("Travel time".to_string(), time),
        ("Pace".to_string(), pace),
    ]
}
