//! The per-route scatter plot.
//!
//! One point per route in the current level's population, on two
//! selectable numeric axes; routes missing either value are excluded
//! rather than plotted at zero. Enter/update/exit is animated per route id
//! so unchanged points never flicker, and hovering a point highlights its
//! map counterpart by identity through [`HighlightState`].

use std::collections::HashMap;

use bevy::prelude::*;
use bevy_egui::egui;

use data::aggregate::routes_for_level;
use data::format::{format_duration, format_duration_short, format_magnitude};
use data::model::Route;
use data::state::{DashboardState, Level};
use data::store::DataStore;
use rendering::highlight::{DetailsPanel, HighlightState};

use crate::charts::hover_tooltip;

const DOT_COLOR: egui::Color32 = egui::Color32::from_rgb(70, 130, 180);
const DOT_HOVER: egui::Color32 = egui::Color32::from_rgb(255, 196, 0);
const AXIS_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 126, 142);
const TEXT_COLOR: egui::Color32 = egui::Color32::from_rgb(190, 194, 206);

const TARGET_RADIUS: f32 = 4.0;
/// Exponential easing rate for the enter/update/exit transitions.
const EASE_RATE: f32 = 8.0;
/// Pointer pick distance in pixels.
const PICK_DISTANCE: f32 = 8.0;

/// Per-route-id dot animation state. Keyed by identity, not index, so a
/// re-filter moves surviving dots instead of recreating them.
pub struct DotAnim {
    pub pos: egui::Pos2,
    pub radius: f32,
}

#[derive(Resource, Default)]
pub struct ScatterAnim {
    pub dots: HashMap<String, DotAnim>,
}

#[allow(clippy::too_many_arguments)]
pub fn draw_scatter(
    ui: &mut egui::Ui,
    level: Level,
    store: &DataStore,
    state: &DashboardState,
    anim: &mut ScatterAnim,
    highlight: &mut HighlightState,
    details: &mut DetailsPanel,
    dt: f32,
) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::hover());
    let rect = response.rect;
    let plot = egui::Rect::from_min_max(
        rect.min + egui::vec2(56.0, 26.0),
        rect.max - egui::vec2(14.0, 34.0),
    );

    let x_axis = state.scatter_x;
    let y_axis = state.scatter_y;
    painter.text(
        egui::pos2(plot.center().x, rect.top() + 12.0),
        egui::Align2::CENTER_CENTER,
        format!("{} vs {} per Route", x_axis.label(), y_axis.label()),
        egui::FontId::proportional(13.0),
        TEXT_COLOR,
    );

    // Routes lacking either axis value are excluded, not zeroed.
    let points: Vec<(&Route, f64, f64)> = routes_for_level(level, store, state)
        .into_iter()
        .filter_map(|route| Some((route, x_axis.value(route)?, y_axis.value(route)?)))
        .collect();

    if points.is_empty() {
        anim.dots.clear();
        painter.text(
            plot.center(),
            egui::Align2::CENTER_CENTER,
            "No data available to display.",
            egui::FontId::proportional(13.0),
            TEXT_COLOR,
        );
        return;
    }

    let (x_lo, x_hi, x_ticks) = axis_ticks(
        points.iter().map(|(_, x, _)| *x),
        x_axis.is_duration(),
    );
    let (y_lo, y_hi, y_ticks) = axis_ticks(
        points.iter().map(|(_, _, y)| *y),
        y_axis.is_duration(),
    );
    let to_x = |v: f64| {
        plot.left() + ((v - x_lo) / (x_hi - x_lo)) as f32 * plot.width()
    };
    let to_y = |v: f64| {
        plot.bottom() - ((v - y_lo) / (y_hi - y_lo)) as f32 * plot.height()
    };

    draw_axes(&painter, plot, &x_ticks, &y_ticks, x_axis.is_duration(), y_axis.is_duration(), to_x, to_y);
    draw_axis_titles(&painter, rect, plot, x_axis.label(), y_axis.label());

    // Ease dots toward their targets; absent ids shrink out and drop.
    let targets: HashMap<&str, (egui::Pos2, &Route)> = points
        .iter()
        .map(|(route, x, y)| {
            (
                route.route_id.as_str(),
                (egui::pos2(to_x(*x), to_y(*y)), *route),
            )
        })
        .collect();
    for (id, (target, _)) in &targets {
        anim.dots.entry(id.to_string()).or_insert(DotAnim {
            pos: *target,
            radius: 0.0,
        });
    }
    let ease = (dt * EASE_RATE).clamp(0.0, 1.0);
    anim.dots.retain(|id, dot| match targets.get(id.as_str()) {
        Some((target, _)) => {
            dot.pos += (*target - dot.pos) * ease;
            dot.radius += (TARGET_RADIUS - dot.radius) * ease;
            true
        }
        None => {
            dot.radius *= 1.0 - ease;
            dot.radius > 0.05
        }
    });

    // Draw and pick.
    let pointer = response.hover_pos();
    let mut hovered: Option<(&Route, egui::Pos2, f32)> = None;
    for (id, dot) in &anim.dots {
        let Some((_, route)) = targets.get(id.as_str()) else {
            painter.circle_filled(dot.pos, dot.radius, DOT_COLOR.gamma_multiply(0.6));
            continue;
        };
        let is_hovered = pointer.is_some_and(|p| (p - dot.pos).length() <= PICK_DISTANCE)
            && hovered.as_ref().is_none_or(|(_, pos, _)| {
                (pointer.unwrap() - dot.pos).length() < (pointer.unwrap() - *pos).length()
            });
        if is_hovered {
            hovered = Some((route, dot.pos, dot.radius));
        }
        painter.circle_filled(dot.pos, dot.radius, DOT_COLOR);
    }

    match hovered {
        Some((route, pos, radius)) => {
            painter.circle_stroke(pos, radius + 2.0, egui::Stroke::new(2.0, DOT_HOVER));
            let lines = tooltip_lines(route);
            hover_tooltip(ui.ctx(), "scatter_tooltip", pointer.unwrap_or(pos), &lines);
            details.set(
                "Route",
                lines
                    .iter()
                    .filter_map(|line| {
                        let (key, value) = line.split_once(": ")?;
                        Some((key.to_string(), value.to_string()))
                    })
                    .collect(),
            );
            // Identity-based cross-highlight; absence of the id on the map
            // is fine, the map just draws nothing extra.
            highlight.clear();
            match level {
                Level::Nation => highlight.station = Some(route.station_code.clone()),
                Level::Station => highlight.route = Some(route.route_id.clone()),
                Level::Route => {}
            }
        }
        None => highlight.clear(),
    }
}

fn tooltip_lines(route: &Route) -> Vec<String> {
    let duration = |value: Option<f64>| {
        value
            .map(format_duration)
            .unwrap_or_else(|| "no data".to_string())
    };
    vec![
        format!("Route: {}", route.route_id),
        format!("Station: {}", route.station_code),
        format!("Departure: {}", route.departure_time_utc),
        format!("Score: {}", route.score.label()),
        format!("Transit: {}", duration(route.total_transit_time_sec)),
        format!("Service: {}", duration(route.total_service_time_sec)),
    ]
}

/// Padded tick domain: duration axes snap to half-hour multiples, other
/// axes to a 1/2/5 step.
fn axis_ticks(
    values: impl Iterator<Item = f64>,
    duration: bool,
) -> (f64, f64, Vec<f64>) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    let span = (max - min).max(1e-9);
    let step = if duration {
        1800.0 * (span / 1800.0 / 6.0).ceil().max(1.0)
    } else {
        nice_step(span / 5.0)
    };
    let lo = (min / step).floor() * step;
    let mut hi = (max / step).ceil() * step;
    if hi - lo < step / 2.0 {
        hi = lo + step;
    }
    let mut ticks = Vec::new();
    let mut v = lo;
    while v <= hi + step * 0.5 {
        ticks.push(v);
        v += step;
    }
    (lo, hi, ticks)
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.max(1e-9).log10().floor());
    let normalized = raw / magnitude;
    if normalized < 1.5 {
        magnitude
    } else if normalized < 3.5 {
        2.0 * magnitude
    } else if normalized < 7.5 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_axes(
    painter: &egui::Painter,
    plot: egui::Rect,
    x_ticks: &[f64],
    y_ticks: &[f64],
    x_duration: bool,
    y_duration: bool,
    to_x: impl Fn(f64) -> f32,
    to_y: impl Fn(f64) -> f32,
) {
    let stroke = egui::Stroke::new(1.0, AXIS_COLOR);
    painter.line_segment(
        [plot.left_bottom(), plot.right_bottom()],
        stroke,
    );
    painter.line_segment([plot.left_top(), plot.left_bottom()], stroke);

    let label = |v: f64, duration: bool| {
        if duration {
            format_duration_short(v)
        } else {
            format_magnitude(v)
        }
    };
    for &tick in x_ticks {
        let x = to_x(tick);
        painter.line_segment(
            [egui::pos2(x, plot.bottom()), egui::pos2(x, plot.bottom() + 4.0)],
            stroke,
        );
        painter.text(
            egui::pos2(x, plot.bottom() + 14.0),
            egui::Align2::CENTER_CENTER,
            label(tick, x_duration),
            egui::FontId::proportional(10.0),
            TEXT_COLOR,
        );
    }
    for &tick in y_ticks {
        let y = to_y(tick);
        painter.line_segment(
            [egui::pos2(plot.left() - 4.0, y), egui::pos2(plot.left(), y)],
            stroke,
        );
        painter.text(
            egui::pos2(plot.left() - 6.0, y),
            egui::Align2::RIGHT_CENTER,
            label(tick, y_duration),
            egui::FontId::proportional(10.0),
            TEXT_COLOR,
        );
    }
}

fn draw_axis_titles(
    painter: &egui::Painter,
    rect: egui::Rect,
    plot: egui::Rect,
    x_label: &str,
    y_label: &str,
) {
    painter.text(
        egui::pos2(plot.center().x, rect.bottom() - 8.0),
        egui::Align2::CENTER_CENTER,
        x_label,
        egui::FontId::proportional(11.0),
        TEXT_COLOR,
    );
    let galley = painter.layout_no_wrap(
        y_label.to_string(),
        egui::FontId::proportional(11.0),
        TEXT_COLOR,
    );
    let height = galley.size().x;
    painter.add(
        egui::epaint::TextShape::new(
            egui::pos2(rect.left() + 4.0, plot.center().y + height / 2.0),
            galley,
            TEXT_COLOR,
        )
        .with_angle(-std::f32::consts::FRAC_PI_2),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_ticks_snap_to_half_hours() {
        let (lo, hi, ticks) = axis_ticks([2100.0, 7900.0].into_iter(), true);
        assert_eq!(lo, 1800.0);
        assert_eq!(hi, 9000.0);
        assert!(ticks.iter().all(|t| t % 1800.0 == 0.0));
        assert_eq!(*ticks.first().unwrap(), lo);
        assert_eq!(*ticks.last().unwrap(), hi);
    }

    #[test]
    fn test_single_value_domain_is_nonzero() {
        let (lo, hi, ticks) = axis_ticks([3600.0].into_iter(), true);
        assert!(hi > lo);
        assert!(ticks.len() >= 2);
    }

    #[test]
    fn test_nice_step_magnitudes() {
        assert_eq!(nice_step(1.0), 1.0);
        assert_eq!(nice_step(3.0), 2.0);
        assert_eq!(nice_step(40.0), 50.0);
        assert_eq!(nice_step(900_000.0), 1_000_000.0);
    }
}
