//! The three pie charts: route-score distribution, departure-time-of-day
//! buckets, and delivered-vs-other package outcomes.
//!
//! Each chart aggregates over the population of the current level, drops
//! zero-count categories, and (for the departure chart) suppresses slices
//! too thin to label. Hover shows "label: count (pct%)".

use bevy_egui::egui;

use data::aggregate::{
    build_pie_slices, delivered_counts, departure_counts, packages_for_level, routes_for_level,
    score_counts, PieSlice, DEPARTURE_SLIVER_PERCENT, TIME_INTERVALS,
};
use data::state::{DashboardState, Level};
use data::store::DataStore;

use crate::charts::hover_tooltip;

const TEXT_COLOR: egui::Color32 = egui::Color32::from_rgb(190, 194, 206);
const FALLBACK_SLICE: egui::Color32 = egui::Color32::from_rgb(130, 130, 130);
const LABEL_OFFSET: f32 = 12.0;

const SCORE_COLORS: [(&str, egui::Color32); 4] = [
    ("High", egui::Color32::from_rgb(215, 48, 39)),
    ("Medium", egui::Color32::from_rgb(252, 141, 89)),
    ("Low", egui::Color32::from_rgb(145, 191, 219)),
    ("UNKNOWN", egui::Color32::from_rgb(150, 150, 150)),
];

const DELIVERED_COLORS: [(&str, egui::Color32); 2] = [
    ("DELIVERED", egui::Color32::from_rgb(76, 175, 80)),
    ("OTHER", egui::Color32::from_rgb(255, 87, 34)),
];

const INTERVAL_COLORS: [egui::Color32; 12] = [
    egui::Color32::from_rgb(255, 204, 128),
    egui::Color32::from_rgb(255, 224, 130),
    egui::Color32::from_rgb(255, 241, 118),
    egui::Color32::from_rgb(174, 213, 129),
    egui::Color32::from_rgb(129, 199, 132),
    egui::Color32::from_rgb(77, 182, 172),
    egui::Color32::from_rgb(79, 195, 247),
    egui::Color32::from_rgb(100, 181, 246),
    egui::Color32::from_rgb(186, 104, 200),
    egui::Color32::from_rgb(149, 117, 205),
    egui::Color32::from_rgb(161, 136, 127),
    egui::Color32::from_rgb(144, 164, 174),
];

fn score_color(label: &str) -> egui::Color32 {
    SCORE_COLORS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_SLICE)
}

fn delivered_color(label: &str) -> egui::Color32 {
    DELIVERED_COLORS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_SLICE)
}

fn interval_color(label: &str) -> egui::Color32 {
    TIME_INTERVALS
        .iter()
        .position(|t| t.label == label)
        .map(|index| INTERVAL_COLORS[index])
        .unwrap_or(FALLBACK_SLICE)
}

pub fn draw_pies(ui: &mut egui::Ui, level: Level, store: &DataStore, state: &DashboardState) {
    let routes = routes_for_level(level, store, state);
    let packages = packages_for_level(level, store, state);

    let score_slices = build_pie_slices(&score_counts(routes.iter().copied()), 0.0);
    let departure_slices = build_pie_slices(
        &departure_counts(routes.iter().copied()),
        DEPARTURE_SLIVER_PERCENT,
    );
    let delivered_slices = build_pie_slices(&delivered_counts(packages.into_iter()), 0.0);

    ui.columns(3, |columns| {
        draw_pie(&mut columns[0], "Route Score", &score_slices, score_color);
        draw_pie(
            &mut columns[1],
            "Departure Time (UTC)",
            &departure_slices,
            interval_color,
        );
        draw_pie(
            &mut columns[2],
            "Delivered",
            &delivered_slices,
            delivered_color,
        );
    });
}

fn draw_pie(
    ui: &mut egui::Ui,
    title: &str,
    slices: &[PieSlice],
    color_of: fn(&str) -> egui::Color32,
) {
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new(title).small().strong());
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::hover());
        let rect = response.rect;
        let radius = (rect.width().min(rect.height()) / 2.0 - LABEL_OFFSET - 10.0).max(12.0);
        let center = rect.center();

        if slices.is_empty() {
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                "No data",
                egui::FontId::proportional(12.0),
                TEXT_COLOR,
            );
            return;
        }

        let total: u64 = slices.iter().map(|s| s.value).sum();
        let pointer = response.hover_pos();
        let mut hovered: Option<&PieSlice> = None;

        let mut angle = -std::f32::consts::FRAC_PI_2;
        for slice in slices {
            let span = (slice.value as f32 / total as f32) * std::f32::consts::TAU;
            let color = color_of(&slice.label);
            fill_wedge(&painter, center, radius, angle, angle + span, color);

            // Label just outside the arc midpoint.
            let mid = angle + span / 2.0;
            painter.text(
                center + egui::vec2(mid.cos(), mid.sin()) * (radius + LABEL_OFFSET),
                egui::Align2::CENTER_CENTER,
                &slice.label,
                egui::FontId::proportional(10.0),
                TEXT_COLOR,
            );

            if let Some(p) = pointer {
                let offset = p - center;
                if offset.length() <= radius {
                    let pointer_angle = offset.y.atan2(offset.x);
                    let normalized = (pointer_angle - angle).rem_euclid(std::f32::consts::TAU);
                    if normalized < span {
                        hovered = Some(slice);
                    }
                }
            }
            angle += span;
        }

        if let (Some(slice), Some(p)) = (hovered, pointer) {
            let line = format!("{}: {} ({:.1}%)", slice.label, slice.value, slice.percent);
            hover_tooltip(ui.ctx(), &format!("pie_tooltip_{title}"), p, &[line]);
        }
    });
}

/// Fill a circular wedge as a fan of small triangles (each one convex).
fn fill_wedge(
    painter: &egui::Painter,
    center: egui::Pos2,
    radius: f32,
    start: f32,
    end: f32,
    color: egui::Color32,
) {
    let span = end - start;
    let segments = ((span / 0.2).ceil() as usize).max(2);
    let step = span / segments as f32;
    for i in 0..segments {
        let a0 = start + step * i as f32;
        let a1 = a0 + step;
        let p0 = center + egui::vec2(a0.cos(), a0.sin()) * radius;
        let p1 = center + egui::vec2(a1.cos(), a1.sin()) * radius;
        painter.add(egui::Shape::convex_polygon(
            vec![center, p0, p1],
            color,
            egui::Stroke::NONE,
        ));
    }
}
