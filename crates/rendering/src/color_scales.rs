//! Fixed three-point color scales for the route view.
//!
//! Link color encodes pace (seconds of travel per great-circle kilometer)
//! through a green → yellow → red ramp clamped at both ends; stop color
//! encodes the mean planned service time of the packages at the stop
//! through a second ramp. Links with no travel-time data render in a
//! neutral color instead of pretending to be fast.

use bevy_egui::egui;

use data::travel_times::{PACE_GREEN_S_PER_KM, PACE_RED_S_PER_KM, PACE_YELLOW_S_PER_KM};

const GREEN: egui::Color32 = egui::Color32::from_rgb(76, 175, 80);
const YELLOW: egui::Color32 = egui::Color32::from_rgb(255, 235, 59);
const RED: egui::Color32 = egui::Color32::from_rgb(244, 67, 54);

/// Neutral color for links whose travel time is unknown.
pub const UNKNOWN_LINK_COLOR: egui::Color32 = egui::Color32::from_rgb(150, 150, 150);

/// Mean-service-time anchors (seconds) for stop markers.
pub const SERVICE_GREEN_SEC: f32 = 0.0;
pub const SERVICE_YELLOW_SEC: f32 = 150.0;
pub const SERVICE_RED_SEC: f32 = 300.0;

/// A piecewise-linear ramp through three (value, color) anchors, clamped
/// outside the anchor range.
pub struct ThreePointScale {
    anchors: [(f32, egui::Color32); 3],
}

/// Pace scale for travel links, anchored at the shared pace constants.
pub const LINK_PACE_SCALE: ThreePointScale = ThreePointScale {
    anchors: [
        (PACE_GREEN_S_PER_KM as f32, GREEN),
        (PACE_YELLOW_S_PER_KM as f32, YELLOW),
        (PACE_RED_S_PER_KM as f32, RED),
    ],
};

/// Service-time scale for stop markers.
pub const STOP_SERVICE_SCALE: ThreePointScale = ThreePointScale {
    anchors: [
        (SERVICE_GREEN_SEC, GREEN),
        (SERVICE_YELLOW_SEC, YELLOW),
        (SERVICE_RED_SEC, RED),
    ],
};

fn lerp_color(a: egui::Color32, b: egui::Color32, t: f32) -> egui::Color32 {
    let t = t.clamp(0.0, 1.0);
    let channel = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    egui::Color32::from_rgb(
        channel(a.r(), b.r()),
        channel(a.g(), b.g()),
        channel(a.b(), b.b()),
    )
}

impl ThreePointScale {
    /// Sample the ramp at `value`, clamping outside the anchors.
    pub fn sample(&self, value: f32) -> egui::Color32 {
        let [(v0, c0), (v1, c1), (v2, c2)] = self.anchors;
        if value <= v0 {
            c0
        } else if value <= v1 {
            lerp_color(c0, c1, (value - v0) / (v1 - v0).max(f32::EPSILON))
        } else if value <= v2 {
            lerp_color(c1, c2, (value - v1) / (v2 - v1).max(f32::EPSILON))
        } else {
            c2
        }
    }
}
