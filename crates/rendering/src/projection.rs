//! Web-Mercator projection with fit-to-bounds.
//!
//! The map uses a fixed continental view at Nation level and a
//! bounding-box fit at Station/Route level. Only forward projection is
//! needed; interaction hit-testing happens in screen space.

use bevy_egui::egui;

/// Fixed nation-view scale (projection units per radian).
pub const NATION_SCALE: f64 = 700.0;
/// Nation-view center (lng, lat).
pub const NATION_CENTER: (f64, f64) = (-95.0, 40.0);
/// Screen padding for bounding-box fits, in pixels.
pub const FIT_PADDING: f32 = 20.0;

/// Mercator is undefined at the poles; clamp latitudes to the usual web
/// map range.
const MAX_LAT: f64 = 85.0;

/// Upper bound on the fit scale so a single-point "bounding box" doesn't
/// explode the projection.
const MAX_FIT_SCALE: f64 = 1.0e8;

fn merc_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln()
}

/// A fitted Mercator projection: lng/lat in, screen pixels out.
#[derive(Debug, Clone)]
pub struct Mercator {
    scale: f64,
    center_x: f64,
    center_y: f64,
    translate: egui::Pos2,
}

impl Mercator {
    /// The fixed whole-region view centered on [`NATION_CENTER`].
    pub fn nation(rect: egui::Rect) -> Self {
        Self {
            scale: NATION_SCALE,
            center_x: NATION_CENTER.0.to_radians(),
            center_y: merc_y(NATION_CENTER.1),
            translate: rect.center(),
        }
    }

    /// Fit the bounding box of `(lng, lat)` points into `rect` with
    /// `padding` pixels on every side. `None` when there are no points.
    pub fn fit(
        points: impl IntoIterator<Item = (f64, f64)>,
        rect: egui::Rect,
        padding: f32,
    ) -> Option<Self> {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut any = false;
        for (lng, lat) in points {
            let x = lng.to_radians();
            let y = merc_y(lat);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
            any = true;
        }
        if !any {
            return None;
        }

        let span_x = (max_x - min_x).max(1e-12);
        let span_y = (max_y - min_y).max(1e-12);
        let avail_w = (rect.width() - 2.0 * padding).max(1.0) as f64;
        let avail_h = (rect.height() - 2.0 * padding).max(1.0) as f64;
        let scale = (avail_w / span_x).min(avail_h / span_y).min(MAX_FIT_SCALE);

        Some(Self {
            scale,
            center_x: (min_x + max_x) / 2.0,
            center_y: (min_y + max_y) / 2.0,
            translate: rect.center(),
        })
    }

    /// Project to screen coordinates (y grows downward).
    pub fn project(&self, lng: f64, lat: f64) -> egui::Pos2 {
        let x = self.translate.x as f64 + self.scale * (lng.to_radians() - self.center_x);
        let y = self.translate.y as f64 - self.scale * (merc_y(lat) - self.center_y);
        egui::pos2(x as f32, y as f32)
    }
}
