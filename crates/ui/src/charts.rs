//! Bottom charts panel: the scatter plot on the left, the three pie charts
//! on the right. One system owns the panel so both halves draw from the
//! same frame snapshot.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use data::state::{DashboardState, Level};
use data::store::DataStore;
use rendering::highlight::{DetailsPanel, HighlightState};

use crate::pies;
use crate::scatter::{self, ScatterAnim};

const PANEL_HEIGHT: f32 = 252.0;

#[allow(clippy::too_many_arguments)]
pub fn charts_panel_ui(
    mut contexts: EguiContexts,
    level: Res<State<Level>>,
    store: Res<DataStore>,
    state: Res<DashboardState>,
    time: Res<Time>,
    mut anim: ResMut<ScatterAnim>,
    mut highlight: ResMut<HighlightState>,
    mut details: ResMut<DetailsPanel>,
) {
    let level = *level.get();
    let ctx = contexts.ctx_mut();
    egui::TopBottomPanel::bottom("charts")
        .exact_height(PANEL_HEIGHT)
        .show(ctx, |ui| {
            ui.columns(2, |columns| {
                scatter::draw_scatter(
                    &mut columns[0],
                    level,
                    &store,
                    &state,
                    &mut anim,
                    &mut highlight,
                    &mut details,
                    time.delta_secs(),
                );
                pies::draw_pies(&mut columns[1], level, &store, &state);
            });
        });
}

/// Small floating tooltip near the pointer, shared by both chart halves.
pub(crate) fn hover_tooltip(ctx: &egui::Context, id: &str, pos: egui::Pos2, lines: &[String]) {
    egui::Area::new(egui::Id::new(id))
        .order(egui::Order::Tooltip)
        .fixed_pos(pos + egui::vec2(14.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                for line in lines {
                    ui.small(line);
                }
            });
        });
}
