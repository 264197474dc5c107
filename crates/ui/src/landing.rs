//! The landing page shown while the preload runs.
//!
//! Mirrors the classic "loading… / Ready! / failed, retry" flow: the
//! Discover button unlocks once the data is in, and a total load failure
//! offers a Retry instead of a blank screen.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use data::loader::{EnterDashboard, LoadStatus, RetryLoad};
use data::store::DataStore;

/// Animated dots for the loading message, cycling 1 -> 2 -> 3 -> 1.
#[derive(Resource)]
pub struct LoadingAnimation {
    pub dots: usize,
    pub timer: Timer,
}

impl Default for LoadingAnimation {
    fn default() -> Self {
        Self {
            dots: 1,
            timer: Timer::from_seconds(0.4, TimerMode::Repeating),
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn landing_ui(
    mut contexts: EguiContexts,
    status: Res<LoadStatus>,
    store: Res<DataStore>,
    time: Res<Time>,
    mut animation: ResMut<LoadingAnimation>,
    mut enter: EventWriter<EnterDashboard>,
    mut retry: EventWriter<RetryLoad>,
) {
    if animation.timer.tick(time.delta()).just_finished() {
        animation.dots = animation.dots % 3 + 1;
    }

    let ctx = contexts.ctx_mut();
    egui::CentralPanel::default().show(ctx, |ui| {
        let offset = ui.available_height() * 0.3;
        ui.add_space(offset);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Last-Mile Delivery Dashboard")
                    .size(28.0)
                    .strong(),
            );
            ui.label("Stations, routes, and stops across the network");
            ui.add_space(24.0);

            match &*status {
                LoadStatus::InProgress => {
                    ui.label(format!("Loading data{}", ".".repeat(animation.dots)));
                    ui.add_space(8.0);
                    ui.add_enabled(false, egui::Button::new("Discover"));
                }
                LoadStatus::Ready => {
                    ui.label(format!("Ready! {} stations loaded.", store.stations.len()));
                    ui.add_space(8.0);
                    if ui.button("Discover").clicked() {
                        enter.send(EnterDashboard);
                    }
                }
                LoadStatus::Failed(message) => {
                    ui.colored_label(
                        egui::Color32::from_rgb(235, 100, 90),
                        format!("Failed to load: {message}"),
                    );
                    ui.add_space(8.0);
                    if ui.button("Retry").clicked() {
                        retry.send(RetryLoad);
                    }
                }
            }
        });
    });
}
