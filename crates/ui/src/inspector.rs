//! Route inspector, shown in the right panel at Route level: the ordered
//! stop table with package counts and per-leg travel times, plus the
//! aggregate transit time computed from the matrix.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use data::format::format_duration;
use data::path::drawable_path;
use data::state::{DashboardState, Level};
use data::travel_times::route_transit_time_sec;

pub fn route_inspector_ui(
    mut contexts: EguiContexts,
    level: Res<State<Level>>,
    state: Res<DashboardState>,
) {
    if *level.get() != Level::Route {
        return;
    }

    let ctx = contexts.ctx_mut();
    egui::SidePanel::right("route_inspector")
        .resizable(false)
        .default_width(270.0)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading("Route Inspector");
            let Some(route) = state.selected_route_record() else {
                ui.label("No route selected.");
                return;
            };

            ui.label(egui::RichText::new(&route.route_id).strong());
            ui.label(format!("Score: {}", route.score.label()));
            if let Some(date) = route.date {
                ui.label(format!("Date: {}", date.format("%Y-%m-%d")));
            }
            ui.label(format!("Departure: {} UTC", route.departure_time_utc));
            ui.separator();

            let path = drawable_path(
                &route.route_id,
                &state.station_sequences,
                &state.route_stops,
            );
            let transit = match (&state.route_travel_times, &path) {
                (Some(matrix), Some(path)) => {
                    format_duration(route_transit_time_sec(path, matrix))
                }
                _ => "unknown".to_string(),
            };
            ui.label(format!("Transit time (matrix): {transit}"));
            if let Some(total) = route.total_service_time_sec {
                ui.label(format!("Service time: {}", format_duration(total)));
            }
            ui.separator();

            let Some(path) = path else {
                ui.label("Too few resolved stops to list.");
                return;
            };

            let mut package_counts: HashMap<&str, usize> = HashMap::new();
            for package in &state.route_packages {
                *package_counts.entry(package.stop_id.as_str()).or_default() += 1;
            }

            ui.label(egui::RichText::new("Stops").strong());
            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::Grid::new("route_stop_table")
                    .num_columns(4)
                    .striped(true)
                    .spacing([10.0, 2.0])
                    .show(ui, |ui| {
                        ui.small("Seq");
                        ui.small("Stop");
                        ui.small("Pkgs");
                        ui.small("From prev");
                        ui.end_row();

                        for (index, (order, stop)) in path.iter().enumerate() {
                            ui.small(order.to_string());
                            ui.small(&stop.stop_id);
                            ui.small(
                                package_counts
                                    .get(stop.stop_id.as_str())
                                    .copied()
                                    .unwrap_or(0)
                                    .to_string(),
                            );
                            let from_prev = index
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
                            ui.small(from_prev);
                            ui.end_row();
                        }
                    });
            });
        });
}
