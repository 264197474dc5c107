//! Left control panel: level indicator, back navigation, station/route
//! selectors, network stats, scatter axis configuration, and the hover
//! details section.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use data::level::{NavigateBack, ScatterAxisCommand, SelectRoute, SelectStation};
use data::state::{DashboardState, Level, ScatterAxis};
use data::store::DataStore;
use rendering::highlight::DetailsPanel;

#[allow(clippy::too_many_arguments)]
pub fn control_panel_ui(
    mut contexts: EguiContexts,
    level: Res<State<Level>>,
    store: Res<DataStore>,
    state: Res<DashboardState>,
    details: Res<DetailsPanel>,
    mut back: EventWriter<NavigateBack>,
    mut select_station: EventWriter<SelectStation>,
    mut select_route: EventWriter<SelectRoute>,
    mut axis_commands: EventWriter<ScatterAxisCommand>,
) {
    let level = *level.get();
    let ctx = contexts.ctx_mut();
    egui::SidePanel::left("control_panel")
        .resizable(false)
        .default_width(235.0)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading("Delivery Network");
            ui.horizontal(|ui| {
                ui.label("Level:");
                ui.label(egui::RichText::new(level.indicator()).strong());
            });
            if ui
                .add_enabled(level != Level::Nation, egui::Button::new("\u{2190} Back"))
                .clicked()
            {
                back.send(NavigateBack);
            }
            ui.separator();

            station_selector(ui, &store, &state, &mut select_station);
            if level != Level::Nation {
                route_selector(ui, &state, &mut select_route);
            }
            ui.separator();

            if level == Level::Nation {
                network_stats(ui, &store);
                ui.separator();
            }

            axis_section(ui, &state, &mut axis_commands);
            ui.separator();

            details_section(ui, &details);
        });
}

fn station_selector(
    ui: &mut egui::Ui,
    store: &DataStore,
    state: &DashboardState,
    select_station: &mut EventWriter<SelectStation>,
) {
    ui.label("Station");
    let current = state
        .selected_station
        .clone()
        .unwrap_or_else(|| "Select a station".to_string());
    egui::ComboBox::from_id_salt("station_select")
        .width(200.0)
        .selected_text(current)
        .show_ui(ui, |ui| {
            for station in &store.stations {
                let selected = state.selected_station.as_deref() == Some(station.code.as_str());
                let text = format!("{} ({} routes)", station.code, station.total_routes);
                if ui.selectable_label(selected, text).clicked() && !selected {
                    select_station.send(SelectStation(station.code.clone()));
                }
            }
        });
}

fn route_selector(
    ui: &mut egui::Ui,
    state: &DashboardState,
    select_route: &mut EventWriter<SelectRoute>,
) {
    ui.label("Route");
    let current = state
        .selected_route
        .clone()
        .unwrap_or_else(|| "Select a route".to_string());
    egui::ComboBox::from_id_salt("route_select")
        .width(200.0)
        .selected_text(current)
        .show_ui(ui, |ui| {
            for route in &state.station_routes {
                let selected = state.selected_route.as_deref() == Some(route.route_id.as_str());
                if ui.selectable_label(selected, &route.route_id).clicked() && !selected {
                    select_route.send(SelectRoute(route.route_id.clone()));
                }
            }
        });
}

/// Aggregate stats across all loaded stations, shown on the nation view.
fn network_stats(ui: &mut egui::Ui, store: &DataStore) {
    ui.label(egui::RichText::new("Network").strong());
    ui.label(format!("Total routes: {}", store.total_route_count()));
    match store.average_stops_per_route() {
        Some(avg) => ui.label(format!("Avg stops per route: {avg:.2}")),
        None => ui.label("Avg stops per route: n/a"),
    };
}

fn axis_section(
    ui: &mut egui::Ui,
    state: &DashboardState,
    axis_commands: &mut EventWriter<ScatterAxisCommand>,
) {
    ui.label(egui::RichText::new("Scatter axes").strong());
    axis_combo(ui, "axis_x", "X", state.scatter_x, axis_commands, ScatterAxisCommand::SetX);
    axis_combo(ui, "axis_y", "Y", state.scatter_y, axis_commands, ScatterAxisCommand::SetY);
    if ui.button("Swap axes").clicked() {
        axis_commands.send(ScatterAxisCommand::Swap);
    }
}

fn axis_combo(
    ui: &mut egui::Ui,
    salt: &str,
    label: &str,
    current: ScatterAxis,
    axis_commands: &mut EventWriter<ScatterAxisCommand>,
    make: fn(ScatterAxis) -> ScatterAxisCommand,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(salt.to_string())
            .width(185.0)
            .selected_text(current.label())
            .show_ui(ui, |ui| {
                for axis in ScatterAxis::ALL {
                    if ui.selectable_label(axis == current, axis.label()).clicked()
                        && axis != current
                    {
                        axis_commands.send(make(axis));
                    }
                }
            });
    });
}

fn details_section(ui: &mut egui::Ui, details: &DetailsPanel) {
    ui.label(egui::RichText::new("Details").strong());
    if details.is_empty() {
        ui.small("Hover the map or the charts.");
        return;
    }
    ui.label(&details.title);
    egui::Grid::new("details_grid")
        .num_columns(2)
        .spacing([8.0, 2.0])
        .show(ui, |ui| {
            for (key, value) in &details.rows {
                ui.small(key);
                ui.small(value);
                ui.end_row();
            }
        });
}
