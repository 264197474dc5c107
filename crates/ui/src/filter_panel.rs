//! Right-hand filter panel, visible only at Station level.
//!
//! Edits accumulate in a draft and reach the session record only through
//! `FiltersChanged` on Apply, so no renderer ever observes a half-updated
//! filter set. The status line echoes the derived result plus one tag per
//! active criterion.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use chrono::NaiveDate;

use data::level::FiltersChanged;
use data::model::RouteScore;
use data::state::{DashboardState, Filters, Level};
use data::store::DataStore;

/// Pending filter edits, re-synced from the session record whenever the
/// selected station changes.
#[derive(Resource, Default)]
pub struct FilterDraft {
    pub filters: Filters,
    pub synced_station: Option<String>,
}

pub fn filter_panel_ui(
    mut contexts: EguiContexts,
    level: Res<State<Level>>,
    store: Res<DataStore>,
    state: Res<DashboardState>,
    mut draft: ResMut<FilterDraft>,
    mut filters_changed: EventWriter<FiltersChanged>,
) {
    if *level.get() != Level::Station {
        return;
    }

    if draft.synced_station != state.selected_station {
        draft.filters = state.filters.clone();
        draft.synced_station = state.selected_station.clone();
    }

    let ctx = contexts.ctx_mut();
    egui::SidePanel::right("filter_panel")
        .resizable(false)
        .default_width(225.0)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading("Filter");

            ui.label(egui::RichText::new("Route Score").strong());
            for score in RouteScore::KNOWN {
                let mut checked = draft.filters.scores.contains(&score);
                if ui.checkbox(&mut checked, score.label()).changed() {
                    if checked {
                        draft.filters.scores.insert(score);
                    } else {
                        draft.filters.scores.remove(&score);
                    }
                }
            }
            ui.separator();

            ui.label(egui::RichText::new("Date Range").strong());
            let dates = state.filter_options.dates.clone();
            date_combo(ui, "date_min", "From", &dates, &mut draft.filters.date_min);
            date_combo(ui, "date_max", "To", &dates, &mut draft.filters.date_max);
            ui.separator();

            ui.label(egui::RichText::new("Zones").strong());
            ui.small("No selection = all zones");
            egui::ScrollArea::vertical()
                .max_height(150.0)
                .show(ui, |ui| {
                    for zone in &state.filter_options.zones {
                        let mut checked = draft.filters.zones.contains(zone);
                        if ui.checkbox(&mut checked, zone).changed() {
                            if checked {
                                draft.filters.zones.insert(zone.clone());
                            } else {
                                draft.filters.zones.remove(zone);
                            }
                        }
                    }
                });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Apply").clicked() {
                    filters_changed.send(FiltersChanged(draft.filters.clone()));
                }
                if ui.button("Reset").clicked() {
                    draft.filters = Filters::all_pass(store.date_bounds());
                    filters_changed.send(FiltersChanged(draft.filters.clone()));
                }
            });
            ui.add_space(4.0);
            status_line(ui, &store, &state);
        });
}

fn date_combo(
    ui: &mut egui::Ui,
    salt: &str,
    label: &str,
    dates: &[NaiveDate],
    slot: &mut Option<NaiveDate>,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        let text = slot
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "any".to_string());
        egui::ComboBox::from_id_salt(salt.to_string())
            .width(150.0)
            .selected_text(text)
            .show_ui(ui, |ui| {
                for date in dates {
                    let selected = *slot == Some(*date);
                    if ui
                        .selectable_label(selected, date.format("%Y-%m-%d").to_string())
                        .clicked()
                    {
                        *slot = Some(*date);
                    }
                }
            });
    });
}

/// "Filtered N routes" plus one tag per criterion that actually narrows.
fn status_line(ui: &mut egui::Ui, store: &DataStore, state: &DashboardState) {
    ui.label(format!(
        "Filtered {} of {} routes",
        state.filtered_routes.len(),
        state.station_routes.len()
    ));

    let filters = &state.filters;
    let mut tags = Vec::new();
    if filters.scores.len() < RouteScore::KNOWN.len() {
        let mut names: Vec<&str> = filters.scores.iter().map(|s| s.label()).collect();
        names.sort_unstable();
        tags.push(format!("Score: {}", names.join(", ")));
    }
    if let (Some((bound_min, bound_max)), Some(min), Some(max)) =
        (store.date_bounds(), filters.date_min, filters.date_max)
    {
        if min != bound_min || max != bound_max {
            tags.push(format!(
                "Date: {} - {}",
                min.format("%Y-%m-%d"),
                max.format("%Y-%m-%d")
            ));
        }
    }
    if !filters.zones.is_empty() {
        let mut zones: Vec<&str> = filters.zones.iter().map(String::as_str).collect();
        zones.sort_unstable();
        tags.push(format!("Zones: {}", zones.join(", ")));
    }

    ui.horizontal_wrapped(|ui| {
        for tag in tags {
            ui.small(
                egui::RichText::new(tag)
                    .background_color(egui::Color32::from_rgb(52, 58, 76)),
            );
        }
    });
}
