//! egui panels for the dashboard: landing page, control panel, filter
//! panel, route inspector, and the charts strip (scatter + pies).
//!
//! Panel systems run in [`DashboardSet::Panels`], chained so egui carves
//! the screen deterministically: left control panel, right panel (filters
//! or inspector), bottom charts, and finally the central map claimed by
//! the rendering crate.

use bevy::prelude::*;
use bevy_egui::EguiPlugin;

pub mod charts;
pub mod control_panel;
pub mod filter_panel;
pub mod inspector;
pub mod landing;
pub mod pies;
pub mod scatter;
pub mod theme;

use data::loader::AppPhase;
use data::DashboardSet;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<landing::LoadingAnimation>()
            .init_resource::<filter_panel::FilterDraft>()
            .init_resource::<scatter::ScatterAnim>()
            .add_systems(Startup, theme::apply_dashboard_theme)
            .add_systems(
                Update,
                landing::landing_ui
                    .in_set(DashboardSet::Panels)
                    .run_if(in_state(AppPhase::Landing)),
            )
            .add_systems(
                Update,
                (
                    control_panel::control_panel_ui,
                    filter_panel::filter_panel_ui,
                    inspector::route_inspector_ui,
                    charts::charts_panel_ui,
                )
                    .chain()
                    .in_set(DashboardSet::Panels)
                    .run_if(in_state(AppPhase::Dashboard)),
            );
    }
}
