//! Domain crate for the last-mile delivery dashboard.
//!
//! Holds the immutable [`store::DataStore`], the mutable
//! [`state::DashboardState`] session record, the level-transition state
//! machine ([`level`]), the filter engine ([`filter`]), and the lazy
//! travel-time lookup ([`travel_times`]). The rendering and ui crates
//! consume these read-only.
//!
//! # Frame ordering contract
//!
//! [`DashboardSet`] chains `Control → Derive → Panels → Map` inside
//! `Update`. Controllers mutate the session record in `Control`, the filter
//! engine recomputes derived collections in `Derive`, and every egui view
//! draws afterwards, so all views in a frame observe the same snapshot and
//! no view can see a half-updated filter set.

use bevy::prelude::*;

pub mod aggregate;
pub mod borders;
pub mod config;
pub mod filter;
pub mod format;
pub mod level;
pub mod loader;
pub mod model;
pub mod path;
pub mod state;
pub mod store;
pub mod travel_times;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod test_harness;

use config::DataConfig;
use loader::AppPhase;
use state::Level;

/// Ordered phases for the dashboard's `Update` schedule.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DashboardSet {
    /// Event handling and state mutation: level transitions, axis
    /// commands, async poll/commit.
    Control,
    /// Pure derivation from the canonical state (filtered route set).
    Derive,
    /// egui side/bottom panels (ui crate).
    Panels,
    /// The central map viewport (rendering crate); drawn last so the
    /// panels have already claimed their screen space.
    Map,
}

/// Registers the state machines, session resources, events, and the
/// controller/derivation systems. Renderer crates add their systems into
/// [`DashboardSet::Panels`] / [`DashboardSet::Map`].
pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppPhase>()
            .init_state::<Level>()
            .init_resource::<DataConfig>()
            .init_resource::<store::DataStore>()
            .init_resource::<state::DashboardState>()
            .init_resource::<loader::LoadStatus>()
            .init_resource::<loader::PreloadTask>()
            .init_resource::<travel_times::PendingTravelTimes>()
            .add_event::<level::SelectStation>()
            .add_event::<level::SelectRoute>()
            .add_event::<level::NavigateBack>()
            .add_event::<level::FiltersChanged>()
            .add_event::<level::RefreshViews>()
            .add_event::<level::ScatterAxisCommand>()
            .add_event::<loader::EnterDashboard>()
            .add_event::<loader::RetryLoad>()
            .configure_sets(
                Update,
                (
                    DashboardSet::Control,
                    DashboardSet::Derive,
                    DashboardSet::Panels,
                    DashboardSet::Map,
                )
                    .chain(),
            )
            .add_systems(OnEnter(AppPhase::Landing), loader::start_preload)
            .add_systems(OnEnter(AppPhase::Dashboard), loader::on_enter_dashboard)
            .add_systems(
                Update,
                (
                    loader::poll_preload,
                    loader::handle_retry,
                    loader::handle_enter_dashboard,
                )
                    .in_set(DashboardSet::Control)
                    .run_if(in_state(AppPhase::Landing)),
            )
            .add_systems(
                Update,
                (
                    level::handle_back_navigation,
                    level::handle_station_selection,
                    level::handle_route_selection,
                    level::handle_scatter_axis_commands,
                    travel_times::poll_travel_times,
                )
                    .chain()
                    .in_set(DashboardSet::Control)
                    .run_if(in_state(AppPhase::Dashboard)),
            )
            .add_systems(
                Update,
                filter::apply_filters
                    .in_set(DashboardSet::Derive)
                    .run_if(in_state(AppPhase::Dashboard)),
            );
    }
}
