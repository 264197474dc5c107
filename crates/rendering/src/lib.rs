//! Map rendering for the dashboard.
//!
//! Owns the central map viewport ([`map`]), the Mercator projection with
//! fit-to-bounds ([`projection`]), the fixed three-point color scales
//! ([`color_scales`]), and the identity-based cross-view highlight registry
//! ([`highlight`]).

use bevy::prelude::*;

pub mod color_scales;
pub mod highlight;
pub mod map;
pub mod projection;

use data::loader::AppPhase;
use data::DashboardSet;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<map::MapViewState>()
            .init_resource::<map::RouteStyle>()
            .init_resource::<highlight::HighlightState>()
            .init_resource::<highlight::DetailsPanel>()
            .add_systems(
                Update,
                map::map_ui
                    .in_set(DashboardSet::Map)
                    .run_if(in_state(AppPhase::Dashboard)),
            );
    }
}
