//! Cross-view linking state.
//!
//! The scatter plot highlights map elements by identity (station code or
//! route id) through [`HighlightState`] instead of any global element
//! lookup; the map simply checks the ids it is about to draw. A highlight
//! naming an id that is not on screen is a no-op, not an error.
//!
//! [`DetailsPanel`] carries the hover details shown in the control panel,
//! written by whichever view the pointer is over.

use bevy::prelude::*;

/// Identity-based highlight requests from the scatter plot.
#[derive(Resource, Debug, Default)]
pub struct HighlightState {
    pub station: Option<String>,
    pub route: Option<String>,
}

impl HighlightState {
    pub fn clear(&mut self) {
        self.station = None;
        self.route = None;
    }
}

/// Hover details for the control panel's Details section. Keeps the last
/// hovered element until something else is hovered.
#[derive(Resource, Debug, Default)]
pub struct DetailsPanel {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl DetailsPanel {
    pub fn set(&mut self, title: impl Into<String>, rows: Vec<(String, String)>) {
        self.title = title.into();
        self.rows = rows;
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.rows.is_empty()
    }
}
