use bevy_egui::{egui, EguiContexts};

/// Shared dark theme for every panel.
pub fn apply_dashboard_theme(mut contexts: EguiContexts) {
    let ctx = contexts.ctx_mut();
    let mut style = (*ctx.style()).clone();

    let panel = egui::Color32::from_rgb(32, 34, 44);
    let inactive = egui::Color32::from_rgb(46, 50, 62);
    let hover = egui::Color32::from_rgb(64, 72, 92);
    let active = egui::Color32::from_rgb(90, 150, 210);

    style.visuals.widgets.noninteractive.bg_fill = panel;
    style.visuals.widgets.inactive.bg_fill = inactive;
    style.visuals.widgets.hovered.bg_fill = hover;
    style.visuals.widgets.active.bg_fill = active;
    style.visuals.widgets.inactive.weak_bg_fill = inactive;
    style.visuals.widgets.hovered.weak_bg_fill = hover;
    style.visuals.widgets.active.weak_bg_fill = active;

    style.visuals.window_fill = panel;
    style.visuals.panel_fill = panel;
    style.visuals.extreme_bg_color = egui::Color32::from_rgb(26, 28, 36);
    style.visuals.faint_bg_color = egui::Color32::from_rgb(38, 40, 50);

    style.visuals.selection.bg_fill = active;
    style.visuals.selection.stroke = egui::Stroke::new(1.0, active);

    let widget_rounding = egui::CornerRadius::same(5);
    style.visuals.window_corner_radius = egui::CornerRadius::same(8);
    style.visuals.widgets.noninteractive.corner_radius = widget_rounding;
    style.visuals.widgets.inactive.corner_radius = widget_rounding;
    style.visuals.widgets.hovered.corner_radius = widget_rounding;
    style.visuals.widgets.active.corner_radius = widget_rounding;

    ctx.set_style(style);
}
