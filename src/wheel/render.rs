//! Wheel drawing against an abstract 2D surface
//!
//! Drawing is in CSS pixels; the surface owns device-pixel scaling.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;

use super::WheelLabelDescriptor;
use super::layout::{self, TextMeasure};
use crate::polar_to_cartesian;

/// Gap between the wheel rim and the canvas edge
const RIM_MARGIN: f64 = 14.0;
/// Label anchor as a fraction of the radius
const LABEL_RADIUS: f64 = 0.62;
/// Max label width as a fraction of the radius
const LABEL_WIDTH: f64 = 0.55;
const HUB_RADIUS: f64 = 0.14;
/// Pointer deflection at full tap strength (radians)
const POINTER_TAP_SWING: f64 = 0.25;

/// Minimal 2D drawing API the wheel needs
pub trait WheelSurface: TextMeasure {
    /// Drawing area in CSS pixels
    fn css_size(&self) -> (f64, f64);
    /// Resize the backing store to CSS size × device pixel ratio.
    /// Returns true if it changed.
    fn ensure_backing_store(&mut self) -> bool;
    fn clear(&mut self);
    fn fill_wedge(&mut self, center: DVec2, radius: f64, start: f64, end: f64, color: &str);
    fn fill_circle(&mut self, center: DVec2, radius: f64, fill: &str, stroke: Option<&str>);
    fn fill_polygon(&mut self, points: &[DVec2], color: &str);
    fn set_font(&mut self, font: &str);
    /// Draw centred text at `at`, rotated by `rotation` radians
    fn fill_text(&mut self, text: &str, at: DVec2, rotation: f64, color: &str);
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Copy)]
pub struct WheelView<'a> {
    pub labels: &'a [WheelLabelDescriptor],
    pub pos: f64,
    pub pointer_angle: f64,
    /// 0..1 pointer deflection
    pub pointer_tap: f64,
    pub empty_message: &'a str,
}

/// Draw the wheel, or the empty-state message when there are no labels
pub fn draw_wheel(surface: &mut dyn WheelSurface, view: &WheelView<'_>) {
    let (w, h) = surface.css_size();
    let center = DVec2::new(w / 2.0, h / 2.0);
    let radius = w.min(h) / 2.0 - RIM_MARGIN;
    surface.clear();
    if radius <= 0.0 {
        return;
    }

    if view.labels.is_empty() {
        draw_empty(surface, center, radius, view.empty_message);
        return;
    }

    let segment = TAU / view.labels.len() as f64;
    let font_px = (radius * 0.09).clamp(10.0, 18.0);
    surface.set_font(&format!("600 {font_px:.0}px sans-serif"));

    for (i, label) in view.labels.iter().enumerate() {
        let start = view.pos + i as f64 * segment;
        surface.fill_wedge(center, radius, start, start + segment, layout::segment_color(i));
        draw_label(surface, center, radius, start + segment / 2.0, font_px, label);
    }

    surface.fill_circle(center, radius * HUB_RADIUS, layout::HUB_COLOR, Some(layout::RIM_COLOR));
    draw_pointer(surface, center, radius, view.pointer_angle, view.pointer_tap);
}

fn draw_label(
    surface: &mut dyn WheelSurface,
    center: DVec2,
    radius: f64,
    mid: f64,
    font_px: f64,
    label: &WheelLabelDescriptor,
) {
    let mut lines = layout::wrap_label(&*surface, &label.label, radius * LABEL_WIDTH);
    if let Some(emoji) = label.emoji.as_deref().filter(|e| !e.is_empty()) {
        lines.insert(0, emoji.to_string());
    }

    let anchor = center + polar_to_cartesian(radius * LABEL_RADIUS, mid);
    // Lines stack across the radial baseline
    let across = polar_to_cartesian(1.0, mid + FRAC_PI_2);
    let line_height = font_px * 1.15;
    let first = -(lines.len() as f64 - 1.0) / 2.0;
    for (k, line) in lines.iter().enumerate() {
        let at = anchor + across * ((first + k as f64) * line_height);
        surface.fill_text(line, at, mid, layout::TEXT_COLOR);
    }
}

fn draw_empty(surface: &mut dyn WheelSurface, center: DVec2, radius: f64, message: &str) {
    surface.fill_circle(center, radius, layout::EMPTY_COLOR, Some(layout::RIM_COLOR));
    surface.set_font("600 16px sans-serif");
    surface.fill_text(message, center, 0.0, layout::TEXT_COLOR);
}

/// Triangle at the rim pointing inward, swung by the tap strength
fn draw_pointer(surface: &mut dyn WheelSurface, center: DVec2, radius: f64, angle: f64, tap: f64) {
    let angle = angle + tap.clamp(0.0, 1.0) * POINTER_TAP_SWING;
    let tip = center + polar_to_cartesian(radius - 10.0, angle);
    let base_l = center + polar_to_cartesian(radius + 12.0, angle - 0.08);
    let base_r = center + polar_to_cartesian(radius + 12.0, angle + 0.08);
    surface.fill_polygon(&[tip, base_l, base_r], layout::POINTER_COLOR);
}
