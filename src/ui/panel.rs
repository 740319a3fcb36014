// src/ui/panel.rs
//! Overlay panels for the room
//!
//! A single borderless window pinned to the top-left corner holding the
//! music button and, when something failed to load, a one-line notice.

use imgui::{Condition, StyleColor, StyleVar};

/// Top-left corner of the overlay, in logical pixels
pub const OVERLAY_POSITION: [f32; 2] = [20.0, 20.0];
pub const OVERLAY_PADDING: [f32; 2] = [10.0, 10.0];
/// Translucent white, as the button background
pub const OVERLAY_BACKGROUND: [f32; 4] = [1.0, 1.0, 1.0, 0.8];
const OVERLAY_TEXT: [f32; 4] = [0.1, 0.1, 0.1, 1.0];

/// Degraded-state line shown under the button, `None` when every load succeeded.
pub fn failure_notice(failed: usize) -> Option<String> {
    (failed > 0).then(|| format!("{} asset(s) failed to load", failed))
}

/// Draws the music button with `label` and returns whether it was clicked
///
/// # Arguments
/// * `ui` - ImGui UI context
/// * `label` - Current button text, naming the next action
/// * `failed_loads` - Number of assets that failed to load
pub fn music_overlay(ui: &imgui::Ui, label: &str, failed_loads: usize) -> bool {
    let display_size = ui.io().display_size;
    // Guard against invalid display size that could cause crashes
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return false;
    }

    let _padding = ui.push_style_var(StyleVar::WindowPadding(OVERLAY_PADDING));
    let _rounding = ui.push_style_var(StyleVar::WindowRounding(4.0));
    let _background = ui.push_style_color(StyleColor::WindowBg, OVERLAY_BACKGROUND);
    let _text = ui.push_style_color(StyleColor::Text, OVERLAY_TEXT);

    ui.window("##music_overlay")
        .position(OVERLAY_POSITION, Condition::Always)
        .title_bar(false)
        .resizable(false)
        .movable(false)
        .collapsible(false)
        .scroll_bar(false)
        .always_auto_resize(true)
        .build(|| {
            // Stable id while the visible label changes
            let clicked = ui.button(format!("{}###music_toggle", label));

            if let Some(notice) = failure_notice(failed_loads) {
                ui.spacing();
                ui.text_colored([0.7, 0.1, 0.1, 1.0], notice);
            }
            clicked
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_only_when_something_failed() {
        assert_eq!(failure_notice(0), None);
        assert_eq!(failure_notice(1).as_deref(), Some("1 asset(s) failed to load"));
        assert_eq!(failure_notice(3).as_deref(), Some("3 asset(s) failed to load"));
    }
}
