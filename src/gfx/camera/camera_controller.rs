use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;
use crate::gfx::gizmos::DragListener;

/// What a pointer drag does to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDrag {
    /// Orbit around the target
    Rotate,
    /// Move the target in the view plane
    Pan,
    /// Move toward or away from the target; dragging down moves closer
    Dolly,
}

/// Vertical drag distance, in physical pixels, worth one wheel notch.
const PIXELS_PER_DOLLY_STEP: f32 = 20.0;

/// Orbit navigation with damped inertia.
///
/// Pointer motion accumulates pending yaw/pitch/pan; every [`update`](Self::update)
/// applies `damping_factor` of what is pending and keeps the rest, so motion
/// eases out after the pointer stops. Dolly drags are not damped. Navigation
/// input is ignored while any
/// manipulation rig is dragging; see [`DragListener`].
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub damping_factor: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_pan: (f32, f32),
    /// Wheel-notch equivalents, applied whole on the next update
    pending_dolly: f32,
    drag: Option<NavigationDrag>,
    is_shift_held: bool,
    active_manipulations: usize,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            damping_factor: 1.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_pan: (0.0, 0.0),
            pending_dolly: 0.0,
            drag: None,
            is_shift_held: false,
            active_manipulations: 0,
        }
    }

    /// Enables damped inertia; `factor` is the share of pending motion applied per tick.
    pub fn with_damping(mut self, factor: f32) -> Self {
        self.damping_factor = factor.clamp(f32::EPSILON, 1.0);
        self
    }

    /// Navigation is enabled iff no manipulation rig is dragging.
    pub fn is_enabled(&self) -> bool {
        self.active_manipulations == 0
    }

    /// Number of rigs currently holding navigation suspended.
    pub fn active_manipulations(&self) -> usize {
        self.active_manipulations
    }

    /// Starts a navigation drag. Ignored while navigation is suspended.
    ///
    /// A plain drag rotates; holding shift turns it into a pan.
    pub fn begin_drag(&mut self, requested: NavigationDrag) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.drag = Some(if self.is_shift_held {
            NavigationDrag::Pan
        } else {
            requested
        });
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_rotating(&self) -> bool {
        self.drag == Some(NavigationDrag::Rotate)
    }

    pub fn is_panning(&self) -> bool {
        self.drag == Some(NavigationDrag::Pan)
    }

    /// Feeds pointer motion (in physical pixels) into the active drag.
    pub fn pointer_moved(&mut self, delta: (f32, f32)) {
        if !self.is_enabled() {
            return;
        }
        match self.drag {
            Some(NavigationDrag::Rotate) => {
                self.pending_yaw += -delta.0 * self.rotate_speed;
                self.pending_pitch += delta.1 * self.rotate_speed;
            }
            Some(NavigationDrag::Pan) => {
                self.pending_pan.0 += -delta.0 * self.pan_speed;
                self.pending_pan.1 += delta.1 * self.pan_speed;
            }
            Some(NavigationDrag::Dolly) => {
                self.pending_dolly += delta.1 / PIXELS_PER_DOLLY_STEP;
            }
            None => {}
        }
    }

    /// Zooms immediately; wheel input is not damped.
    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut OrbitCamera) {
        if !self.is_enabled() {
            return;
        }
        let scroll_amount = match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                *scroll as f32 / 50.0
            }
        };
        if scroll_amount != 0.0 {
            camera.dolly((1.0 - self.zoom_speed).powf(scroll_amount));
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                // Shift+C returns the camera to its starting pose
                if self.is_shift_held {
                    log::info!("Resetting camera to default position");
                    self.clear_pending();
                    camera.reset_to_default();
                }
            }
            _ => (),
        }
    }

    /// Applies one step of pending motion to the camera.
    ///
    /// Residual inertia keeps decaying even while navigation is suspended.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        let factor = self.damping_factor;

        if self.pending_yaw != 0.0 {
            camera.add_yaw(self.pending_yaw * factor);
        }
        if self.pending_pitch != 0.0 {
            camera.add_pitch(self.pending_pitch * factor);
        }
        if self.pending_pan != (0.0, 0.0) {
            camera.pan((self.pending_pan.0 * factor, self.pending_pan.1 * factor));
        }

        if self.pending_dolly != 0.0 {
            camera.dolly((1.0 - self.zoom_speed).powf(self.pending_dolly));
            self.pending_dolly = 0.0;
        }

        let keep = 1.0 - factor;
        self.pending_yaw = settle(self.pending_yaw * keep);
        self.pending_pitch = settle(self.pending_pitch * keep);
        self.pending_pan = (
            settle(self.pending_pan.0 * keep),
            settle(self.pending_pan.1 * keep),
        );
    }

    fn clear_pending(&mut self) {
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_pan = (0.0, 0.0);
        self.pending_dolly = 0.0;
    }
}

impl DragListener for CameraController {
    fn dragging_changed(&mut self, dragging: bool) {
        if dragging {
            self.active_manipulations += 1;
            self.drag = None;
        } else {
            self.active_manipulations = self.active_manipulations.saturating_sub(1);
        }
        log::debug!(
            "Camera navigation {} ({} active manipulation(s))",
            if self.is_enabled() { "enabled" } else { "suspended" },
            self.active_manipulations
        );
    }
}

/// Snaps negligible residual motion to zero so inertia terminates.
fn settle(value: f32) -> f32 {
    if value.abs() < 1e-6 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector3;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(5.0, 0.3, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0)
    }

    #[test]
    fn undamped_rotation_applies_in_one_step() {
        let mut camera = camera();
        let mut controller = CameraController::new(0.01, 0.1);

        assert!(controller.begin_drag(NavigationDrag::Rotate));
        controller.pointer_moved((-10.0, 0.0));
        controller.update(&mut camera);

        assert_relative_eq!(camera.yaw, 0.1, epsilon = 1e-6);
        controller.update(&mut camera);
        assert_relative_eq!(camera.yaw, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn damping_spreads_motion_over_ticks() {
        let mut camera = camera();
        let mut controller = CameraController::new(0.01, 0.1).with_damping(0.25);

        controller.begin_drag(NavigationDrag::Rotate);
        controller.pointer_moved((-100.0, 0.0));
        controller.end_drag();

        controller.update(&mut camera);
        assert_relative_eq!(camera.yaw, 0.25, epsilon = 1e-5);

        controller.update(&mut camera);
        assert_relative_eq!(camera.yaw, 0.25 + 0.75 * 0.25, epsilon = 1e-5);

        for _ in 0..200 {
            controller.update(&mut camera);
        }
        assert_relative_eq!(camera.yaw, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn suspended_navigation_ignores_input() {
        let mut camera = camera();
        let mut controller = CameraController::new(0.01, 0.1);

        controller.dragging_changed(true);
        assert!(!controller.is_enabled());
        assert!(!controller.begin_drag(NavigationDrag::Rotate));
        controller.pointer_moved((50.0, 50.0));
        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 3.0), &mut camera);
        controller.update(&mut camera);

        assert_relative_eq!(camera.yaw, 0.0);
        assert_relative_eq!(camera.distance, 5.0);

        controller.dragging_changed(false);
        assert!(controller.is_enabled());
    }

    #[test]
    fn overlapping_manipulations_keep_navigation_suspended() {
        let mut controller = CameraController::new(0.01, 0.1);

        controller.dragging_changed(true);
        controller.dragging_changed(true);
        controller.dragging_changed(false);
        assert!(!controller.is_enabled());
        assert_eq!(controller.active_manipulations(), 1);

        controller.dragging_changed(false);
        assert!(controller.is_enabled());

        // Unbalanced release never underflows
        controller.dragging_changed(false);
        assert!(controller.is_enabled());
    }

    #[test]
    fn manipulation_start_cancels_navigation_drag() {
        let mut controller = CameraController::new(0.01, 0.1);
        controller.begin_drag(NavigationDrag::Rotate);
        assert!(controller.is_rotating());

        controller.dragging_changed(true);
        assert!(!controller.is_rotating());
    }

    #[test]
    fn scrolling_forward_moves_closer() {
        let mut camera = camera();
        let mut controller = CameraController::new(0.01, 0.1);
        controller.process_scroll(&MouseScrollDelta::LineDelta(0.0, 1.0), &mut camera);
        assert_relative_eq!(camera.distance, 4.5, epsilon = 1e-5);
    }

    #[test]
    fn dolly_drag_down_moves_closer_in_one_update() {
        let mut camera = camera();
        let mut controller = CameraController::new(0.01, 0.1).with_damping(0.05);
        assert!(controller.begin_drag(NavigationDrag::Dolly));

        controller.pointer_moved((3.0, 40.0));
        controller.update(&mut camera);
        assert_relative_eq!(camera.distance, 5.0 * 0.81, epsilon = 1e-4);

        controller.update(&mut camera);
        assert_relative_eq!(camera.distance, 5.0 * 0.81, epsilon = 1e-4);

        controller.pointer_moved((0.0, -20.0));
        controller.update(&mut camera);
        assert_relative_eq!(camera.distance, 5.0 * 0.9, epsilon = 1e-4);
    }
}
