//! # Transform Gizmo
//!
//! Translate, rotate and scale handles along the world axes.
//!
//! The gizmo keeps a constant on-screen size by scaling with the distance to
//! the camera. Translate and scale handles are axis segments picked by
//! closest approach; rotate handles are rings picked by plane intersection.

use std::f32::consts::TAU;

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};

use super::traits::Gizmo;
use crate::gfx::picking::{ray_line_closest, ray_plane, Ray};
use crate::gfx::scene::{vertex::LineVertex, NodeId, Transform};

/// Gizmo size as a fraction of the eye-to-target distance
const SCREEN_FACTOR: f32 = 0.15;
/// Axis pick tolerance, relative to gizmo size
const AXIS_TOLERANCE: f32 = 0.08;
/// Rotation ring radius, relative to gizmo size
const RING_RADIUS: f32 = 0.8;
const RING_TOLERANCE: f32 = 0.06;
const RING_SEGMENTS: usize = 48;
const MIN_SCALE_FACTOR: f32 = 1e-3;

const HIGHLIGHT: [f32; 4] = [1.0, 0.9, 0.1, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn direction(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }

    /// Two unit vectors spanning the plane perpendicular to this axis, right-handed.
    fn plane_basis(self) -> (Vector3<f32>, Vector3<f32>) {
        match self {
            Axis::X => (Vector3::unit_y(), Vector3::unit_z()),
            Axis::Y => (Vector3::unit_z(), Vector3::unit_x()),
            Axis::Z => (Vector3::unit_x(), Vector3::unit_y()),
        }
    }

    fn color(self) -> [f32; 4] {
        match self {
            Axis::X => [0.9, 0.2, 0.2, 1.0],
            Axis::Y => [0.2, 0.85, 0.2, 1.0],
            Axis::Z => [0.2, 0.4, 0.95, 1.0],
        }
    }
}

/// State captured when a drag starts.
#[derive(Debug, Clone, Copy)]
struct DragState {
    axis: Axis,
    start: Transform,
    /// Axis parameter (translate/scale) or ring angle (rotate) at drag start
    start_param: f32,
}

pub struct TransformGizmo {
    target: NodeId,
    mode: GizmoMode,
    hovered: Option<Axis>,
    drag: Option<DragState>,
}

impl TransformGizmo {
    pub fn new(target: NodeId, mode: GizmoMode) -> Self {
        Self {
            target,
            mode,
            hovered: None,
            drag: None,
        }
    }

    pub fn active_axis(&self) -> Option<Axis> {
        self.drag.map(|drag| drag.axis)
    }

    pub fn hovered(&self) -> Option<Axis> {
        self.hovered
    }

    /// World-space handle length for a target at `position`.
    pub fn size(position: Vector3<f32>, eye: Vector3<f32>) -> f32 {
        ((eye - position).magnitude() * SCREEN_FACTOR).max(1e-3)
    }

    fn ring_angle(axis: Axis, center: Vector3<f32>, point: Vector3<f32>) -> f32 {
        let (u, v) = axis.plane_basis();
        let offset = point - center;
        offset.dot(v).atan2(offset.dot(u))
    }

    fn axis_color(&self, axis: Axis) -> [f32; 4] {
        if self.active_axis() == Some(axis) || (self.drag.is_none() && self.hovered == Some(axis)) {
            HIGHLIGHT
        } else {
            axis.color()
        }
    }
}

impl Gizmo for TransformGizmo {
    fn target(&self) -> NodeId {
        self.target
    }

    fn mode(&self) -> GizmoMode {
        self.mode
    }

    fn set_mode(&mut self, mode: GizmoMode) {
        if self.drag.is_none() {
            self.mode = mode;
        }
    }

    fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn hit_test(&self, ray: &Ray, target: &Transform, eye: Vector3<f32>) -> Option<(Axis, f32)> {
        let center = target.position;
        let size = Self::size(center, eye);
        let mut best: Option<(Axis, f32, f32)> = None;

        for axis in Axis::ALL {
            let candidate = match self.mode {
                GizmoMode::Translate | GizmoMode::Scale => {
                    ray_line_closest(ray, center, axis.direction()).and_then(|approach| {
                        let on_handle = (0.0..=size).contains(&approach.line_t);
                        (on_handle && approach.ray_t > 0.0 && approach.distance < size * AXIS_TOLERANCE)
                            .then_some((approach.distance, approach.ray_t))
                    })
                }
                GizmoMode::Rotate => ray_plane(ray, center, axis.direction()).and_then(|hit| {
                    let miss = ((hit - center).magnitude() - size * RING_RADIUS).abs();
                    (miss < size * RING_TOLERANCE)
                        .then(|| (miss, (hit - ray.origin).magnitude()))
                }),
            };

            if let Some((miss, ray_t)) = candidate {
                if best.map_or(true, |(_, best_miss, _)| miss < best_miss) {
                    best = Some((axis, miss, ray_t));
                }
            }
        }

        best.map(|(axis, _, ray_t)| (axis, ray_t))
    }

    fn begin_drag(
        &mut self,
        axis: Axis,
        ray: &Ray,
        target: &Transform,
        _eye: Vector3<f32>,
    ) -> bool {
        if self.drag.is_some() {
            return false;
        }

        let center = target.position;
        let start_param = match self.mode {
            GizmoMode::Translate | GizmoMode::Scale => {
                match ray_line_closest(ray, center, axis.direction()) {
                    Some(approach) => approach.line_t,
                    None => return false,
                }
            }
            GizmoMode::Rotate => match ray_plane(ray, center, axis.direction()) {
                Some(hit) => Self::ring_angle(axis, center, hit),
                None => return false,
            },
        };

        self.drag = Some(DragState {
            axis,
            start: *target,
            start_param,
        });
        true
    }

    fn drag(&mut self, ray: &Ray, target: &mut Transform) {
        let Some(drag) = self.drag else {
            return;
        };
        let axis = drag.axis.direction();
        let center = drag.start.position;

        match self.mode {
            GizmoMode::Translate => {
                if let Some(approach) = ray_line_closest(ray, center, axis) {
                    target.position = center + axis * (approach.line_t - drag.start_param);
                }
            }
            GizmoMode::Rotate => {
                if let Some(hit) = ray_plane(ray, center, axis) {
                    let angle = Self::ring_angle(drag.axis, center, hit) - drag.start_param;
                    target.rotation = Quaternion::from_axis_angle(axis, Rad(angle)) * drag.start.rotation;
                }
            }
            GizmoMode::Scale => {
                if drag.start_param.abs() < 1e-4 {
                    return;
                }
                if let Some(approach) = ray_line_closest(ray, center, axis) {
                    let factor = (approach.line_t / drag.start_param).max(MIN_SCALE_FACTOR);
                    let mut scale = drag.start.scale;
                    match drag.axis {
                        Axis::X => scale.x *= factor,
                        Axis::Y => scale.y *= factor,
                        Axis::Z => scale.z *= factor,
                    }
                    target.scale = scale;
                }
            }
        }
    }

    fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    fn set_hovered(&mut self, axis: Option<Axis>) {
        self.hovered = axis;
    }

    fn append_overlay(&self, target: &Transform, eye: Vector3<f32>, out: &mut Vec<LineVertex>) {
        let center = target.position;
        let size = Self::size(center, eye);
        let mut line = |a: Vector3<f32>, b: Vector3<f32>, color: [f32; 4]| {
            out.push(LineVertex {
                position: a.into(),
                color,
            });
            out.push(LineVertex {
                position: b.into(),
                color,
            });
        };

        for axis in Axis::ALL {
            let color = self.axis_color(axis);
            let dir = axis.direction();
            let (u, v) = axis.plane_basis();

            match self.mode {
                GizmoMode::Translate => {
                    let tip = center + dir * size;
                    line(center, tip, color);
                    // Arrow head
                    let back = tip - dir * (size * 0.15);
                    for side in [u, -u, v, -v] {
                        line(tip, back + side * (size * 0.05), color);
                    }
                }
                GizmoMode::Scale => {
                    let tip = center + dir * size;
                    line(center, tip, color);
                    // Square cap
                    let h = size * 0.05;
                    let corners = [
                        tip + u * h + v * h,
                        tip - u * h + v * h,
                        tip - u * h - v * h,
                        tip + u * h - v * h,
                    ];
                    for i in 0..4 {
                        line(corners[i], corners[(i + 1) % 4], color);
                    }
                }
                GizmoMode::Rotate => {
                    let radius = size * RING_RADIUS;
                    let point = |i: usize| {
                        let angle = TAU * i as f32 / RING_SEGMENTS as f32;
                        center + (u * angle.cos() + v * angle.sin()) * radius
                    };
                    for i in 0..RING_SEGMENTS {
                        line(point(i), point(i + 1), color);
                    }
                }
            }
        }
    }
}
