//! # Gizmo Traits
//!
//! Interfaces between manipulation gizmos, the scene they edit and whoever
//! needs to know when a drag is in progress.

use cgmath::Vector3;

use crate::gfx::picking::Ray;
use crate::gfx::scene::{vertex::LineVertex, NodeId, Transform};

use super::transform_gizmo::{Axis, GizmoMode};

/// Receives drag start/end notifications from manipulation gizmos.
///
/// Every `dragging_changed(true)` is eventually followed by exactly one
/// `dragging_changed(false)` for the same drag.
pub trait DragListener {
    fn dragging_changed(&mut self, dragging: bool);
}

/// A pointer-driven manipulator attached to one scene node.
///
/// The gizmo never owns the node; the target's transform is passed in on every
/// call so the scene stays the single owner of its nodes.
pub trait Gizmo {
    /// Node this gizmo manipulates
    fn target(&self) -> NodeId;

    fn mode(&self) -> GizmoMode;

    /// Switches mode. Ignored while a drag is in progress.
    fn set_mode(&mut self, mode: GizmoMode);

    fn is_dragging(&self) -> bool;

    /// Handle under `ray`, with the distance along the ray to the hit.
    fn hit_test(&self, ray: &Ray, target: &Transform, eye: Vector3<f32>) -> Option<(Axis, f32)>;

    /// Starts dragging `axis`. Returns `false` if the drag cannot start from this ray.
    fn begin_drag(&mut self, axis: Axis, ray: &Ray, target: &Transform, eye: Vector3<f32>)
        -> bool;

    /// Applies the pointer's current ray to the target.
    fn drag(&mut self, ray: &Ray, target: &mut Transform);

    /// Ends the drag; returns whether one was in progress.
    fn end_drag(&mut self) -> bool;

    fn set_hovered(&mut self, axis: Option<Axis>);

    /// Appends this gizmo's handles as line-list vertices.
    fn append_overlay(&self, target: &Transform, eye: Vector3<f32>, out: &mut Vec<LineVertex>);
}
