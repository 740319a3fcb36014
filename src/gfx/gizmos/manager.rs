//! # Gizmo Manager
//!
//! Owns every manipulation gizmo in a scene and routes pointer input to them.
//! Drag start and end are reported to a [`DragListener`] so navigation can be
//! suspended for exactly as long as some gizmo is being dragged.

use cgmath::Vector3;

use super::traits::{DragListener, Gizmo};
use super::transform_gizmo::{Axis, GizmoMode, TransformGizmo};
use crate::gfx::picking::Ray;
use crate::gfx::scene::{vertex::LineVertex, Node, NodeId};

/// Handle to a gizmo owned by a [`GizmoManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GizmoId(pub usize);

pub struct GizmoManager {
    gizmos: Vec<Box<dyn Gizmo>>,
    mode: GizmoMode,
}

impl GizmoManager {
    pub fn new() -> Self {
        Self {
            gizmos: Vec::new(),
            mode: GizmoMode::default(),
        }
    }

    /// Attaches a transform gizmo to `target` in the current mode.
    pub fn attach(&mut self, target: NodeId) -> GizmoId {
        self.add_gizmo(Box::new(TransformGizmo::new(target, self.mode)))
    }

    pub fn add_gizmo(&mut self, gizmo: Box<dyn Gizmo>) -> GizmoId {
        self.gizmos.push(gizmo);
        GizmoId(self.gizmos.len() - 1)
    }

    pub fn get(&self, id: GizmoId) -> Option<&dyn Gizmo> {
        self.gizmos.get(id.0).map(|gizmo| gizmo.as_ref())
    }

    pub fn gizmo_count(&self) -> usize {
        self.gizmos.len()
    }

    pub fn mode(&self) -> GizmoMode {
        self.mode
    }

    /// Switches every gizmo's mode; gizmos mid-drag keep theirs until released.
    pub fn set_mode(&mut self, mode: GizmoMode) {
        self.mode = mode;
        for gizmo in &mut self.gizmos {
            gizmo.set_mode(mode);
        }
        log::debug!("Gizmo mode: {:?}", mode);
    }

    pub fn is_dragging(&self) -> bool {
        self.gizmos.iter().any(|gizmo| gizmo.is_dragging())
    }

    pub fn active_drags(&self) -> usize {
        self.gizmos.iter().filter(|gizmo| gizmo.is_dragging()).count()
    }

    /// Finds the nearest handle under `ray` among gizmos whose target is visible.
    pub fn hit_test(&self, ray: &Ray, nodes: &[Node], eye: Vector3<f32>) -> Option<(GizmoId, Axis)> {
        let mut best: Option<(GizmoId, Axis, f32)> = None;
        for (index, gizmo) in self.gizmos.iter().enumerate() {
            let Some(node) = nodes.get(gizmo.target().0).filter(|node| node.visible) else {
                continue;
            };
            if let Some((axis, t)) = gizmo.hit_test(ray, &node.transform, eye) {
                if best.map_or(true, |(_, _, best_t)| t < best_t) {
                    best = Some((GizmoId(index), axis, t));
                }
            }
        }
        best.map(|(id, axis, _)| (id, axis))
    }

    /// Starts dragging `axis` of gizmo `id`, notifying `listener` on success.
    pub fn begin_drag(
        &mut self,
        id: GizmoId,
        axis: Axis,
        ray: &Ray,
        nodes: &[Node],
        eye: Vector3<f32>,
        listener: &mut dyn DragListener,
    ) -> bool {
        let Some(gizmo) = self.gizmos.get_mut(id.0) else {
            return false;
        };
        let Some(node) = nodes.get(gizmo.target().0) else {
            log::warn!("Gizmo {:?} targets missing node {:?}", id, gizmo.target());
            return false;
        };

        if gizmo.begin_drag(axis, ray, &node.transform, eye) {
            log::debug!("Dragging {:?} axis of '{}'", axis, node.name);
            listener.dragging_changed(true);
            true
        } else {
            false
        }
    }

    /// Pointer press: grabs the handle under the pointer, if any.
    pub fn pointer_down(
        &mut self,
        ray: &Ray,
        nodes: &[Node],
        eye: Vector3<f32>,
        listener: &mut dyn DragListener,
    ) -> bool {
        match self.hit_test(ray, nodes, eye) {
            Some((id, axis)) => self.begin_drag(id, axis, ray, nodes, eye, listener),
            None => false,
        }
    }

    /// Pointer motion: drags active gizmos, otherwise updates hover highlighting.
    ///
    /// Returns `true` when a drag consumed the motion.
    pub fn pointer_moved(&mut self, ray: &Ray, nodes: &mut [Node], eye: Vector3<f32>) -> bool {
        if self.is_dragging() {
            for gizmo in self.gizmos.iter_mut().filter(|gizmo| gizmo.is_dragging()) {
                if let Some(node) = nodes.get_mut(gizmo.target().0) {
                    gizmo.drag(ray, &mut node.transform);
                }
            }
            return true;
        }

        let hovered = self.hit_test(ray, nodes, eye);
        for (index, gizmo) in self.gizmos.iter_mut().enumerate() {
            let axis = hovered
                .filter(|(id, _)| id.0 == index)
                .map(|(_, axis)| axis);
            gizmo.set_hovered(axis);
        }
        false
    }

    /// Pointer release: ends every drag, one `dragging_changed(false)` per drag.
    pub fn pointer_up(&mut self, listener: &mut dyn DragListener) -> bool {
        let mut released = false;
        for gizmo in &mut self.gizmos {
            if gizmo.end_drag() {
                listener.dragging_changed(false);
                released = true;
            }
        }
        released
    }

    /// Line-list vertices for every gizmo whose target is visible.
    pub fn overlay(&self, nodes: &[Node], eye: Vector3<f32>) -> Vec<LineVertex> {
        let mut lines = Vec::new();
        for gizmo in &self.gizmos {
            if let Some(node) = nodes.get(gizmo.target().0).filter(|node| node.visible) {
                gizmo.append_overlay(&node.transform, eye, &mut lines);
            }
        }
        lines
    }
}

impl Default for GizmoManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{NodeSource, Transform};

    #[derive(Default)]
    struct Recorder {
        events: Vec<bool>,
    }

    impl DragListener for Recorder {
        fn dragging_changed(&mut self, dragging: bool) {
            self.events.push(dragging);
        }
    }

    const EYE: Vector3<f32> = Vector3::new(0.0, 0.0, 10.0);

    fn node_at(x: f32) -> Node {
        Node::new("n", NodeSource::Primitive, Vec::new())
            .with_transform(Transform::at(Vector3::new(x, 0.0, 0.0)))
    }

    fn ray_through(point: Vector3<f32>) -> Ray {
        Ray::new(EYE, point - EYE)
    }

    #[test]
    fn press_on_handle_starts_one_drag() {
        let mut nodes = vec![node_at(-1.0), node_at(1.0)];
        let mut manager = GizmoManager::new();
        manager.attach(NodeId(0));
        let second = manager.attach(NodeId(1));
        let mut recorder = Recorder::default();

        // On the X handle of the node at x = 1
        let ray = ray_through(Vector3::new(1.5, 0.0, 0.0));
        assert_eq!(manager.hit_test(&ray, &nodes, EYE), Some((second, Axis::X)));
        assert!(manager.pointer_down(&ray, &nodes, EYE, &mut recorder));
        assert_eq!(recorder.events, vec![true]);
        assert_eq!(manager.active_drags(), 1);

        assert!(manager.pointer_moved(&ray_through(Vector3::new(2.0, 0.0, 0.0)), &mut nodes, EYE));
        assert!((nodes[1].transform.position.x - 1.5).abs() < 1e-4);
        assert_eq!(nodes[0].transform.position.x, -1.0);

        assert!(manager.pointer_up(&mut recorder));
        assert_eq!(recorder.events, vec![true, false]);
        assert!(!manager.pointer_up(&mut recorder));
        assert_eq!(recorder.events.len(), 2);
    }

    #[test]
    fn press_on_empty_space_is_not_consumed() {
        let nodes = vec![node_at(0.0)];
        let mut manager = GizmoManager::new();
        manager.attach(NodeId(0));
        let mut recorder = Recorder::default();

        let ray = ray_through(Vector3::new(0.0, -3.0, 0.0));
        assert!(!manager.pointer_down(&ray, &nodes, EYE, &mut recorder));
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn overlapping_drags_report_each_release() {
        let nodes = vec![node_at(-1.0), node_at(1.0)];
        let mut manager = GizmoManager::new();
        let a = manager.attach(NodeId(0));
        let b = manager.attach(NodeId(1));
        let mut recorder = Recorder::default();

        assert!(manager.begin_drag(a, Axis::X, &ray_through(Vector3::new(-0.5, 0.0, 0.0)), &nodes, EYE, &mut recorder));
        assert!(manager.begin_drag(b, Axis::X, &ray_through(Vector3::new(1.5, 0.0, 0.0)), &nodes, EYE, &mut recorder));
        assert_eq!(manager.active_drags(), 2);

        manager.pointer_up(&mut recorder);
        assert_eq!(recorder.events, vec![true, true, false, false]);
    }

    #[test]
    fn hidden_targets_are_not_pickable() {
        let mut nodes = vec![node_at(0.0)];
        nodes[0].visible = false;
        let mut manager = GizmoManager::new();
        manager.attach(NodeId(0));

        let ray = ray_through(Vector3::new(0.5, 0.0, 0.0));
        assert!(manager.hit_test(&ray, &nodes, EYE).is_none());
        assert!(manager.overlay(&nodes, EYE).is_empty());
    }

    #[test]
    fn mode_applies_to_new_and_existing_gizmos() {
        let mut manager = GizmoManager::new();
        let first = manager.attach(NodeId(0));
        manager.set_mode(GizmoMode::Rotate);
        let second = manager.attach(NodeId(1));

        assert_eq!(manager.get(first).map(|g| g.mode()), Some(GizmoMode::Rotate));
        assert_eq!(manager.get(second).map(|g| g.mode()), Some(GizmoMode::Rotate));
    }
}
