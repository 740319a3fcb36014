use std::sync::Arc;

use cgmath::Vector3;

use super::object::Node;
use crate::assets::ImageData;
use crate::gfx::gizmos::{DragListener, GizmoManager};
use crate::gfx::picking::Ray;

/// Index of a node in its [`Scene`]. Nodes are never removed, so ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// What is drawn behind all geometry.
#[derive(Debug, Clone)]
pub enum Background {
    Color([f32; 4]),
    /// Image stretched over the viewport, fixed to the screen
    Texture(Arc<ImageData>),
}

/// Uniform light applied to every surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.5,
        }
    }
}

/// Main scene containing nodes, background, lighting and gizmos
pub struct Scene {
    nodes: Vec<Node>,
    background: Background,
    /// Bumped on every background change so the renderer re-uploads lazily
    background_revision: u64,
    pub ambient: AmbientLight,
    pub gizmos: GizmoManager,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            background: Background::Color([0.0, 0.0, 0.0, 1.0]),
            background_revision: 0,
            ambient: AmbientLight::default(),
            gizmos: GizmoManager::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        log::debug!("Adding node '{}' ({} triangles)", node.name, node.triangle_count());
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finds a node by name, first match wins
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn background_revision(&self) -> u64 {
        self.background_revision
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        self.background_revision += 1;
    }

    // Pointer routing; nodes and gizmos are borrowed disjointly here

    pub fn pointer_down(
        &mut self,
        ray: &Ray,
        eye: Vector3<f32>,
        listener: &mut dyn DragListener,
    ) -> bool {
        self.gizmos.pointer_down(ray, &self.nodes, eye, listener)
    }

    pub fn pointer_moved(&mut self, ray: &Ray, eye: Vector3<f32>) -> bool {
        self.gizmos.pointer_moved(ray, &mut self.nodes, eye)
    }

    pub fn pointer_up(&mut self, listener: &mut dyn DragListener) -> bool {
        self.gizmos.pointer_up(listener)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_plane;
    use crate::gfx::scene::object::Material;

    #[test]
    fn node_ids_are_stable_indices() {
        let mut scene = Scene::new();
        let plane = generate_plane(1.0, 1.0, 1, 1);
        let a = scene.add_node(Node::primitive("floor", &plane, Material::new("floor", [1.0; 4])));
        let b = scene.add_node(Node::primitive("wall", &plane, Material::new("wall", [1.0; 4])));

        assert_eq!((a, b), (NodeId(0), NodeId(1)));
        assert_eq!(scene.node(b).map(|n| n.name.as_str()), Some("wall"));
        assert_eq!(scene.find_node("floor"), Some(a));
        assert!(scene.node(NodeId(7)).is_none());
        assert_eq!(scene.node_count(), 2);
    }

    #[test]
    fn background_changes_bump_revision() {
        let mut scene = Scene::new();
        let before = scene.background_revision();
        scene.set_background(Background::Texture(Arc::new(ImageData::solid([1, 2, 3, 255]))));
        assert_eq!(scene.background_revision(), before + 1);
        assert!(matches!(scene.background(), Background::Texture(_)));
    }
}
