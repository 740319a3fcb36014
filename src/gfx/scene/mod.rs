//! # Scene Management Module
//!
//! Nodes, their materials and transforms, the background and ambient light,
//! plus the gizmos that manipulate nodes.
//!
//! ## Key Components
//!
//! - [`Scene`] - The container that owns nodes and gizmos
//! - [`Node`] - A transform plus textured mesh parts
//! - [`Material`] - Base colour with an optional colour map
//! - [`Vertex3D`] - Vertex layout with position, normal, and texture coordinates
//!
//! ## Usage
//!
//! ```no_run
//! use zenroom::gfx::geometry::generate_plane;
//! use zenroom::gfx::scene::{Material, Node, Scene};
//!
//! let mut scene = Scene::new();
//! let floor = generate_plane(10.0, 10.0, 1, 1);
//! scene.add_node(Node::primitive("floor", &floor, Material::new("floor", [1.0; 4])));
//! ```

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawNode, Material, Mesh, Node, NodePart, NodeSource, Transform};
pub use scene::{AmbientLight, Background, NodeId, Scene};
pub use vertex::{LineVertex, Vertex3D};
