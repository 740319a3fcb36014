//! # Graphics Module
//!
//! Everything needed to put the room on screen and manipulate it.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Orbit camera with damped controls and a navigation lock
//! - **Geometry** ([`geometry`]) - Procedural planes and boxes
//! - **Gizmos** ([`gizmos`]) - Translate/rotate/scale handles driven by the pointer
//! - **Picking** ([`picking`]) - Screen-space rays and their intersections
//! - **Rendering Pipeline** ([`rendering`]) - Sky, textured meshes and overlay lines with MSAA
//! - **Resource Management** ([`resources`]) - Global uniforms, materials and textures
//! - **Scene Management** ([`scene`]) - Nodes, background and ambient light
//!
//! ## Usage
//!
//! ```no_run
//! use zenroom::gfx::scene::{Background, Scene};
//!
//! let mut scene = Scene::new();
//! scene.set_background(Background::Color([0.1, 0.1, 0.12, 1.0]));
//! ```

pub mod camera;
pub mod geometry;
pub mod gizmos;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
