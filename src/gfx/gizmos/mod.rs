//! # Gizmo System
//!
//! Pointer-driven manipulators that translate, rotate and scale scene nodes.
//!
//! ## Key Components
//!
//! - [`Gizmo`] - Interface of a manipulator attached to one node
//! - [`TransformGizmo`] - World-axis translate/rotate/scale handles
//! - [`GizmoManager`] - Owns the gizmos and routes pointer input to them
//! - [`DragListener`] - Notified when a drag starts or ends
//!
//! ## Usage
//!
//! ```no_run
//! use zenroom::gfx::gizmos::{GizmoManager, GizmoMode};
//! use zenroom::gfx::scene::NodeId;
//!
//! let mut gizmos = GizmoManager::new();
//! gizmos.attach(NodeId(0));
//! gizmos.set_mode(GizmoMode::Rotate);
//! ```

pub mod manager;
pub mod traits;
pub mod transform_gizmo;

// Re-export main types
pub use manager::{GizmoId, GizmoManager};
pub use traits::{DragListener, Gizmo};
pub use transform_gizmo::{Axis, GizmoMode, TransformGizmo};
