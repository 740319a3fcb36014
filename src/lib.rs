//! Meditation room
//!
//! A small interactive 3D room built on wgpu and winit: textured floor, wall
//! and ceiling in front of a sky image, two models with transform gizmos, and
//! background music behind an on-screen toggle.

pub mod app;
pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod gfx;
pub mod room;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{run, ZenroomApp};
pub use config::RoomConfig;
pub use room::SceneContext;
