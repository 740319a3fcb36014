//! # User Interface Module
//!
//! A Dear ImGui overlay drawn on top of the room.
//!
//! ## Key Components
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu
//! - [`music_overlay`] - The music toggle button and the load-failure notice
//!
//! ## Input Handling
//!
//! The manager reports whether ImGui wants the pointer or keyboard, so
//! clicks on the button never reach the camera or the gizmos.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{failure_notice, music_overlay};
