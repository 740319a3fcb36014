// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, the frame loop on the GPU side, and the WGSL
//! shaders for the sky, textured nodes and gizmo lines.

pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, VertexLayoutKind};
pub use render_engine::RenderEngine;
