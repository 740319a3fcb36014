//! # Meditation Room
//!
//! Declarative assembly of the room and the state it runs on.
//!
//! ## Key Components
//!
//! - [`SceneContext`] - Owns the scene, camera rig, music toggle and load failures
//! - [`PendingLoads`] - Asset loads in flight, polled once per tick
//! - [`FrameTarget`] - Where [`SceneContext::tick`] renders to
//!
//! ## Usage
//!
//! ```no_run
//! use zenroom::assets::AssetLoader;
//! use zenroom::audio::SilentOutput;
//! use zenroom::config::RoomConfig;
//! use zenroom::room::SceneContext;
//!
//! let config = RoomConfig::default();
//! let loader = AssetLoader::new(&config.asset_root);
//! let (mut context, mut loads) = SceneContext::assemble(&config, &loader, Box::new(SilentOutput));
//! context.apply_ready(&mut loads);
//! ```

pub mod context;
pub mod loads;

#[cfg(test)]
mod scenario_tests;

pub use context::{FrameTarget, SceneContext, SKY_PLACEHOLDER};
pub use loads::{LoadFailure, LoadOutcome, LoadResult, ModelPlacement, PendingLoads, TextureSlot};
