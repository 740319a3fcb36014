//! # Background Music
//!
//! - [`AudioToggle`] - The play/pause state machine behind the music button
//! - [`AudioOutput`] - Backend seam; [`RodioOutput`] for real devices, [`SilentOutput`] otherwise

pub mod output;
pub mod toggle;

pub use output::{open_default_output, AudioOutput, PlaybackSettings, RodioOutput, SilentOutput};
pub use toggle::{AudioToggle, PlaybackState};
