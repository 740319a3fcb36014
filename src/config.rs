//! Room configuration
//!
//! Everything the assembly step needs to build the room: window settings,
//! asset locators, the initial camera pose, lighting and music levels.
//! All values have defaults matching the shipped room; the asset root can be
//! redirected with the `ZENROOM_ASSETS` environment variable.

use std::path::PathBuf;

use cgmath::Vector3;

/// Environment variable that overrides [`RoomConfig::asset_root`].
pub const ASSET_ROOT_ENV: &str = "ZENROOM_ASSETS";

/// Locators of every asset the room loads, relative to the asset root.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    pub sky_texture: String,
    pub floor_texture: String,
    pub wall_texture: String,
    pub ceiling_texture: String,
    pub candle_model: String,
    pub person_model: String,
    pub music: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            sky_texture: "textures/sky.jpg".to_string(),
            floor_texture: "textures/floor.jpg".to_string(),
            wall_texture: "textures/wall.jpg".to_string(),
            ceiling_texture: "textures/ceiling.jpg".to_string(),
            candle_model: "models/candle.glb".to_string(),
            person_model: "models/meditating_person.glb".to_string(),
            music: "music/relax.mp3".to_string(),
        }
    }
}

/// Initial camera pose and projection.
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of the pending orbit motion applied per tick
    pub damping_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vector3::new(0.0, 1.5, 5.0),
            target: Vector3::new(0.0, 0.0, 0.0),
            fov_y_degrees: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            damping_factor: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AmbientConfig {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MusicConfig {
    pub volume: f32,
    pub looping: bool,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            volume: 0.5,
            looping: true,
        }
    }
}

/// Top-level configuration for a room.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub title: String,
    pub window_size: (u32, u32),
    pub asset_root: PathBuf,
    pub assets: AssetManifest,
    pub camera: CameraConfig,
    pub ambient: AmbientConfig,
    pub music: MusicConfig,
    /// Multisample count for the main pass (1 disables antialiasing)
    pub msaa_samples: u32,
    /// Positions the two models are attached at once loaded
    pub candle_position: Vector3<f32>,
    pub person_position: Vector3<f32>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            title: "Meditation Room".to_string(),
            window_size: (1200, 800),
            asset_root: PathBuf::from("assets"),
            assets: AssetManifest::default(),
            camera: CameraConfig::default(),
            ambient: AmbientConfig::default(),
            music: MusicConfig::default(),
            msaa_samples: 4,
            candle_position: Vector3::new(-1.0, 0.0, 0.0),
            person_position: Vector3::new(1.0, 0.0, 0.0),
        }
    }
}

impl RoomConfig {
    /// Default configuration with the asset root taken from `ZENROOM_ASSETS` when set.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var_os(ASSET_ROOT_ENV) {
            Some(root) if !root.is_empty() => config.with_asset_root(root),
            _ => config,
        }
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_msaa_samples(mut self, samples: u32) -> Self {
        self.msaa_samples = samples;
        self
    }
}
