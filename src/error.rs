//! Error types for asset loading and audio playback.

use thiserror::Error;

/// Failure to load one asset. Every load future resolves to `Result<_, AssetError>`.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read '{locator}': {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{locator}': {source}")]
    Image {
        locator: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load OBJ model '{locator}': {source}")]
    Obj {
        locator: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to load glTF model '{locator}': {source}")]
    Gltf {
        locator: String,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to decode audio '{locator}': {source}")]
    Audio {
        locator: String,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("model '{0}' contains no triangle meshes")]
    EmptyModel(String),

    #[error("unsupported asset format for '{0}'")]
    UnsupportedFormat(String),

    #[error("loader worker for '{0}' stopped before finishing")]
    WorkerLost(String),
}

impl AssetError {
    /// Locator of the asset that failed.
    pub fn locator(&self) -> &str {
        match self {
            AssetError::Io { locator, .. }
            | AssetError::Image { locator, .. }
            | AssetError::Obj { locator, .. }
            | AssetError::Gltf { locator, .. }
            | AssetError::Audio { locator, .. } => locator,
            AssetError::EmptyModel(locator)
            | AssetError::UnsupportedFormat(locator)
            | AssetError::WorkerLost(locator) => locator,
        }
    }
}

/// Failure of the audio output device.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output stream available: {0}")]
    Stream(#[from] rodio::StreamError),

    #[error("failed to create audio sink: {0}")]
    Sink(#[from] rodio::PlayError),

    #[error("failed to decode audio clip: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}
