//! # Asset Loading
//!
//! Textures, models and audio are read and decoded on worker threads. Each
//! request returns a [`LoadFuture`] that resolves exactly once, to either the
//! decoded asset or an [`AssetError`] naming the locator that failed.
//!
//! Nothing here blocks the caller: the frame loop polls the futures between
//! ticks and applies whatever has completed.

pub mod audio;
pub mod model;
pub mod texture;

use std::path::{Path, PathBuf};
use std::thread;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt};

use crate::error::AssetError;

pub use audio::AudioClip;
pub use model::{MaterialData, MeshData, ModelData, ModelPart};
pub use texture::ImageData;

/// A pending asset load.
pub type LoadFuture<T> = BoxFuture<'static, Result<T, AssetError>>;

/// Resolves asset locators against a root directory and loads them off-thread.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a locator such as `textures/floor.jpg`.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        self.root.join(locator)
    }

    pub fn load_texture(&self, locator: &str) -> LoadFuture<ImageData> {
        let path = self.resolve(locator);
        spawn_decode(locator, move |locator| {
            let bytes = read_bytes(locator, &path)?;
            ImageData::decode(locator, &bytes)
        })
    }

    pub fn load_model(&self, locator: &str) -> LoadFuture<ModelData> {
        let path = self.resolve(locator);
        spawn_decode(locator, move |locator| {
            if !path.is_file() {
                // Report a missing file as I/O rather than a parser error
                read_bytes(locator, &path)?;
            }
            model::decode_model(locator, &path)
        })
    }

    pub fn load_audio(&self, locator: &str) -> LoadFuture<AudioClip> {
        let path = self.resolve(locator);
        spawn_decode(locator, move |locator| {
            let bytes = read_bytes(locator, &path)?;
            AudioClip::decode(locator, bytes)
        })
    }
}

fn read_bytes(locator: &str, path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Io {
        locator: locator.to_string(),
        source,
    })
}

/// Runs `decode` on a worker thread and hands its result back through a oneshot channel.
fn spawn_decode<T, F>(locator: &str, decode: F) -> LoadFuture<T>
where
    T: Send + 'static,
    F: FnOnce(&str) -> Result<T, AssetError> + Send + 'static,
{
    let (sender, receiver) = oneshot::channel();
    let owned = locator.to_string();

    let spawned = thread::Builder::new()
        .name(format!("asset-loader:{}", owned))
        .spawn({
            let locator = owned.clone();
            move || {
                log::debug!("Loading asset '{}'", locator);
                let result = decode(&locator);
                // The receiver may have been dropped with the scene
                let _ = sender.send(result);
            }
        });

    if let Err(err) = spawned {
        log::error!("Could not start loader thread for '{}': {}", owned, err);
    }

    receiver
        .map(move |received| received.unwrap_or(Err(AssetError::WorkerLost(owned))))
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str) {
        let image = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]));
        image.save(dir.join(name)).unwrap();
    }

    #[test]
    fn texture_loads_off_thread() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("textures")).unwrap();
        write_png(&dir.path().join("textures"), "floor.png");

        let loader = AssetLoader::new(dir.path());
        let image = pollster::block_on(loader.load_texture("textures/floor.png")).unwrap();

        assert_eq!((image.width, image.height), (4, 4));
        assert_eq!(&image.rgba[0..4], &[200, 100, 50, 255]);
    }

    #[test]
    fn missing_files_fail_with_their_locator() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(dir.path());

        let texture = pollster::block_on(loader.load_texture("textures/sky.jpg")).unwrap_err();
        assert!(matches!(texture, AssetError::Io { .. }));
        assert_eq!(texture.locator(), "textures/sky.jpg");

        let model = pollster::block_on(loader.load_model("models/candle.glb")).unwrap_err();
        assert!(matches!(model, AssetError::Io { .. }));
        assert_eq!(model.locator(), "models/candle.glb");

        let audio = pollster::block_on(loader.load_audio("music/relax.mp3")).unwrap_err();
        assert_eq!(audio.locator(), "music/relax.mp3");
    }

    #[test]
    fn resolve_joins_the_root() {
        let loader = AssetLoader::new("/srv/room");
        assert_eq!(
            loader.resolve("models/candle.glb"),
            PathBuf::from("/srv/room/models/candle.glb")
        );
    }
}
