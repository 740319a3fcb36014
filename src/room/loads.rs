//! Outstanding asset loads and what to do with them once they finish.

use std::fmt;

use cgmath::Vector3;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::assets::{AudioClip, ImageData, LoadFuture, ModelData};
use crate::error::AssetError;

/// Which surface a loaded texture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Sky,
    Floor,
    Wall,
    Ceiling,
}

/// Where a model goes once it has loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPlacement {
    pub locator: String,
    pub position: Vector3<f32>,
}

/// A finished load, tagged with its destination in the room.
#[derive(Debug)]
pub enum LoadOutcome {
    Texture { slot: TextureSlot, image: ImageData },
    Model { placement: ModelPlacement, model: ModelData },
    Audio(AudioClip),
}

/// A load that resolved to an error, kept for the degraded-state notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub locator: String,
    pub message: String,
}

impl From<AssetError> for LoadFailure {
    fn from(err: AssetError) -> Self {
        Self {
            locator: err.locator().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub type LoadResult = Result<LoadOutcome, LoadFailure>;

/// The set of loads issued at assembly, polled without blocking each tick.
///
/// Completions come out in whatever order the workers finish. Dropping the
/// set abandons whatever is still outstanding.
#[derive(Default)]
pub struct PendingLoads {
    futures: FuturesUnordered<BoxFuture<'static, LoadResult>>,
}

impl PendingLoads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_texture(&mut self, slot: TextureSlot, load: LoadFuture<ImageData>) {
        self.push(load.map(move |result| {
            result
                .map(|image| LoadOutcome::Texture { slot, image })
                .map_err(LoadFailure::from)
        }));
    }

    pub fn push_model(&mut self, placement: ModelPlacement, load: LoadFuture<ModelData>) {
        self.push(load.map(move |result| {
            result
                .map(|model| LoadOutcome::Model { placement, model })
                .map_err(LoadFailure::from)
        }));
    }

    pub fn push_audio(&mut self, load: LoadFuture<AudioClip>) {
        self.push(load.map(|result| result.map(LoadOutcome::Audio).map_err(LoadFailure::from)));
    }

    fn push<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = LoadResult> + Send + 'static,
    {
        self.futures.push(future.boxed());
    }

    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.futures.is_empty()
    }

    /// Every load that has completed since the last call, without waiting.
    pub fn poll_ready(&mut self) -> Vec<LoadResult> {
        let mut ready = Vec::new();
        while let Some(Some(result)) = self.futures.next().now_or_never() {
            ready.push(result);
        }
        ready
    }

    /// Waits for every outstanding load. Only for tests and headless use.
    pub async fn drain(&mut self) -> Vec<LoadResult> {
        let mut all = Vec::new();
        while let Some(result) = self.futures.next().await {
            all.push(result);
        }
        all
    }
}
