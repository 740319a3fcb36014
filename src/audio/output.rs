//! Audio output backends
//!
//! [`RodioOutput`] plays through the default device. [`SilentOutput`] stands
//! in when no device is available so the rest of the room keeps working.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::assets::AudioClip;
use crate::error::AudioError;

/// Volume and looping applied when a clip is loaded into an output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub volume: f32,
    pub looping: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 0.5,
            looping: true,
        }
    }
}

/// A device that can hold one clip and play or pause it.
pub trait AudioOutput {
    /// Replaces the current clip. The new clip starts paused.
    fn load(&mut self, clip: &AudioClip, settings: PlaybackSettings) -> Result<(), AudioError>;

    /// Starts or resumes the loaded clip. No-op without a clip.
    fn play(&mut self);

    fn pause(&mut self);
}

/// Plays through the system's default output device.
pub struct RodioOutput {
    // Dropping the stream stops all sound
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioOutput {
    pub fn try_default() -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, clip: &AudioClip, settings: PlaybackSettings) -> Result<(), AudioError> {
        let sink = Sink::try_new(&self.handle)?;
        sink.pause();
        sink.set_volume(settings.volume);

        let source = Decoder::new(clip.cursor())?;
        if settings.looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }

        if let Some(previous) = self.sink.replace(sink) {
            previous.stop();
        }
        Ok(())
    }

    fn play(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }
}

/// Accepts every call and makes no sound.
#[derive(Debug, Default)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn load(&mut self, _clip: &AudioClip, _settings: PlaybackSettings) -> Result<(), AudioError> {
        Ok(())
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}
}

/// Opens the default device, falling back to [`SilentOutput`] with a warning.
pub fn open_default_output() -> Box<dyn AudioOutput> {
    match RodioOutput::try_default() {
        Ok(output) => {
            log::info!("Audio output opened on the default device");
            Box::new(output)
        }
        Err(err) => {
            log::warn!("{}; music will be silent", err);
            Box::new(SilentOutput)
        }
    }
}
