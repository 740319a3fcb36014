use crate::assets::AudioClip;
use crate::error::AudioError;

use super::output::{AudioOutput, PlaybackSettings};

/// Whether the music is meant to be audible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
}

impl PlaybackState {
    fn flipped(self) -> Self {
        match self {
            PlaybackState::Paused => PlaybackState::Playing,
            PlaybackState::Playing => PlaybackState::Paused,
        }
    }
}

/// Two-state music switch behind the "Play Music"/"Pause Music" button.
///
/// The state may be toggled before any clip is attached; the flag flips
/// silently and playback starts when the clip arrives if the state is
/// [`PlaybackState::Playing`] at that moment.
pub struct AudioToggle {
    state: PlaybackState,
    settings: PlaybackSettings,
    clip: Option<String>,
    output: Box<dyn AudioOutput>,
}

impl AudioToggle {
    pub fn new(output: Box<dyn AudioOutput>, settings: PlaybackSettings) -> Self {
        Self {
            state: PlaybackState::Paused,
            settings,
            clip: None,
            output,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    /// Locator of the attached clip, if one has loaded.
    pub fn clip(&self) -> Option<&str> {
        self.clip.as_deref()
    }

    /// Button label naming the next action.
    pub fn label(&self) -> &'static str {
        match self.state {
            PlaybackState::Paused => "Play Music",
            PlaybackState::Playing => "Pause Music",
        }
    }

    pub fn toggle(&mut self) -> PlaybackState {
        self.state = self.state.flipped();
        if self.clip.is_some() {
            match self.state {
                PlaybackState::Playing => self.output.play(),
                PlaybackState::Paused => self.output.pause(),
            }
        }
        log::info!(
            "Music {:?}{}",
            self.state,
            if self.clip.is_none() { " (clip not loaded yet)" } else { "" }
        );
        self.state
    }

    /// Hands a loaded clip to the output, starting it if the toggle is on.
    pub fn attach_clip(&mut self, clip: &AudioClip) -> Result<(), AudioError> {
        self.output.load(clip, self.settings)?;
        self.clip = Some(clip.locator.clone());
        if self.is_playing() {
            self.output.play();
        }
        log::debug!("Music clip '{}' attached ({} bytes)", clip.locator, clip.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String, PlaybackSettings),
        Play,
        Pause,
    }

    #[derive(Clone, Default)]
    struct Recording(Rc<RefCell<Vec<Call>>>);

    impl AudioOutput for Recording {
        fn load(&mut self, clip: &AudioClip, settings: PlaybackSettings) -> Result<(), AudioError> {
            self.0
                .borrow_mut()
                .push(Call::Load(clip.locator.clone(), settings));
            Ok(())
        }

        fn play(&mut self) {
            self.0.borrow_mut().push(Call::Play);
        }

        fn pause(&mut self) {
            self.0.borrow_mut().push(Call::Pause);
        }
    }

    fn toggle_with_recorder() -> (AudioToggle, Recording) {
        let recording = Recording::default();
        let toggle = AudioToggle::new(Box::new(recording.clone()), PlaybackSettings::default());
        (toggle, recording)
    }

    fn clip() -> AudioClip {
        AudioClip::new("music/relax.mp3", vec![0u8; 4])
    }

    #[test]
    fn toggling_alternates_state_and_label() {
        let (mut toggle, _) = toggle_with_recorder();
        assert_eq!(toggle.state(), PlaybackState::Paused);
        assert_eq!(toggle.label(), "Play Music");

        assert_eq!(toggle.toggle(), PlaybackState::Playing);
        assert_eq!(toggle.label(), "Pause Music");

        assert_eq!(toggle.toggle(), PlaybackState::Paused);
        assert_eq!(toggle.label(), "Play Music");
    }

    #[test]
    fn toggling_before_load_is_silent() {
        let (mut toggle, recording) = toggle_with_recorder();
        toggle.toggle();
        toggle.toggle();
        assert!(recording.0.borrow().is_empty());
    }

    #[test]
    fn clip_arriving_while_playing_starts_playback() {
        let (mut toggle, recording) = toggle_with_recorder();
        toggle.toggle();
        toggle.attach_clip(&clip()).unwrap();

        assert_eq!(toggle.clip(), Some("music/relax.mp3"));
        assert_eq!(
            *recording.0.borrow(),
            vec![
                Call::Load(
                    "music/relax.mp3".to_string(),
                    PlaybackSettings {
                        volume: 0.5,
                        looping: true
                    }
                ),
                Call::Play,
            ]
        );
    }

    #[test]
    fn clip_arriving_while_paused_stays_quiet() {
        let (mut toggle, recording) = toggle_with_recorder();
        toggle.attach_clip(&clip()).unwrap();
        assert_eq!(recording.0.borrow().len(), 1);

        toggle.toggle();
        toggle.toggle();
        assert_eq!(recording.0.borrow()[1..], [Call::Play, Call::Pause]);
    }
}
