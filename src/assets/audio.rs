//! Encoded audio clips.

use std::io::Cursor;
use std::sync::Arc;

use crate::error::AssetError;

/// An audio file held in memory, validated as decodable.
///
/// The bytes are shared, so every playback gets its own cursor without copying.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub locator: String,
    bytes: Arc<[u8]>,
}

impl AudioClip {
    /// Wraps already-validated bytes.
    pub fn new(locator: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            locator: locator.into(),
            bytes: bytes.into(),
        }
    }

    /// Checks that `bytes` hold a format rodio can decode.
    pub fn decode(locator: &str, bytes: Vec<u8>) -> Result<Self, AssetError> {
        let clip = Self::new(locator, bytes);
        rodio::Decoder::new(clip.cursor()).map_err(|source| AssetError::Audio {
            locator: locator.to_string(),
            source,
        })?;
        Ok(clip)
    }

    /// A fresh reader over the encoded bytes.
    pub fn cursor(&self) -> Cursor<Arc<[u8]>> {
        Cursor::new(self.bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal 16-bit mono PCM WAV with `samples` silent samples.
    fn silent_wav(samples: u32) -> Vec<u8> {
        let data_len = samples * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&1u16.to_le_bytes()); // mono
        wav.extend_from_slice(&8000u32.to_le_bytes());
        wav.extend_from_slice(&16000u32.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);
        wav
    }

    #[test]
    fn wav_clip_decodes() {
        let clip = AudioClip::decode("music/silence.wav", silent_wav(800)).unwrap();
        assert_eq!(clip.locator, "music/silence.wav");
        assert_eq!(clip.len(), 44 + 1600);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = AudioClip::decode("music/relax.mp3", vec![0u8; 16]).unwrap_err();
        assert!(matches!(err, AssetError::Audio { .. }));
        assert_eq!(err.locator(), "music/relax.mp3");
    }
}
