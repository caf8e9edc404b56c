//! Mock audio device.

use parking_lot::Mutex;
use quarry_assets::{AudioDevice, DeviceError, SoundObject};

/// Records a device call for verification in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    CreateSound { name: String, size: usize, streamed: bool },
}

/// Mock implementation of [`AudioDevice`].
///
/// Accepts WAV, Ogg, FLAC and MP3 signatures.
#[derive(Default)]
pub struct MockAudioDevice {
    calls: Mutex<Vec<AudioCall>>,
    next_id: Mutex<u64>,
}

impl MockAudioDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of all recorded calls.
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().clone()
    }

    pub fn count_sound_creates(&self) -> usize {
        self.calls.lock().len()
    }

    /// Count streamed creates (music).
    pub fn count_streamed(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|AudioCall::CreateSound { streamed, .. }| *streamed)
            .count()
    }
}

impl AudioDevice for MockAudioDevice {
    fn create_sound(&self, name: &str, bytes: &[u8], streamed: bool) -> Result<SoundObject, DeviceError> {
        let known: [&[u8]; 5] = [b"RIFF", b"OggS", b"fLaC", b"ID3", b"\xff\xfb"];
        if !known.iter().any(|magic| bytes.starts_with(magic)) {
            return Err(DeviceError::new("unrecognised audio format"));
        }

        let mut next = self.next_id.lock();
        *next += 1;
        self.calls.lock().push(AudioCall::CreateSound {
            name: name.to_string(),
            size: bytes.len(),
            streamed,
        });
        Ok(SoundObject { id: *next, streamed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_records_streamed_flag() {
        let mock = MockAudioDevice::new();
        mock.create_sound("hit.wav", &fixtures::wav(), false).unwrap();
        let music = mock.create_sound("theme.ogg", &fixtures::ogg(), true).unwrap();
        assert!(music.streamed);
        assert!(mock.create_sound("x.mp3", b"nope", false).is_err());
        assert_eq!(mock.count_sound_creates(), 2);
        assert_eq!(mock.count_streamed(), 1);
    }
}
