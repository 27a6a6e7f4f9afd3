//! Sound effects. Decoding and output are left to an [`AudioBackend`];
//! this module owns clip loading, volumes and the first-interaction unlock.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::assets::{read_asset, AssetError};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("playback of {0:?} is blocked until the user interacts")]
    Blocked(Sound),
    #[error("audio backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    /// Looping background drone.
    Ambient,
    /// One-shot effect played on a click hit.
    Squish,
}

impl Sound {
    pub fn file_name(self) -> &'static str {
        match self {
            Sound::Ambient => "ambient.mp3",
            Sound::Squish => "squish.mp3",
        }
    }

    pub fn volume(self) -> f32 {
        match self {
            Sound::Ambient => 0.3,
            Sound::Squish => 0.5,
        }
    }

    pub fn looping(self) -> bool {
        matches!(self, Sound::Ambient)
    }
}

/// Encoded clip held in memory.
#[derive(Debug, Clone)]
pub struct Clip {
    pub sound: Sound,
    pub data: Arc<[u8]>,
}

impl Clip {
    pub fn new(sound: Sound, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            sound,
            data: data.into(),
        }
    }

    pub fn load(sound: Sound, dir: impl AsRef<Path>) -> Result<Self, AudioError> {
        let bytes = read_asset(dir.as_ref().join(sound.file_name()))?;
        Ok(Self::new(sound, bytes))
    }
}

pub trait AudioBackend {
    /// Starts `clip` from the beginning, replacing any instance of the same
    /// sound that is still playing.
    fn play(&mut self, clip: &Clip, volume: f32, looping: bool) -> Result<(), AudioError>;
}

/// Backend without an output device; playback requests are only logged.
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play(&mut self, clip: &Clip, volume: f32, looping: bool) -> Result<(), AudioError> {
        debug!(
            "play {:?} ({} bytes, volume {volume}, looping {looping})",
            clip.sound,
            clip.data.len()
        );
        Ok(())
    }
}

/// Plays the ambient loop and the click effect.
///
/// Missing clips turn the matching calls into silent no-ops. The ambient
/// loop does not start until [`SoundManager::on_user_interaction`]; a
/// blocked attempt is retried on the next interaction.
pub struct SoundManager {
    backend: Box<dyn AudioBackend>,
    ambient: Option<Clip>,
    squish: Option<Clip>,
    ambient_started: bool,
}

impl SoundManager {
    pub fn new(
        backend: Box<dyn AudioBackend>,
        ambient: Option<Clip>,
        squish: Option<Clip>,
    ) -> Self {
        Self {
            backend,
            ambient,
            squish,
            ambient_started: false,
        }
    }

    /// Loads both clips from `dir`, logging and skipping any that fail.
    pub fn load(dir: impl AsRef<Path>, backend: Box<dyn AudioBackend>) -> Self {
        let dir = dir.as_ref();
        let load = |sound: Sound| match Clip::load(sound, dir) {
            Ok(clip) => {
                info!("loaded {} from {}", sound.file_name(), dir.display());
                Some(clip)
            }
            Err(err) => {
                warn!("could not load audio clip: {err}; {sound:?} will be silent");
                None
            }
        };
        let ambient = load(Sound::Ambient);
        let squish = load(Sound::Squish);
        Self::new(backend, ambient, squish)
    }

    /// Manager with no clips.
    pub fn silent() -> Self {
        Self::new(Box::new(LogBackend), None, None)
    }

    pub fn ambient_started(&self) -> bool {
        self.ambient_started
    }

    /// Unlocks audio: starts the ambient loop the first time it succeeds.
    pub fn on_user_interaction(&mut self) {
        if self.ambient_started {
            return;
        }
        let Some(clip) = &self.ambient else {
            self.ambient_started = true;
            return;
        };
        match self.backend.play(clip, Sound::Ambient.volume(), Sound::Ambient.looping()) {
            Ok(()) => {
                info!("ambient audio started");
                self.ambient_started = true;
            }
            Err(AudioError::Blocked(_)) => {
                info!("ambient audio blocked; retrying on the next interaction");
            }
            Err(err) => {
                warn!("ambient audio failed: {err}");
                self.ambient_started = true;
            }
        }
    }

    /// Restarts the click effect from the beginning.
    pub fn play_squish(&mut self) {
        let Some(clip) = &self.squish else { return };
        if let Err(err) = self.backend.play(clip, Sound::Squish.volume(), Sound::Squish.looping()) {
            info!("could not play squish sound: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default, Clone)]
    struct Recorder {
        plays: Arc<Mutex<Vec<(Sound, f32, bool)>>>,
        blocked: Arc<Mutex<bool>>,
    }

    impl AudioBackend for Recorder {
        fn play(&mut self, clip: &Clip, volume: f32, looping: bool) -> Result<(), AudioError> {
            if *self.blocked.lock() {
                return Err(AudioError::Blocked(clip.sound));
            }
            self.plays.lock().push((clip.sound, volume, looping));
            Ok(())
        }
    }

    fn manager(recorder: &Recorder) -> SoundManager {
        SoundManager::new(
            Box::new(recorder.clone()),
            Some(Clip::new(Sound::Ambient, vec![1u8])),
            Some(Clip::new(Sound::Squish, vec![2u8])),
        )
    }

    #[test]
    fn ambient_waits_for_first_interaction() {
        let recorder = Recorder::default();
        let mut sounds = manager(&recorder);
        assert!(recorder.plays.lock().is_empty());
        sounds.on_user_interaction();
        sounds.on_user_interaction();
        assert_eq!(*recorder.plays.lock(), vec![(Sound::Ambient, 0.3, true)]);
    }

    #[test]
    fn blocked_ambient_is_retried() {
        let recorder = Recorder::default();
        *recorder.blocked.lock() = true;
        let mut sounds = manager(&recorder);
        sounds.on_user_interaction();
        assert!(!sounds.ambient_started());
        *recorder.blocked.lock() = false;
        sounds.on_user_interaction();
        assert!(sounds.ambient_started());
    }

    #[test]
    fn squish_restarts_each_time() {
        let recorder = Recorder::default();
        let mut sounds = manager(&recorder);
        sounds.play_squish();
        sounds.play_squish();
        assert_eq!(
            *recorder.plays.lock(),
            vec![(Sound::Squish, 0.5, false), (Sound::Squish, 0.5, false)]
        );
    }

    #[test]
    fn missing_clips_are_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut sounds = SoundManager::load(dir.path(), Box::new(LogBackend));
        sounds.play_squish();
        sounds.on_user_interaction();
        assert!(sounds.ambient_started());
    }

    #[test]
    fn clips_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("squish.mp3"), b"ID3").unwrap();
        let clip = Clip::load(Sound::Squish, dir.path()).unwrap();
        assert_eq!(&*clip.data, b"ID3");
        assert!(matches!(
            Clip::load(Sound::Ambient, dir.path()),
            Err(AudioError::Asset(AssetError::Io { .. }))
        ));
    }
}
