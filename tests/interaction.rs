use std::sync::Arc;

use eyeball::{
    AudioBackend, AudioError, ClickOutcome, Clip, Eyeball, ParamId, ParameterBinder, Sound,
    SoundManager, StaticViewport,
};
use glam::{Vec2, Vec3};
use parking_lot::Mutex;

#[derive(Clone, Default)]
struct Recorder {
    plays: Arc<Mutex<Vec<Sound>>>,
}

impl AudioBackend for Recorder {
    fn play(&mut self, clip: &Clip, _volume: f32, _looping: bool) -> Result<(), AudioError> {
        self.plays.lock().push(clip.sound);
        Ok(())
    }
}

fn eyeball_with(recorder: &Recorder) -> Eyeball {
    let sounds = SoundManager::new(
        Box::new(recorder.clone()),
        Some(Clip::new(Sound::Ambient, vec![0u8; 4])),
        Some(Clip::new(Sound::Squish, vec![0u8; 4])),
    );
    Eyeball::new(
        ParameterBinder::default(),
        sounds,
        Arc::new(StaticViewport::new(1000, 1000)),
    )
}

fn squishes(recorder: &Recorder) -> usize {
    recorder
        .plays
        .lock()
        .iter()
        .filter(|sound| **sound == Sound::Squish)
        .count()
}

#[test]
fn hit_jiggles_once_and_squishes_once() {
    let recorder = Recorder::default();
    let mut eye = eyeball_with(&recorder);

    assert_eq!(eye.on_click(Vec2::new(500.0, 500.0)), ClickOutcome::Hit);
    assert!(eye.jiggle().is_active());
    assert_eq!(squishes(&recorder), 1);
    assert_eq!(recorder.plays.lock().first(), Some(&Sound::Ambient));

    let mut scales = Vec::new();
    for _ in 0..40 {
        eye.frame(1.0 / 60.0);
        scales.push(eye.transform().scale);
    }
    assert!(scales.iter().any(|scale| *scale != Vec3::ONE));
    assert_eq!(eye.transform().scale, Vec3::ONE);
    assert!(!eye.jiggle().is_active());
    assert_eq!(squishes(&recorder), 1);
}

#[test]
fn miss_neither_jiggles_nor_squishes() {
    let recorder = Recorder::default();
    let mut eye = eyeball_with(&recorder);

    assert_eq!(eye.on_click(Vec2::new(10.0, 10.0)), ClickOutcome::Miss);
    assert!(!eye.jiggle().is_active());
    assert_eq!(squishes(&recorder), 0);
    // The click still unlocks the ambient loop.
    assert_eq!(*recorder.plays.lock(), vec![Sound::Ambient]);

    eye.frame(1.0 / 60.0);
    assert_eq!(eye.transform().scale, Vec3::ONE);
}

#[test]
fn ambient_starts_only_once() {
    let recorder = Recorder::default();
    let mut eye = eyeball_with(&recorder);
    eye.on_click(Vec2::new(10.0, 10.0));
    eye.on_click(Vec2::new(500.0, 500.0));
    eye.on_click(Vec2::new(500.0, 500.0));
    let ambient = recorder
        .plays
        .lock()
        .iter()
        .filter(|sound| **sound == Sound::Ambient)
        .count();
    assert_eq!(ambient, 1);
    assert_eq!(squishes(&recorder), 2);
}

#[test]
fn pointer_in_the_centre_dilates_the_live_pupil() {
    let recorder = Recorder::default();
    let mut eye = eyeball_with(&recorder);
    eye.on_pointer_move(Vec2::new(500.0, 500.0));
    for _ in 0..120 {
        eye.frame(1.0 / 60.0);
    }
    let base = eye.binder().parameters().float(ParamId::PupilSize);
    assert!((eye.binder().live_pupil_size() - base * 1.5).abs() < 1e-3);
    assert!(eye.gaze().rotation().length() < 1e-4);
}
