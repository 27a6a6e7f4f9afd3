use std::sync::Arc;

use glam::Vec2;
use log::debug;

use crate::audio::SoundManager;
use crate::binder::ParameterBinder;
use crate::camera::{Camera, EyeTransform};
use crate::interaction::GazeTracker;
use crate::jiggle::Jiggle;
use crate::params::ParamId;
use crate::viewport::ViewportProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Hit,
    Miss,
}

/// Everything that changes while the eyeball is on screen.
///
/// Input callbacks only move targets or start the jiggle; [`Eyeball::frame`]
/// advances gaze smoothing, then the jiggle, then shader time.
pub struct Eyeball {
    binder: ParameterBinder,
    gaze: GazeTracker,
    jiggle: Jiggle,
    transform: EyeTransform,
    camera: Camera,
    sounds: SoundManager,
    viewport: Arc<dyn ViewportProvider>,
}

impl Eyeball {
    pub fn new(
        binder: ParameterBinder,
        sounds: SoundManager,
        viewport: Arc<dyn ViewportProvider>,
    ) -> Self {
        let gaze = GazeTracker::new(binder.parameters().float(ParamId::PupilSize));
        let camera = Camera::new(viewport.aspect());
        Self {
            binder,
            gaze,
            jiggle: Jiggle::new(),
            transform: EyeTransform::default(),
            camera,
            sounds,
            viewport,
        }
    }

    pub fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    pub fn binder_mut(&mut self) -> &mut ParameterBinder {
        &mut self.binder
    }

    pub fn gaze(&self) -> &GazeTracker {
        &self.gaze
    }

    pub fn jiggle(&self) -> &Jiggle {
        &self.jiggle
    }

    pub fn transform(&self) -> EyeTransform {
        self.transform
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Pointer moved to `position` in window pixels.
    pub fn on_pointer_move(&mut self, position: Vec2) {
        let ndc = self.viewport.to_ndc(position);
        let base = self.binder.parameters().float(ParamId::PupilSize);
        self.gaze.on_pointer_move(ndc, base);
    }

    /// Pointer clicked at `position` in window pixels.
    ///
    /// Any click unlocks audio; only a hit on the eyeball jiggles it.
    pub fn on_click(&mut self, position: Vec2) -> ClickOutcome {
        self.sounds.on_user_interaction();

        self.camera.set_aspect(self.viewport.aspect());
        let ray = self.camera.ray(self.viewport.to_ndc(position));
        match self.transform.intersect(&ray) {
            Some(distance) => {
                debug!("eyeball hit at distance {distance:.3}; jiggling");
                self.jiggle.trigger(self.transform.scale);
                self.sounds.play_squish();
                ClickOutcome::Hit
            }
            None => ClickOutcome::Miss,
        }
    }

    /// Advances one frame by `dt` seconds.
    pub fn frame(&mut self, dt: f32) {
        self.gaze
            .set_base_pupil(self.binder.parameters().float(ParamId::PupilSize));
        self.gaze.update();
        self.gaze.apply(&mut self.binder);
        self.transform.rotation = self.gaze.orientation();

        if let Some(scale) = self.jiggle.update(dt) {
            self.transform.scale = scale;
        }

        self.binder.advance_time(dt);
        self.camera.set_aspect(self.viewport.aspect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::StaticViewport;
    use glam::Vec3;

    fn eyeball() -> Eyeball {
        Eyeball::new(
            ParameterBinder::default(),
            SoundManager::silent(),
            Arc::new(StaticViewport::new(800, 600)),
        )
    }

    #[test]
    fn click_in_the_middle_hits() {
        let mut eye = eyeball();
        assert_eq!(eye.on_click(Vec2::new(400.0, 300.0)), ClickOutcome::Hit);
        assert!(eye.jiggle().is_active());
    }

    #[test]
    fn click_in_the_corner_misses() {
        let mut eye = eyeball();
        assert_eq!(eye.on_click(Vec2::new(5.0, 5.0)), ClickOutcome::Miss);
        assert!(!eye.jiggle().is_active());
    }

    #[test]
    fn jiggle_settles_back_to_unit_scale() {
        let mut eye = eyeball();
        eye.on_click(Vec2::new(400.0, 300.0));
        eye.frame(0.1);
        assert_ne!(eye.transform().scale, Vec3::ONE);
        for _ in 0..10 {
            eye.frame(0.1);
        }
        assert_eq!(eye.transform().scale, Vec3::ONE);
    }

    #[test]
    fn frames_feed_the_uniform_block() {
        let mut eye = eyeball();
        eye.on_pointer_move(Vec2::new(800.0, 300.0));
        for _ in 0..60 {
            eye.frame(1.0 / 60.0);
        }
        let uniforms = eye.binder().uniforms();
        assert!(uniforms.eye_direction().x > 0.4);
        assert!((uniforms.time() - 1.0).abs() < 1e-3);
        assert!(eye.transform().rotation.is_normalized());
    }
}
