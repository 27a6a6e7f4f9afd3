//! Pointer tracking: gaze rotation and proximity-driven pupil dilation.

use std::f32::consts::{FRAC_PI_6, SQRT_2};

use glam::{EulerRot, Quat, Vec2, Vec3};

use crate::binder::ParameterBinder;
use crate::params::ParamId;

/// Pupil scale when the pointer sits at the centre of the viewport.
pub const MAX_PUPIL_SCALE: f32 = 1.5;
/// Fraction of the remaining distance covered each frame.
pub const SMOOTHNESS: f32 = 0.1;
/// Largest gaze rotation about either axis (30 degrees).
pub const MAX_ROTATION: f32 = FRAC_PI_6;

/// Smoothly follows the pointer with the eye and dilates the pupil as the
/// pointer approaches the centre.
///
/// Targets change on pointer movement and base pupil edits; [`GazeTracker::update`]
/// advances the smoothed state by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeTracker {
    pointer: Option<Vec2>,
    base_pupil: f32,
    /// Pitch in `x`, yaw in `y`.
    target_rotation: Vec2,
    current_rotation: Vec2,
    target_pupil: f32,
    current_pupil: f32,
}

impl GazeTracker {
    pub fn new(base_pupil: f32) -> Self {
        Self {
            pointer: None,
            base_pupil,
            target_rotation: Vec2::ZERO,
            current_rotation: Vec2::ZERO,
            target_pupil: base_pupil,
            current_pupil: base_pupil,
        }
    }

    /// Records a pointer position in normalised device coordinates.
    ///
    /// Positions outside `[-1, 1]` are clamped; non-finite input is ignored.
    pub fn on_pointer_move(&mut self, ndc: Vec2, base_pupil: f32) {
        if !ndc.is_finite() {
            return;
        }
        let ndc = ndc.clamp(Vec2::NEG_ONE, Vec2::ONE);
        self.pointer = Some(ndc);
        self.base_pupil = base_pupil;
        self.target_rotation = Vec2::new(-ndc.y * MAX_ROTATION, ndc.x * MAX_ROTATION);
        self.target_pupil = base_pupil * pupil_scale(ndc);
    }

    /// Follows an edit of the base pupil size without waiting for the
    /// pointer to move.
    pub fn set_base_pupil(&mut self, base_pupil: f32) {
        if base_pupil == self.base_pupil || !base_pupil.is_finite() {
            return;
        }
        self.base_pupil = base_pupil;
        self.target_pupil = base_pupil * self.pointer.map_or(1.0, pupil_scale);
    }

    /// Advances one frame of exponential smoothing and returns the new
    /// rotation.
    pub fn update(&mut self) -> Vec2 {
        self.current_rotation += (self.target_rotation - self.current_rotation) * SMOOTHNESS;
        self.current_pupil += (self.target_pupil - self.current_pupil) * SMOOTHNESS;
        self.current_rotation
    }

    /// Pushes the smoothed pupil size and look direction into the binder.
    pub fn apply(&self, binder: &mut ParameterBinder) {
        binder.drive_pupil_size(self.current_pupil);
        binder.set_eye_direction(self.eye_direction());
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn rotation(&self) -> Vec2 {
        self.current_rotation
    }

    pub fn target_rotation(&self) -> Vec2 {
        self.target_rotation
    }

    pub fn pupil_size(&self) -> f32 {
        self.current_pupil
    }

    pub fn target_pupil_size(&self) -> f32 {
        self.target_pupil
    }

    /// Eyeball orientation: pitch applied after yaw.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.current_rotation.x,
            self.current_rotation.y,
            0.0,
        )
    }

    /// Forward axis rotated by the current orientation.
    pub fn eye_direction(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }
}

impl Default for GazeTracker {
    fn default() -> Self {
        Self::new(ParamId::PupilSize.spec().kind.default_value().as_float())
    }
}

/// Dilation factor: [`MAX_PUPIL_SCALE`] at the centre, 1 at the corners.
pub fn pupil_scale(ndc: Vec2) -> f32 {
    let proximity = 1.0 - (ndc.length() / SQRT_2).min(1.0);
    1.0 + (MAX_PUPIL_SCALE - 1.0) * proximity
}
