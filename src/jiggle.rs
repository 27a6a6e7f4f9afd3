use glam::Vec3;

pub const DURATION: f32 = 0.5;
pub const FREQUENCY: f32 = 20.0;
pub const INTENSITY: f32 = 0.15;
/// Per-axis frequency multipliers so the axes wobble out of phase.
pub const AXIS_RATES: Vec3 = Vec3::new(1.0, 1.3, 0.8);

/// Decaying scale wobble played when the eyeball is clicked.
///
/// The rest scale is captured by the first trigger and is restored exactly
/// once the animation ends. Triggering again while running restarts the
/// envelope without recapturing, so overlapping clicks never drift the scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jiggle {
    rest_scale: Option<Vec3>,
    elapsed: f32,
    active: bool,
}

impl Jiggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self, current_scale: Vec3) {
        self.rest_scale.get_or_insert(current_scale);
        self.elapsed = 0.0;
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rest_scale(&self) -> Option<Vec3> {
        self.rest_scale
    }

    /// Current wobble amplitude, zero when idle.
    pub fn envelope(&self) -> f32 {
        if self.active {
            envelope(self.elapsed)
        } else {
            0.0
        }
    }

    /// Advances the animation and returns the scale to apply, or `None` when
    /// idle. The frame that ends the animation returns the rest scale.
    pub fn update(&mut self, dt: f32) -> Option<Vec3> {
        if !self.active {
            return None;
        }
        let rest = self.rest_scale?;
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
        if self.elapsed >= DURATION {
            self.active = false;
            return Some(rest);
        }
        Some(rest + oscillation(self.elapsed) * self.envelope())
    }
}

fn envelope(t: f32) -> f32 {
    INTENSITY * (1.0 - t / DURATION).max(0.0)
}

fn oscillation(t: f32) -> Vec3 {
    let phase = AXIS_RATES * (t * FREQUENCY);
    Vec3::new(phase.x.sin(), phase.y.sin(), phase.z.sin())
}
