use glam::{Vec2, Vec3};

/// Hard cap on the number of layers an FBM evaluation sums.
pub const MAX_OCTAVES: u32 = 8;

/// Parameters of a single fractal-sum evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseLayerConfig {
    pub octaves: u32,
    pub frequency: f32,
    pub amplitude: f32,
    pub lacunarity: f32,
    pub gain: f32,
}

impl NoiseLayerConfig {
    pub const fn new(octaves: u32, frequency: f32, amplitude: f32, lacunarity: f32, gain: f32) -> Self {
        Self {
            octaves,
            frequency,
            amplitude,
            lacunarity,
            gain,
        }
    }

    /// Number of layers actually evaluated.
    pub fn effective_octaves(&self) -> u32 {
        self.octaves.min(MAX_OCTAVES)
    }
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn hash_component(x: f32) -> f32 {
    -1.0 + 2.0 * fract(x.sin() * 43758.547)
}

fn hash2(p: Vec2) -> Vec2 {
    Vec2::new(
        hash_component(p.dot(Vec2::new(127.1, 311.7))),
        hash_component(p.dot(Vec2::new(269.5, 183.3))),
    )
}

fn hash3(p: Vec3) -> Vec3 {
    Vec3::new(
        hash_component(p.dot(Vec3::new(127.1, 311.7, 74.7))),
        hash_component(p.dot(Vec3::new(269.5, 183.3, 246.1))),
        hash_component(p.dot(Vec3::new(113.5, 271.9, 124.6))),
    )
}

fn quintic(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Gradient noise over the integer lattice, in `[-1, 1]`.
pub fn gradient_noise_2d(p: Vec2) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let ux = quintic(f.x);
    let uy = quintic(f.y);

    let corner = |offset: Vec2| hash2(cell + offset).dot(f - offset);

    let bottom = lerp(corner(Vec2::new(0.0, 0.0)), corner(Vec2::new(1.0, 0.0)), ux);
    let top = lerp(corner(Vec2::new(0.0, 1.0)), corner(Vec2::new(1.0, 1.0)), ux);
    lerp(bottom, top, uy).clamp(-1.0, 1.0)
}

/// Three dimensional counterpart of [`gradient_noise_2d`].
pub fn gradient_noise_3d(p: Vec3) -> f32 {
    let cell = p.floor();
    let f = p - cell;
    let u = Vec3::new(quintic(f.x), quintic(f.y), quintic(f.z));

    let corner = |offset: Vec3| hash3(cell + offset).dot(f - offset);

    let near = lerp(
        lerp(corner(Vec3::new(0.0, 0.0, 0.0)), corner(Vec3::new(1.0, 0.0, 0.0)), u.x),
        lerp(corner(Vec3::new(0.0, 1.0, 0.0)), corner(Vec3::new(1.0, 1.0, 0.0)), u.x),
        u.y,
    );
    let far = lerp(
        lerp(corner(Vec3::new(0.0, 0.0, 1.0)), corner(Vec3::new(1.0, 0.0, 1.0)), u.x),
        lerp(corner(Vec3::new(0.0, 1.0, 1.0)), corner(Vec3::new(1.0, 1.0, 1.0)), u.x),
        u.y,
    );
    lerp(near, far, u.z).clamp(-1.0, 1.0)
}

/// Fractal sum of [`gradient_noise_2d`]. Octaves above [`MAX_OCTAVES`] are ignored.
pub fn fbm_2d(p: Vec2, layer: &NoiseLayerConfig) -> f32 {
    let mut value = 0.0;
    let mut frequency = layer.frequency;
    let mut amplitude = layer.amplitude;
    for _ in 0..layer.effective_octaves() {
        value += amplitude * gradient_noise_2d(p * frequency);
        frequency *= layer.lacunarity;
        amplitude *= layer.gain;
    }
    value
}

/// Fractal sum of [`gradient_noise_3d`]. Octaves above [`MAX_OCTAVES`] are ignored.
pub fn fbm_3d(p: Vec3, layer: &NoiseLayerConfig) -> f32 {
    let mut value = 0.0;
    let mut frequency = layer.frequency;
    let mut amplitude = layer.amplitude;
    for _ in 0..layer.effective_octaves() {
        value += amplitude * gradient_noise_3d(p * frequency);
        frequency *= layer.lacunarity;
        amplitude *= layer.gain;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small xorshift generator so the sample set is reproducible.
    struct Sampler(u32);

    impl Sampler {
        fn next(&mut self) -> f32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            (self.0 as f32 / u32::MAX as f32) * 200.0 - 100.0
        }
    }

    #[test]
    fn noise_stays_within_unit_range() {
        let mut rng = Sampler(0x9e37_79b9);
        for _ in 0..20_000 {
            let n2 = gradient_noise_2d(Vec2::new(rng.next(), rng.next()));
            let n3 = gradient_noise_3d(Vec3::new(rng.next(), rng.next(), rng.next()));
            assert!((-1.0..=1.0).contains(&n2), "2d sample out of range: {n2}");
            assert!((-1.0..=1.0).contains(&n3), "3d sample out of range: {n3}");
        }
    }

    #[test]
    fn noise_vanishes_on_lattice_points() {
        assert_eq!(gradient_noise_2d(Vec2::new(3.0, -7.0)), 0.0);
        assert_eq!(gradient_noise_3d(Vec3::new(-2.0, 5.0, 1.0)), 0.0);
    }

    #[test]
    fn fbm_is_deterministic() {
        let layer = NoiseLayerConfig::new(5, 2.0, 1.0, 1.7, 0.55);
        let p = Vec3::new(0.31, -0.72, 0.62);
        let first = fbm_3d(p, &layer);
        for _ in 0..10 {
            assert_eq!(fbm_3d(p, &layer).to_bits(), first.to_bits());
        }
        let q = Vec2::new(1.2, 0.4);
        assert_eq!(fbm_2d(q, &layer).to_bits(), fbm_2d(q, &layer).to_bits());
    }

    #[test]
    fn octaves_above_cap_are_ignored() {
        let capped = NoiseLayerConfig::new(8, 0.57, 2.0, 2.0, 0.9);
        let excessive = NoiseLayerConfig { octaves: 20, ..capped };
        for p in [Vec2::new(0.5, 0.25), Vec2::new(-3.1, 0.9), Vec2::new(2.2, 0.37)] {
            assert_eq!(fbm_2d(p, &excessive), fbm_2d(p, &capped));
        }
        let p = Vec3::new(0.2, 0.4, -0.9);
        assert_eq!(fbm_3d(p, &excessive), fbm_3d(p, &capped));
    }

    #[test]
    fn zero_octaves_yield_zero() {
        let layer = NoiseLayerConfig::new(0, 1.0, 1.0, 2.0, 0.5);
        assert_eq!(fbm_3d(Vec3::new(0.3, 0.3, 0.3), &layer), 0.0);
    }
}
