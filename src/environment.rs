//! Equirectangular environment map with a box-filtered mip chain.
//!
//! The same mip chain is uploaded to the GPU and sampled on the CPU by the
//! reference shading pipeline, so blur levels agree between the two.

use std::f32::consts::PI;
use std::path::Path;

use glam::{Vec2, Vec3};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{info, warn};

use crate::assets::{read_asset, AssetError};

/// Background colour used when no environment image is available (`#0a0a0a`).
pub const FALLBACK_COLOR: [u8; 3] = [0x0a, 0x0a, 0x0a];

/// Anything the shading pipeline can reflect.
pub trait Environment {
    /// Returns linear RGB along `direction`, blurred by `lod` mip levels.
    fn sample(&self, direction: Vec3, lod: f32) -> Vec3;
}

/// sRGB encoded environment image and its mip chain.
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    levels: Vec<RgbaImage>,
}

impl EnvironmentMap {
    /// Builds the mip chain down to a single texel.
    pub fn from_image(base: RgbaImage) -> Self {
        let mut levels = vec![base];
        loop {
            let Some(last) = levels.last() else { break };
            let (width, height) = last.dimensions();
            if width <= 1 && height <= 1 {
                break;
            }
            let next = imageops::resize(
                last,
                (width / 2).max(1),
                (height / 2).max(1),
                FilterType::Triangle,
            );
            levels.push(next);
        }
        Self { levels }
    }

    /// Single-texel map of a flat colour.
    pub fn solid(color: [u8; 3]) -> Self {
        let [r, g, b] = color;
        Self::from_image(RgbaImage::from_pixel(1, 1, Rgba([r, g, b, 255])))
    }

    pub fn levels(&self) -> &[RgbaImage] {
        &self.levels
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.levels[0].dimensions()
    }

    fn sample_level(&self, level: usize, uv: Vec2) -> Vec3 {
        let image = &self.levels[level];
        let (width, height) = image.dimensions();
        let x = uv.x * width as f32 - 0.5;
        let y = uv.y * height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;

        let texel = |ix: i64, iy: i64| {
            let ix = ix.rem_euclid(width as i64) as u32;
            let iy = iy.clamp(0, height as i64 - 1) as u32;
            let Rgba([r, g, b, _]) = *image.get_pixel(ix, iy);
            Vec3::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
        };

        let (ix, iy) = (x0 as i64, y0 as i64);
        let top = texel(ix, iy).lerp(texel(ix + 1, iy), tx);
        let bottom = texel(ix, iy + 1).lerp(texel(ix + 1, iy + 1), tx);
        top.lerp(bottom, ty)
    }
}

impl Environment for EnvironmentMap {
    fn sample(&self, direction: Vec3, lod: f32) -> Vec3 {
        let uv = direction_to_uv(direction);
        let max_level = (self.levels.len() - 1) as f32;
        let lod = if lod.is_finite() { lod.clamp(0.0, max_level) } else { 0.0 };
        let lower = lod.floor();
        let upper = (lower + 1.0).min(max_level);
        let t = lod - lower;
        let near = self.sample_level(lower as usize, uv);
        if t == 0.0 {
            return near;
        }
        near.lerp(self.sample_level(upper as usize, uv), t)
    }
}

/// Maps a direction to equirectangular texture coordinates (`v` grows downwards).
pub fn direction_to_uv(direction: Vec3) -> Vec2 {
    let dir = direction.try_normalize().unwrap_or(Vec3::Z);
    let u = dir.z.atan2(dir.x) / (2.0 * PI) + 0.5;
    let v = (0.5 - dir.y.clamp(-1.0, 1.0).asin() / PI).clamp(0.0, 1.0);
    Vec2::new(u, v)
}

pub fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Inverse of [`srgb_to_linear`] on unit floats.
pub fn linear_to_srgb(value: f32) -> f32 {
    let v = value.clamp(0.0, 1.0);
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Loads and decodes an equirectangular environment image.
pub fn load_environment(path: impl AsRef<Path>) -> Result<EnvironmentMap, AssetError> {
    let path = path.as_ref();
    let bytes = read_asset(path)?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(EnvironmentMap::from_image(image.to_rgba8()))
}

/// Substitute used when [`load_environment`] fails.
pub fn fallback_environment(error: &AssetError) -> EnvironmentMap {
    warn!("could not load environment map: {error}; using a flat dark background");
    EnvironmentMap::solid(FALLBACK_COLOR)
}

/// Loads the environment, degrading to the flat fallback on any error.
pub fn load_environment_or_fallback(path: impl AsRef<Path>) -> EnvironmentMap {
    let path = path.as_ref();
    match load_environment(path) {
        Ok(map) => {
            let (width, height) = map.dimensions();
            info!(
                "environment map {} loaded ({width}x{height}, {} mips)",
                path.display(),
                map.level_count()
            );
            map
        }
        Err(err) => fallback_environment(&err),
    }
}
