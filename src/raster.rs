//! Software renderer built on the CPU shading reference. Used for headless
//! snapshots and for checking the GPU path by eye.

use glam::{Mat3, Vec2, Vec3};
use image::{Rgba, RgbaImage};

use crate::camera::{Camera, EyeTransform};
use crate::environment::{linear_to_srgb, Environment};
use crate::params::ShadingParameters;
use crate::shading::{shade, SurfacePoint};
use crate::viewport::{StaticViewport, ViewportProvider};

#[derive(Debug, Clone, Copy)]
pub struct CpuRenderParams {
    pub width: u32,
    pub height: u32,
    pub transform: EyeTransform,
    pub eye_direction: Vec3,
}

impl Default for CpuRenderParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            transform: EyeTransform::default(),
            eye_direction: Vec3::Z,
        }
    }
}

/// Ray casts every pixel through the standard camera.
///
/// Eye pixels are written unencoded, as the GPU path does; background pixels
/// show the environment along the view ray at full resolution.
pub fn cpu_render(
    params: &ShadingParameters,
    environment: &dyn Environment,
    settings: &CpuRenderParams,
) -> RgbaImage {
    let width = settings.width.max(1);
    let height = settings.height.max(1);
    let viewport = StaticViewport::new(width, height);
    let camera = Camera::new(viewport.aspect());

    let model = settings.transform.model();
    let inverse = model.inverse();
    let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
    let pixel_angle = 2.0 * (camera.fov_y * 0.5).tan() / height as f32;

    let mut image = RgbaImage::new(width, height);
    for (px, py, pixel) in image.enumerate_pixels_mut() {
        let center = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
        let ray = camera.ray(viewport.to_ndc(center));
        let color = match settings.transform.intersect(&ray) {
            Some(distance) => {
                let position = inverse.transform_point3(ray.at(distance));
                let point = SurfacePoint {
                    position,
                    normal: (normal_matrix * position).try_normalize().unwrap_or(Vec3::Z),
                    view_dir: -ray.direction,
                    eye_direction: settings.eye_direction,
                    footprint: pixel_angle * distance,
                };
                shade(&point, params, environment)
            }
            None => {
                let env = environment.sample(ray.direction, 0.0);
                Vec3::new(linear_to_srgb(env.x), linear_to_srgb(env.y), linear_to_srgb(env.z))
            }
        };
        *pixel = to_rgba8(color);
    }
    image
}

fn to_rgba8(color: Vec3) -> Rgba<u8> {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([channel(color.x), channel(color.y), channel(color.z), 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{EnvironmentMap, FALLBACK_COLOR};
    use crate::params::{ParamId, ParamValue, Rgb};

    fn small() -> CpuRenderParams {
        CpuRenderParams {
            width: 48,
            height: 48,
            ..Default::default()
        }
    }

    #[test]
    fn pupil_sits_in_the_middle_on_the_fallback_background() {
        let mut params = ShadingParameters::new();
        params
            .set(ParamId::PupilColor, ParamValue::Color(Rgb::new(0, 0, 255)))
            .unwrap();
        let env = EnvironmentMap::solid(FALLBACK_COLOR);
        let image = cpu_render(&params, &env, &small());

        let corner = image.get_pixel(0, 0);
        assert_eq!(corner.0[..3], FALLBACK_COLOR);
        let centre = image.get_pixel(24, 24);
        assert!(centre.0[2] > 200 && centre.0[0] < 40, "{centre:?}");
        assert!(image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn jiggle_scale_widens_the_silhouette() {
        let params = ShadingParameters::new();
        let env = EnvironmentMap::solid(FALLBACK_COLOR);
        let background = |image: &RgbaImage| {
            image
                .pixels()
                .filter(|p| p.0[..3] == FALLBACK_COLOR)
                .count()
        };
        let rest = cpu_render(&params, &env, &small());
        let wide = cpu_render(
            &params,
            &env,
            &CpuRenderParams {
                transform: EyeTransform {
                    scale: Vec3::new(1.15, 1.0, 1.0),
                    ..Default::default()
                },
                ..small()
            },
        );
        assert!(background(&wide) < background(&rest));
    }
}
