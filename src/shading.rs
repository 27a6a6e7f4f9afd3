//! CPU reference of the eye surface shader.
//!
//! Mirrors `render::shader` step for step: region classification, iris and
//! limbus, sclera veins, bump perturbation, directional redness and the
//! fresnel environment reflection. The GPU uses screen-space derivatives for
//! the bump gradient; here the same gradient is taken as a finite difference
//! over the point's pixel footprint.

use glam::{Vec2, Vec3};

use crate::environment::Environment;
use crate::noise::{fbm_2d, fbm_3d};
use crate::params::{ParamId, ShadingParameters, VeinLayer, VeinLayerConfig};

/// Below this span a smoothstep band is treated as a hard edge.
pub const EDGE_EPSILON: f32 = 1e-5;
/// Narrowest vein band; keeps zero-thickness edits from dividing by zero.
pub const MIN_VEIN_THICKNESS: f32 = 1e-4;
/// Width of the threshold band used by the redness pattern.
pub const REDNESS_BAND: f32 = 0.1;
/// Distance over which veins fade in outside the iris.
pub const VEIN_FADE_WIDTH: f32 = 0.1;
/// Width of the ring over which the iris emerges from the pupil.
pub const PUPIL_BLEND_WIDTH: f32 = 0.05;

/// One shaded fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    /// Object-space position on the unit sphere.
    pub position: Vec3,
    /// Surface normal in view space.
    pub normal: Vec3,
    /// Direction from the surface towards the camera.
    pub view_dir: Vec3,
    /// Direction the eye is looking.
    pub eye_direction: Vec3,
    /// Object-space width of one pixel at this point.
    pub footprint: f32,
}

impl SurfacePoint {
    /// Point on an unrotated eye seen head-on.
    pub fn facing_camera(position: Vec3) -> Self {
        let position = position.try_normalize().unwrap_or(Vec3::Z);
        Self {
            position,
            normal: position,
            view_dir: Vec3::Z,
            eye_direction: Vec3::Z,
            footprint: 1.0 / 256.0,
        }
    }
}

/// Part of the eye a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Pupil,
    Iris,
    Sclera,
}

/// Classifies by distance from the optical axis.
pub fn classify(distance: f32, params: &ShadingParameters) -> Region {
    let pupil = params.float(ParamId::PupilSize);
    let iris_outer = params.float(ParamId::IrisSize) + params.float(ParamId::LimbusThickness);
    if distance < pupil {
        Region::Pupil
    } else if distance < iris_outer {
        Region::Iris
    } else {
        Region::Sclera
    }
}

/// Hermite smoothstep that tolerates equal or reversed edges.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    let span = if span.abs() < EDGE_EPSILON {
        EDGE_EPSILON.copysign(span)
    } else {
        span
    };
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear ramp from 0 at `edge0` to 1 at `edge1`, with the same edge guard as [`smoothstep`].
pub fn linear_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    let span = if span.abs() < EDGE_EPSILON {
        EDGE_EPSILON.copysign(span)
    } else {
        span
    };
    ((x - edge0) / span).clamp(0.0, 1.0)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Thin line structure: 1 where `|value|` is well below `threshold`.
pub fn vein_line(value: f32, threshold: f32, thickness: f32) -> f32 {
    smoothstep(threshold, threshold - thickness.max(MIN_VEIN_THICKNESS), value.abs())
}

fn vein_signal(position: Vec3, layer: &VeinLayerConfig) -> f32 {
    vein_line(fbm_3d(position, &layer.noise), layer.threshold, layer.thickness)
}

/// Summed vein layers before fading and depth weighting.
pub fn vein_signal_pair(position: Vec3, params: &ShadingParameters) -> f32 {
    vein_signal(position, &params.vein_layer(VeinLayer::First))
        + vein_signal(position, &params.vein_layer(VeinLayer::Second))
}

/// Summed redness pattern layers.
pub fn redness_signal(position: Vec3, params: &ShadingParameters) -> f32 {
    let threshold = params.float(ParamId::RednessNoiseThreshold);
    [VeinLayer::First, VeinLayer::Second]
        .into_iter()
        .map(|layer| {
            let noise = fbm_3d(position, &params.redness_layer(layer));
            vein_line(noise, threshold, REDNESS_BAND)
        })
        .sum()
}

fn iris_color(position: Vec3, distance: f32, params: &ShadingParameters) -> Vec3 {
    let pupil = params.float(ParamId::PupilSize);
    let iris_size = params.float(ParamId::IrisSize);
    let thickness = params.float(ParamId::LimbusThickness);
    let falloff = params.float(ParamId::LimbusFalloff);
    let opacity = params.float(ParamId::LimbusOpacity);

    let angle = position.y.atan2(position.x);
    let noise = fbm_2d(Vec2::new(angle, distance), &params.iris_noise());
    let intensity = 0.7 + 0.3 * noise;

    let inner = params.color(ParamId::IrisInnerColor);
    let outer = params.color(ParamId::IrisOuterColor);
    let mut iris = inner.lerp(outer, linear_step(pupil, iris_size, distance)) * intensity;
    iris *= 0.5 + 0.5 * smoothstep(iris_size, pupil, distance);

    let limbus_gradient = smoothstep(
        iris_size - thickness * 0.5,
        iris_size + thickness * 0.5,
        distance,
    );
    let limbus = (limbus_gradient * (1.0 - intensity * (1.0 - falloff)) * opacity).clamp(0.0, 1.0);
    let with_limbus = iris.lerp(params.color(ParamId::LimbusColor), limbus);

    let emerge = smoothstep(pupil, pupil + PUPIL_BLEND_WIDTH, distance);
    let base = params.color(ParamId::PupilColor).lerp(with_limbus, emerge);

    let edge_fade = 1.0
        - smoothstep(
            iris_size + thickness * 0.3,
            iris_size + thickness,
            distance,
        );
    params.color(ParamId::ScleraColor).lerp(base, edge_fade)
}

fn sclera_color(position: Vec3, distance: f32, params: &ShadingParameters) -> Vec3 {
    let iris_size = params.float(ParamId::IrisSize);
    let feather = params.float(ParamId::IrisFeather);
    let depth = mix(
        1.0,
        (1.0 - position.z) * 0.5 + 0.5,
        params.float(ParamId::DepthFade),
    );
    let fade = smoothstep(
        iris_size + feather,
        iris_size + feather + VEIN_FADE_WIDTH,
        distance,
    );
    let veins = vein_signal_pair(position, params) * fade * depth;
    params.color(ParamId::ScleraColor).lerp(
        params.color(ParamId::VeinColor),
        veins * params.float(ParamId::VeinIntensity),
    )
}

/// Region colour before redness, bump and reflection.
pub fn base_color(point: &SurfacePoint, params: &ShadingParameters) -> Vec3 {
    let position = point.position.try_normalize().unwrap_or(Vec3::Z);
    let distance = position.truncate().length();
    match classify(distance, params) {
        Region::Pupil => params.color(ParamId::PupilColor),
        Region::Iris => iris_color(position, distance, params),
        Region::Sclera => sclera_color(position, distance, params),
    }
}

/// Orthonormal tangent and bitangent around `normal`.
pub fn tangent_frame(normal: Vec3) -> (Vec3, Vec3) {
    let tangent = normal
        .cross(Vec3::Y)
        .try_normalize()
        .or_else(|| normal.cross(Vec3::X).try_normalize())
        .unwrap_or(Vec3::X);
    let bitangent = normal.cross(tangent).try_normalize().unwrap_or(Vec3::Y);
    (tangent, bitangent)
}

fn bump_signal(position: Vec3, params: &ShadingParameters) -> f32 {
    vein_signal_pair(position, params) + redness_signal(position, params)
}

/// Normal perturbed by the vein and redness relief.
pub fn perturbed_normal(point: &SurfacePoint, params: &ShadingParameters) -> Vec3 {
    let normal = point.normal.try_normalize().unwrap_or(Vec3::Z);
    let strength = params.float(ParamId::VeinBumpStrength);
    if strength <= 0.0 {
        return normal;
    }

    let position = point.position;
    let (step_x, step_y) = tangent_frame(position.try_normalize().unwrap_or(normal));
    let footprint = point.footprint.max(1e-4);
    let center = bump_signal(position, params);
    let dx = bump_signal(position + step_x * footprint, params) - center;
    let dy = bump_signal(position + step_y * footprint, params) - center;

    let (tangent, bitangent) = tangent_frame(normal);
    (normal + (tangent * dx + bitangent * dy) * strength)
        .try_normalize()
        .unwrap_or(normal)
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * incident.dot(normal) * normal
}

/// Full surface colour, alpha is implicitly 1.
pub fn shade(
    point: &SurfacePoint,
    params: &ShadingParameters,
    environment: &dyn Environment,
) -> Vec3 {
    let position = point.position.try_normalize().unwrap_or(Vec3::Z);
    let mut color = base_color(point, params);

    let redness_noise = redness_signal(point.position, params);
    let normal = perturbed_normal(point, params);

    let eye = point.eye_direction.try_normalize().unwrap_or(Vec3::Z);
    let facing = (1.0 - normal.dot(eye) * 0.5 - 0.5).max(0.0);
    let redness = (facing.powf(params.float(ParamId::RednessPower))
        + redness_noise * params.float(ParamId::RednessNoiseMagnitude))
    .clamp(0.0, 1.0);
    let depth = mix(1.0, (1.0 - position.z) * 0.5, params.float(ParamId::DepthFade));
    color = color.lerp(
        params.color(ParamId::VeinColor),
        (redness * params.float(ParamId::RednessIntensity) * depth).clamp(0.0, 1.0),
    );

    let view = point.view_dir.try_normalize().unwrap_or(Vec3::Z);
    let fresnel = (1.0 - view.dot(normal).abs())
        .max(0.0)
        .powf(params.float(ParamId::FresnelPower));
    let reflected = environment.sample(
        reflect(-view, normal),
        params.float(ParamId::EnvMapBlur),
    );
    color = color.lerp(
        reflected,
        (fresnel * params.float(ParamId::EnvMapIntensity) * 0.5).clamp(0.0, 1.0),
    );

    color.clamp(Vec3::ZERO, Vec3::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentMap;
    use crate::params::{ParamValue, Rgb};

    fn point_at(distance: f32) -> SurfacePoint {
        let z = (1.0 - distance * distance).max(0.0).sqrt();
        SurfacePoint::facing_camera(Vec3::new(distance, 0.0, z))
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn smoothstep_handles_reversed_and_equal_edges() {
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(1.0, 0.0, 2.0), 0.0);
        let hard = smoothstep(0.3, 0.3, 0.31);
        assert!(hard.is_finite());
        assert_eq!(hard, 1.0);
    }

    #[test]
    fn zero_thickness_veins_stay_defined() {
        assert_eq!(vein_line(0.0, 0.05, 0.0), 1.0);
        assert_eq!(vein_line(0.2, 0.05, 0.0), 0.0);
    }

    #[test]
    fn regions_follow_radii() {
        let params = ShadingParameters::new();
        assert_eq!(classify(0.0, &params), Region::Pupil);
        assert_eq!(classify(0.15, &params), Region::Iris);
        assert_eq!(classify(0.30, &params), Region::Iris);
        assert_eq!(classify(0.43, &params), Region::Sclera);

        let outer = params.float(ParamId::IrisSize) + params.float(ParamId::LimbusThickness);
        assert_eq!(classify(outer - 1e-4, &params), Region::Iris);
        assert_eq!(classify(outer, &params), Region::Sclera);
    }

    #[test]
    fn iris_gradient_is_linear() {
        let mut params = ShadingParameters::new();
        params.set(ParamId::NoiseAmplitude, ParamValue::Float(0.0)).unwrap();
        params.set(ParamId::LimbusOpacity, ParamValue::Float(0.0)).unwrap();
        params
            .set(ParamId::IrisInnerColor, ParamValue::Color(Rgb::new(0, 0, 0)))
            .unwrap();
        params
            .set(ParamId::IrisOuterColor, ParamValue::Color(Rgb::new(255, 255, 255)))
            .unwrap();
        let pupil = params.float(ParamId::PupilSize);
        let iris_size = params.float(ParamId::IrisSize);
        for fraction in [0.25, 0.75] {
            let distance = pupil + (iris_size - pupil) * fraction;
            assert!((linear_step(pupil, iris_size, distance) - fraction).abs() < 1e-5);

            let darkening = 0.5 + 0.5 * smoothstep(iris_size, pupil, distance);
            let weight = iris_color(Vec3::new(distance, 0.0, 0.0), distance, &params).x
                / (0.7 * darkening);
            assert!((weight - fraction).abs() < 1e-3, "{fraction}: {weight}");
        }
    }

    #[test]
    fn linear_step_tolerates_equal_edges() {
        assert_eq!(linear_step(0.3, 0.3, 0.29), 0.0);
        assert_eq!(linear_step(0.3, 0.3, 0.31), 1.0);
        assert_eq!(linear_step(0.0, 2.0, 0.5), 0.25);
    }

    #[test]
    fn pupil_boundary_is_continuous() {
        let mut params = ShadingParameters::new();
        params
            .set(ParamId::PupilColor, ParamValue::Color(Rgb::new(20, 10, 40)))
            .unwrap();
        let pupil = params.float(ParamId::PupilSize);
        let inside = base_color(&point_at(pupil - 1e-4), &params);
        let on_seam = base_color(&point_at(pupil), &params);
        assert!(close(inside, params.color(ParamId::PupilColor)));
        assert!(close(on_seam, params.color(ParamId::PupilColor)), "{on_seam:?}");
    }

    #[test]
    fn outer_iris_fades_into_sclera() {
        let params = ShadingParameters::new();
        let outer = params.float(ParamId::IrisSize) + params.float(ParamId::LimbusThickness);
        let last_iris = base_color(&point_at(outer - 1e-5), &params);
        assert!(close(last_iris, params.color(ParamId::ScleraColor)), "{last_iris:?}");
    }

    #[test]
    fn veins_are_suppressed_next_to_iris() {
        let mut params = ShadingParameters::new();
        params.set(ParamId::VeinIntensity, ParamValue::Float(1.0)).unwrap();
        params.set(ParamId::LimbusThickness, ParamValue::Float(0.0)).unwrap();
        params.set(ParamId::IrisFeather, ParamValue::Float(0.05)).unwrap();
        let point = point_at(params.float(ParamId::IrisSize) + 0.03);
        assert_eq!(classify(0.40, &params), Region::Sclera);
        let sclera = base_color(&point, &params);
        assert!(close(sclera, params.color(ParamId::ScleraColor)));
    }

    #[test]
    fn shading_without_bump_ignores_footprint() {
        let mut params = ShadingParameters::new();
        params.set(ParamId::VeinBumpStrength, ParamValue::Float(0.0)).unwrap();
        let env = EnvironmentMap::solid([40, 40, 40]);
        let mut point = point_at(0.8);
        let a = shade(&point, &params, &env);
        point.footprint = 0.5;
        assert_eq!(a, shade(&point, &params, &env));
    }

    #[test]
    fn output_is_finite_under_extreme_edits() {
        let mut params = ShadingParameters::new();
        for (name, value) in [
            ("limbusThickness", 0.0),
            ("veinThickness", 0.0),
            ("veinThickness2", 0.0),
            ("veinThreshold", 0.0),
            ("rednessPower", 10.0),
            ("fresnelPower", 0.1),
            ("veinBumpStrength", 2.0),
            ("irisSize", 0.2),
            ("pupilSize", 0.3),
        ] {
            let id = ParamId::from_name(name).unwrap();
            params.set(id, ParamValue::Float(value)).unwrap();
        }
        let env = EnvironmentMap::solid([200, 100, 50]);
        for i in 0..64 {
            let t = i as f32 / 63.0;
            let theta = t * std::f32::consts::TAU;
            let positions = [
                Vec3::new(theta.cos() * t, theta.sin() * t, (1.0 - t * t).sqrt()),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(theta.cos(), 0.0, theta.sin()),
            ];
            for position in positions {
                let point = SurfacePoint::facing_camera(position);
                let color = shade(&point, &params, &env);
                assert!(color.is_finite(), "{position:?} -> {color:?}");
            }
        }
    }

    #[test]
    fn grazing_angles_reflect_more_environment() {
        let mut params = ShadingParameters::new();
        params.set(ParamId::RednessIntensity, ParamValue::Float(0.0)).unwrap();
        params.set(ParamId::VeinBumpStrength, ParamValue::Float(0.0)).unwrap();
        params.set(ParamId::VeinIntensity, ParamValue::Float(0.0)).unwrap();
        let env = EnvironmentMap::solid([0, 0, 0]);
        let head_on = shade(&point_at(0.6), &params, &env);
        let grazing = shade(&point_at(0.99), &params, &env);
        assert!(grazing.length() < head_on.length());
    }

    #[test]
    fn tangent_frame_survives_poles() {
        let (t, b) = tangent_frame(Vec3::Y);
        assert!(t.is_finite() && b.is_finite());
        assert!(t.dot(Vec3::Y).abs() < 1e-6);
        assert!((t.length() - 1.0).abs() < 1e-5);
    }
}
