use glam::{Mat4, Quat, Vec2, Vec3};

use crate::render::CameraParams;

pub const FOV_DEGREES: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const POSITION: Vec3 = Vec3::new(0.0, 0.0, 3.0);

/// Fixed perspective camera looking at the eyeball from the front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: POSITION,
            target: Vec3::ZERO,
            fov_y: FOV_DEGREES.to_radians(),
            aspect: sanitize_aspect(aspect),
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, NEAR, FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn params(&self) -> CameraParams {
        CameraParams {
            view: self.view(),
            view_proj: self.view_proj(),
            position: self.position,
        }
    }

    /// World-space ray through a point in normalised device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray {
            origin: self.position,
            direction: (far - near).try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() {
        aspect.max(0.01)
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Rotation from gaze tracking and scale from the jiggle, applied to a unit
/// sphere at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeTransform {
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for EyeTransform {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl EyeTransform {
    pub fn model(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, Vec3::ZERO)
    }

    /// Distance along `ray` to the nearest hit on the transformed sphere.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let model = self.model();
        if model.determinant().abs() < 1e-8 {
            return None;
        }
        let inverse = model.inverse();
        let origin = inverse.transform_point3(ray.origin);
        let direction = inverse.transform_vector3(ray.direction);

        // |origin + t * direction|^2 = 1
        let a = direction.length_squared();
        let b = origin.dot(direction);
        let c = origin.length_squared() - 1.0;
        let discriminant = b * b - a * c;
        if a <= f32::EPSILON || discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = (-b - root) / a;
        let far = (-b + root) / a;
        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            Some(far)
        } else {
            None
        }
    }
}
