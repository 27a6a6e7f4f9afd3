use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Debug)]
pub struct CameraParams {
    pub view: Mat4,
    pub view_proj: Mat4,
    pub position: Vec3,
}

/// Per-frame matrices shared by the eye and background passes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix, stored as three `vec4` columns.
    pub normal: [[f32; 4]; 3],
    pub camera_position: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &CameraParams, model: Mat4) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            inv_view_proj: camera.view_proj.inverse().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal: [
                normal.x_axis.extend(0.0).into(),
                normal.y_axis.extend(0.0).into(),
                normal.z_axis.extend(0.0).into(),
            ],
            camera_position: camera.position.extend(1.0).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, EyeTransform};
    use glam::Vec4;

    #[test]
    fn layout_matches_wgsl_struct() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 256);
    }

    #[test]
    fn inverse_unprojects_the_view_centre() {
        let camera = Camera::new(16.0 / 9.0);
        let globals = GlobalUniform::new(&camera.params(), EyeTransform::default().model());
        let inverse = Mat4::from_cols_array_2d(&globals.inv_view_proj);
        let far = inverse * Vec4::new(0.0, 0.0, 1.0, 1.0);
        let direction = (far.truncate() / far.w - camera.position).normalize();
        assert!((direction - Vec3::NEG_Z).length() < 1e-3, "{direction:?}");
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let transform = EyeTransform {
            scale: Vec3::new(2.0, 1.0, 1.0),
            ..Default::default()
        };
        let globals = GlobalUniform::new(&Camera::new(1.0).params(), transform.model());
        assert!((globals.normal[0][0] - 0.5).abs() < 1e-6);
        assert!((globals.normal[1][1] - 1.0).abs() < 1e-6);
    }
}
