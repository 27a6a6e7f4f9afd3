pub mod common;
pub mod native;
pub mod shader;

pub use common::{CameraParams, GlobalUniform};
pub use native::Renderer;
pub use shader::eye_shader_source;
