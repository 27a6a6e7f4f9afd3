//! Procedurally shaded eyeball that follows the pointer and jiggles when
//! clicked.
//!
//! The shading model lives twice: as WGSL for the wgpu renderer and as a CPU
//! reference in [`shading`] that the tests and the headless renderer use.
//! Every parameter edit, whether from the tuning panel, a preset or the
//! pointer, goes through one [`ParameterBinder`].

pub mod app;
pub mod assets;
pub mod audio;
pub mod binder;
pub mod camera;
pub mod environment;
pub mod eyeball;
pub mod input;
pub mod interaction;
pub mod jiggle;
pub mod mesh;
pub mod noise;
pub mod panel;
pub mod params;
pub mod preset;
pub mod raster;
pub mod render;
pub mod shading;
pub mod uniforms;
pub mod viewport;

pub use assets::AssetError;
pub use audio::{AudioBackend, AudioError, Clip, LogBackend, Sound, SoundManager};
pub use binder::ParameterBinder;
pub use camera::{Camera, EyeTransform, Ray};
pub use environment::{
    fallback_environment, load_environment, load_environment_or_fallback, Environment,
    EnvironmentMap,
};
pub use eyeball::{ClickOutcome, Eyeball};
pub use input::{InputState, KeyCode, NamedKey};
pub use interaction::GazeTracker;
pub use jiggle::Jiggle;
pub use panel::{PanelCommand, TuningPanel};
pub use params::{ParamError, ParamId, ParamValue, Rgb, ShadingParameters};
pub use preset::{Preset, PresetError};
pub use raster::{cpu_render, CpuRenderParams};
pub use render::{CameraParams, Renderer};
pub use viewport::{StaticViewport, ViewportProvider, WindowViewport};
