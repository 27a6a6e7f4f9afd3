use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::binder::ParameterBinder;
use crate::environment::Environment;
use crate::params::{ParamKind, ShadingParameters};
use crate::preset::Preset;
use crate::raster::{cpu_render, CpuRenderParams};

pub const DEFAULT_ENVIRONMENT: &str = "assets/textures/environment.jpg";
pub const DEFAULT_SOUNDS: &str = "assets/sounds";

/// Binder seeded with the defaults and, if given, a preset file.
pub fn build_binder(preset: Option<&Path>) -> Result<ParameterBinder> {
    let mut binder = ParameterBinder::default();
    if let Some(path) = preset {
        let preset = Preset::load(path)
            .with_context(|| format!("failed to load preset {}", path.display()))?;
        let applied = preset
            .apply(&mut binder)
            .with_context(|| format!("failed to apply preset {}", path.display()))?;
        info!("applied {applied} value(s) from {}", path.display());
    }
    Ok(binder)
}

/// One line per parameter, grouped by panel folder.
pub fn parameter_summary(params: &ShadingParameters) -> String {
    let mut out = String::new();
    let mut folder = "";
    let mut count = 0;
    for (spec, value) in params.iter() {
        if spec.folder != folder {
            folder = spec.folder;
            let _ = writeln!(out, "[{folder}]");
        }
        let _ = writeln!(
            out,
            " - {:<24} {:<12} {}",
            spec.name,
            value.to_string(),
            describe_range(spec.kind)
        );
        count += 1;
    }
    let _ = writeln!(out, "{count} parameters");
    out
}

fn describe_range(kind: ParamKind) -> String {
    match kind {
        ParamKind::Float { min, max, step, .. } => format!("[{min}, {max}] step {step}"),
        ParamKind::Int { min, max, .. } => format!("[{min}, {max}]"),
        ParamKind::Color { .. } => "rgb 0-255".to_string(),
    }
}

/// Rasterises a square snapshot with the CPU pipeline and writes it to `path`.
pub fn write_cpu_render(
    path: &Path,
    params: &ShadingParameters,
    environment: &dyn Environment,
    size: u32,
) -> Result<()> {
    let settings = CpuRenderParams {
        width: size,
        height: size,
        ..Default::default()
    };
    let image = cpu_render(params, environment, &settings);
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
