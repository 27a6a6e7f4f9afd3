use glam::Vec3;
use log::debug;

use crate::interaction::MAX_PUPIL_SCALE;
use crate::params::{ParamError, ParamId, ParamKind, ParamValue, ShadingParameters};
use crate::uniforms::{EyeUniforms, UniformLayout};

/// Single entry point for edits coming from the tuning panel, presets and
/// the interaction bridge.
///
/// Every edit is validated against the schema before it reaches the uniform
/// block, so the shading pipeline never sees out-of-range or non-finite data.
#[derive(Debug, Clone)]
pub struct ParameterBinder {
    params: ShadingParameters,
    layout: UniformLayout,
    uniforms: EyeUniforms,
    dirty: bool,
}

impl Default for ParameterBinder {
    fn default() -> Self {
        Self::new(ShadingParameters::default())
    }
}

impl ParameterBinder {
    pub fn new(params: ShadingParameters) -> Self {
        let layout = UniformLayout::resolve();
        let uniforms = EyeUniforms::from_parameters(&params, &layout);
        Self {
            params,
            layout,
            uniforms,
            dirty: true,
        }
    }

    /// Base parameter values as last edited.
    pub fn parameters(&self) -> &ShadingParameters {
        &self.params
    }

    /// Live uniform block, including per-frame overrides.
    pub fn uniforms(&self) -> &EyeUniforms {
        &self.uniforms
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Sets a parameter by schema name, returning the value actually stored.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<ParamValue, ParamError> {
        let id = ParamId::from_name(name)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        self.set_param(id, value)
    }

    /// Parses `text` with the parameter's textual format and applies it.
    pub fn set_text(&mut self, name: &str, text: &str) -> Result<ParamValue, ParamError> {
        let id = ParamId::from_name(name)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        let value = id.spec().parse(text)?;
        self.set_param(id, value)
    }

    pub fn set_param(&mut self, id: ParamId, value: ParamValue) -> Result<ParamValue, ParamError> {
        let stored = self.params.set(id, value)?;
        if stored != value {
            debug!("{} clamped from {value} to {stored}", id.name());
        }
        self.uniforms.write(self.layout.slot(id), stored);
        self.dirty = true;
        Ok(stored)
    }

    pub fn reset(&mut self, id: ParamId) {
        self.params.reset(id);
        self.uniforms.write(self.layout.slot(id), self.params.get(id));
        self.dirty = true;
    }

    /// Overrides the live pupil size without touching the base parameter.
    ///
    /// The accepted range is the schema range widened by the dilation limit.
    pub fn drive_pupil_size(&mut self, size: f32) {
        if !size.is_finite() {
            debug!("ignoring non-finite pupil size");
            return;
        }
        let (min, max) = match ParamId::PupilSize.spec().kind {
            ParamKind::Float { min, max, .. } => (min, max * MAX_PUPIL_SCALE),
            _ => return,
        };
        let slot = self.layout.slot(ParamId::PupilSize);
        self.uniforms.write(slot, ParamValue::Float(size.clamp(min, max)));
        self.dirty = true;
    }

    /// Live pupil size as seen by the shader.
    pub fn live_pupil_size(&self) -> f32 {
        self.uniforms
            .scalar(self.layout.slot(ParamId::PupilSize))
            .unwrap_or_else(|| self.params.float(ParamId::PupilSize))
    }

    /// Updates the eye look direction; degenerate input falls back to `+Z`.
    pub fn set_eye_direction(&mut self, direction: Vec3) {
        let direction = direction.try_normalize().unwrap_or(Vec3::Z);
        self.uniforms.set_eye_direction(direction);
        self.dirty = true;
    }

    pub fn advance_time(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.uniforms.set_time(self.uniforms.time() + dt);
            self.dirty = true;
        }
    }

    pub fn set_environment_levels(&mut self, levels: u32) {
        self.uniforms.set_environment_levels(levels);
        self.dirty = true;
    }

    pub fn set_srgb_target(&mut self, srgb: bool) {
        self.uniforms.set_srgb_target(srgb);
        self.dirty = true;
    }

    /// Returns whether the block changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Rgb;

    #[test]
    fn set_by_name_clamps_and_forwards() {
        let mut binder = ParameterBinder::default();
        let stored = binder.set("irisSize", ParamValue::Float(5.0)).unwrap();
        assert_eq!(stored, ParamValue::Float(0.6));
        let slot = binder.layout().slot(ParamId::IrisSize);
        assert_eq!(binder.uniforms().scalar(slot), Some(0.6));
        assert_eq!(binder.parameters().float(ParamId::IrisSize), 0.6);
    }

    #[test]
    fn below_minimum_yields_minimum() {
        let mut binder = ParameterBinder::default();
        let stored = binder.set("fresnelPower", ParamValue::Float(-3.0)).unwrap();
        assert_eq!(stored, ParamValue::Float(0.1));
        let stored = binder.set("veinOctaves", ParamValue::Int(0)).unwrap();
        assert_eq!(stored, ParamValue::Int(1));
        assert_eq!(binder.uniforms().octaves[0][1], 1);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut binder = ParameterBinder::default();
        assert_eq!(
            binder.set("eyelidColor", ParamValue::Float(1.0)),
            Err(ParamError::UnknownParameter("eyelidColor".into()))
        );
    }

    #[test]
    fn nan_never_reaches_uniforms() {
        let mut binder = ParameterBinder::default();
        let before = *binder.uniforms();
        assert!(binder.set("depthFade", ParamValue::Float(f32::NAN)).is_err());
        binder.drive_pupil_size(f32::INFINITY);
        binder.set_eye_direction(Vec3::splat(f32::NAN));
        assert_eq!(binder.uniforms().scalars, before.scalars);
        assert_eq!(binder.uniforms().eye_direction(), Vec3::Z);
    }

    #[test]
    fn pupil_override_leaves_base_parameter() {
        let mut binder = ParameterBinder::default();
        binder.drive_pupil_size(0.2);
        assert_eq!(binder.live_pupil_size(), 0.2);
        assert_eq!(binder.parameters().float(ParamId::PupilSize), 0.15);
        binder.drive_pupil_size(10.0);
        assert_eq!(binder.live_pupil_size(), 0.3 * MAX_PUPIL_SCALE);
    }

    #[test]
    fn text_edits_parse_colours() {
        let mut binder = ParameterBinder::default();
        let stored = binder.set_text("limbusColor", "#102030").unwrap();
        assert_eq!(stored, ParamValue::Color(Rgb::new(16, 32, 48)));
    }

    #[test]
    fn dirty_flag_tracks_edits() {
        let mut binder = ParameterBinder::default();
        assert!(binder.take_dirty());
        assert!(!binder.take_dirty());
        binder.advance_time(0.016);
        assert!(binder.take_dirty());
        binder.advance_time(0.0);
        assert!(!binder.take_dirty());
    }
}
