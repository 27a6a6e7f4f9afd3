//! GPU-visible uniform block and the parameter-to-slot table that fills it.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::params::{
    ParamId, ParamKind, ParamValue, ShadingParameters, COLOR_PARAM_COUNT, FLOAT_PARAM_COUNT,
    INT_PARAM_COUNT, PARAM_COUNT, SCHEMA,
};

pub const COLOR_ROWS: usize = COLOR_PARAM_COUNT;
pub const SCALAR_ROWS: usize = FLOAT_PARAM_COUNT.div_ceil(4);
pub const OCTAVE_ROWS: usize = INT_PARAM_COUNT.div_ceil(4);

/// Uniform block consumed by the eye fragment shader.
///
/// Every member is a `vec4` (or an array of them) so the Rust and WGSL
/// layouts agree without manual padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EyeUniforms {
    pub colors: [[f32; 4]; COLOR_ROWS],
    pub scalars: [[f32; 4]; SCALAR_ROWS],
    pub octaves: [[i32; 4]; OCTAVE_ROWS],
    /// Eye look direction in `xyz`.
    pub eye_direction: [f32; 4],
    /// `x` = elapsed time, `y` = number of environment mip levels,
    /// `z` = 1 when the render target sRGB-encodes on write.
    pub frame: [f32; 4],
}

/// Location of one parameter inside [`EyeUniforms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformSlot {
    Color { row: usize },
    Scalar { row: usize, lane: usize },
    Octaves { row: usize, lane: usize },
}

/// Typed parameter-to-slot table, resolved once from the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLayout {
    slots: [UniformSlot; PARAM_COUNT],
}

impl Default for UniformLayout {
    fn default() -> Self {
        Self::resolve()
    }
}

impl UniformLayout {
    /// Assigns slots in schema order, packing each kind separately.
    pub fn resolve() -> Self {
        let mut colors = 0;
        let mut scalars = 0;
        let mut ints = 0;
        let slots = std::array::from_fn(|index| match SCHEMA[index].kind {
            ParamKind::Color { .. } => {
                let slot = UniformSlot::Color { row: colors };
                colors += 1;
                slot
            }
            ParamKind::Float { .. } => {
                let slot = UniformSlot::Scalar {
                    row: scalars / 4,
                    lane: scalars % 4,
                };
                scalars += 1;
                slot
            }
            ParamKind::Int { .. } => {
                let slot = UniformSlot::Octaves {
                    row: ints / 4,
                    lane: ints % 4,
                };
                ints += 1;
                slot
            }
        });
        Self { slots }
    }

    pub fn slot(&self, id: ParamId) -> UniformSlot {
        self.slots[id as usize]
    }

    /// Iterates `(parameter, slot)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, UniformSlot)> + '_ {
        ParamId::ALL.iter().copied().zip(self.slots.iter().copied())
    }
}

impl EyeUniforms {
    /// Builds the block from the full parameter set.
    pub fn from_parameters(params: &ShadingParameters, layout: &UniformLayout) -> Self {
        let mut uniforms = Self::zeroed();
        for (id, slot) in layout.iter() {
            uniforms.write(slot, params.get(id));
        }
        uniforms.eye_direction = [0.0, 0.0, 1.0, 0.0];
        uniforms.frame = [0.0, 1.0, 0.0, 0.0];
        uniforms
    }

    /// Writes one already-validated value into its slot.
    pub fn write(&mut self, slot: UniformSlot, value: ParamValue) {
        match (slot, value) {
            (UniformSlot::Color { row }, ParamValue::Color(color)) => {
                self.colors[row] = color.to_unit().extend(1.0).into();
            }
            (UniformSlot::Scalar { row, lane }, ParamValue::Float(v)) => {
                self.scalars[row][lane] = v;
            }
            (UniformSlot::Scalar { row, lane }, ParamValue::Int(v)) => {
                self.scalars[row][lane] = v as f32;
            }
            (UniformSlot::Octaves { row, lane }, ParamValue::Int(v)) => {
                self.octaves[row][lane] = v as i32;
            }
            (UniformSlot::Octaves { row, lane }, ParamValue::Float(v)) => {
                self.octaves[row][lane] = v.max(0.0) as i32;
            }
            (slot, value) => {
                log::warn!("ignoring {value:?} written to incompatible uniform slot {slot:?}");
            }
        }
    }

    pub fn scalar(&self, slot: UniformSlot) -> Option<f32> {
        match slot {
            UniformSlot::Scalar { row, lane } => Some(self.scalars[row][lane]),
            _ => None,
        }
    }

    pub fn set_eye_direction(&mut self, direction: Vec3) {
        self.eye_direction = direction.extend(0.0).into();
    }

    pub fn eye_direction(&self) -> Vec3 {
        Vec3::from_slice(&self.eye_direction[..3])
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.frame[0] = seconds;
    }

    pub fn time(&self) -> f32 {
        self.frame[0]
    }

    pub fn set_environment_levels(&mut self, levels: u32) {
        self.frame[1] = levels.max(1) as f32;
    }

    pub fn set_srgb_target(&mut self, srgb: bool) {
        self.frame[2] = if srgb { 1.0 } else { 0.0 };
    }
}

/// Converts `veinFrequency2` into `VEIN_FREQUENCY2` for generated shader constants.
pub fn constant_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Rgb;

    #[test]
    fn block_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<EyeUniforms>() % 16, 0);
        assert_eq!(COLOR_ROWS, 6);
        assert_eq!(SCALAR_ROWS, 8);
        assert_eq!(OCTAVE_ROWS, 1);
    }

    #[test]
    fn slots_follow_schema_order_per_kind() {
        let layout = UniformLayout::resolve();
        assert_eq!(layout.slot(ParamId::PupilSize), UniformSlot::Scalar { row: 0, lane: 0 });
        assert_eq!(layout.slot(ParamId::PupilColor), UniformSlot::Color { row: 0 });
        assert_eq!(layout.slot(ParamId::VeinColor), UniformSlot::Color { row: 5 });
        assert_eq!(layout.slot(ParamId::NoiseOctaves), UniformSlot::Octaves { row: 0, lane: 0 });
        assert_eq!(
            layout.slot(ParamId::RednessNoiseOctaves),
            UniformSlot::Octaves { row: 0, lane: 3 }
        );
        assert_eq!(layout.slot(ParamId::EnvMapBlur), UniformSlot::Scalar { row: 7, lane: 1 });
    }

    #[test]
    fn every_slot_is_distinct() {
        let layout = UniformLayout::resolve();
        let slots: Vec<_> = layout.iter().map(|(_, slot)| slot).collect();
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn defaults_land_in_their_slots() {
        let layout = UniformLayout::resolve();
        let uniforms = EyeUniforms::from_parameters(&ShadingParameters::new(), &layout);
        assert_eq!(uniforms.scalar(layout.slot(ParamId::PupilSize)), Some(0.15));
        assert_eq!(uniforms.scalar(layout.slot(ParamId::EnvMapBlur)), Some(6.0));
        assert_eq!(uniforms.octaves[0], [8, 5, 4, 5]);
        assert_eq!(uniforms.colors[0], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.eye_direction(), Vec3::Z);
    }

    #[test]
    fn colour_writes_store_unit_floats() {
        let layout = UniformLayout::resolve();
        let mut uniforms = EyeUniforms::zeroed();
        uniforms.write(
            layout.slot(ParamId::ScleraColor),
            ParamValue::Color(Rgb::new(255, 0, 51)),
        );
        assert_eq!(uniforms.colors[4], [1.0, 0.0, 0.2, 1.0]);
    }

    #[test]
    fn constant_names_are_screaming_snake_case() {
        assert_eq!(constant_name("pupilSize"), "PUPIL_SIZE");
        assert_eq!(constant_name("veinFrequency2"), "VEIN_FREQUENCY2");
        assert_eq!(constant_name("envMapBlur"), "ENV_MAP_BLUR");
    }
}
