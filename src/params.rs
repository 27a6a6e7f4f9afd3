//! Declarative table of every tunable shading parameter.
//!
//! The table below is the single source of truth for names, ranges, steps and
//! defaults. The binder clamps against it, the uniform layout derives its slot
//! assignment from it and the tuning panel walks it in order.

use std::fmt;

use glam::Vec3;
use thiserror::Error;

use crate::noise::NoiseLayerConfig;

/// 8-bit RGB colour as edited in the tuning panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts to unit floats as consumed by the shading pipeline.
    pub fn to_unit(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.r, self.g, self.b)
    }
}

/// Value held by a single parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(u32),
    Color(Rgb),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Color(color) => write!(f, "{color}"),
        }
    }
}

impl ParamValue {
    /// Numeric view of the value. Colours read as zero.
    pub fn as_float(self) -> f32 {
        match self {
            ParamValue::Float(v) => v,
            ParamValue::Int(v) => v as f32,
            ParamValue::Color(_) => 0.0,
        }
    }
}

/// Type and valid range of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float { min: f32, max: f32, step: f32, default: f32 },
    Int { min: u32, max: u32, default: u32 },
    Color { default: Rgb },
}

impl ParamKind {
    pub fn default_value(&self) -> ParamValue {
        match *self {
            ParamKind::Float { default, .. } => ParamValue::Float(default),
            ParamKind::Int { default, .. } => ParamValue::Int(default),
            ParamKind::Color { default } => ParamValue::Color(default),
        }
    }
}

/// Errors raised when an edit cannot be applied.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("parameter `{name}` expects a {expected} value")]
    KindMismatch { name: &'static str, expected: &'static str },
    #[error("parameter `{name}` rejected a non-finite value")]
    NotFinite { name: &'static str },
    #[error("could not parse `{value}` for parameter `{name}`")]
    Unparsable { name: &'static str, value: String },
}

/// Schema entry.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub uniform: &'static str,
    pub label: &'static str,
    pub folder: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    const fn float(
        id: ParamId,
        name: &'static str,
        uniform: &'static str,
        label: &'static str,
        folder: &'static str,
        (min, max, step, default): (f32, f32, f32, f32),
    ) -> Self {
        Self {
            id,
            name,
            uniform,
            label,
            folder,
            kind: ParamKind::Float { min, max, step, default },
        }
    }

    const fn int(
        id: ParamId,
        name: &'static str,
        uniform: &'static str,
        label: &'static str,
        folder: &'static str,
        (min, max, default): (u32, u32, u32),
    ) -> Self {
        Self {
            id,
            name,
            uniform,
            label,
            folder,
            kind: ParamKind::Int { min, max, default },
        }
    }

    const fn color(
        id: ParamId,
        name: &'static str,
        uniform: &'static str,
        label: &'static str,
        folder: &'static str,
        default: Rgb,
    ) -> Self {
        Self {
            id,
            name,
            uniform,
            label,
            folder,
            kind: ParamKind::Color { default },
        }
    }

    /// Clamps a value into the declared range. Non-finite floats and kind
    /// mismatches are rejected.
    pub fn clamp(&self, value: ParamValue) -> Result<ParamValue, ParamError> {
        match (self.kind, value) {
            (ParamKind::Float { min, max, .. }, ParamValue::Float(v)) => {
                if !v.is_finite() {
                    return Err(ParamError::NotFinite { name: self.name });
                }
                Ok(ParamValue::Float(v.clamp(min, max)))
            }
            (ParamKind::Float { min, max, .. }, ParamValue::Int(v)) => {
                Ok(ParamValue::Float((v as f32).clamp(min, max)))
            }
            (ParamKind::Int { min, max, .. }, ParamValue::Int(v)) => {
                Ok(ParamValue::Int(v.clamp(min, max)))
            }
            (ParamKind::Int { min, max, .. }, ParamValue::Float(v)) => {
                if !v.is_finite() {
                    return Err(ParamError::NotFinite { name: self.name });
                }
                let rounded = v.round().clamp(min as f32, max as f32);
                Ok(ParamValue::Int(rounded as u32))
            }
            (ParamKind::Color { .. }, ParamValue::Color(c)) => Ok(ParamValue::Color(c)),
            (ParamKind::Color { .. }, _) => Err(ParamError::KindMismatch {
                name: self.name,
                expected: "color",
            }),
            (_, ParamValue::Color(_)) => Err(ParamError::KindMismatch {
                name: self.name,
                expected: "numeric",
            }),
        }
    }

    /// Parses the textual form used by presets and the command line.
    ///
    /// Colours are three whitespace separated channels (`"200 50 50"`) or a
    /// `#rrggbb` hex string.
    pub fn parse(&self, text: &str) -> Result<ParamValue, ParamError> {
        let text = text.trim();
        let unparsable = || ParamError::Unparsable {
            name: self.name,
            value: text.to_string(),
        };
        match self.kind {
            ParamKind::Float { .. } | ParamKind::Int { .. } => text
                .parse::<f32>()
                .map(ParamValue::Float)
                .map_err(|_| unparsable()),
            ParamKind::Color { .. } => {
                if let Some(hex) = text.strip_prefix('#') {
                    if hex.len() != 6 || !hex.is_ascii() {
                        return Err(unparsable());
                    }
                    let channel = |range: std::ops::Range<usize>| {
                        u8::from_str_radix(&hex[range], 16).map_err(|_| unparsable())
                    };
                    return Ok(ParamValue::Color(Rgb::new(
                        channel(0..2)?,
                        channel(2..4)?,
                        channel(4..6)?,
                    )));
                }
                let channels = text
                    .split_whitespace()
                    .map(|part| part.parse::<f32>().map_err(|_| unparsable()))
                    .collect::<Result<Vec<_>, _>>()?;
                let [r, g, b] = channels.as_slice() else {
                    return Err(unparsable());
                };
                let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
                Ok(ParamValue::Color(Rgb::new(channel(*r), channel(*g), channel(*b))))
            }
        }
    }
}

macro_rules! param_ids {
    ($($variant:ident),* $(,)?) => {
        /// Identifier of a schema entry; the discriminant indexes [`SCHEMA`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ParamId {
            $($variant),*
        }

        impl ParamId {
            pub const ALL: &'static [ParamId] = &[$(ParamId::$variant),*];
        }
    };
}

param_ids! {
    PupilSize,
    PupilColor,
    IrisSize,
    IrisFeather,
    IrisInnerColor,
    IrisOuterColor,
    LimbusColor,
    LimbusThickness,
    LimbusFalloff,
    LimbusOpacity,
    NoiseOctaves,
    NoiseFrequency,
    NoiseAmplitude,
    NoiseLacunarity,
    NoiseGain,
    ScleraColor,
    DepthFade,
    VeinColor,
    VeinIntensity,
    VeinBumpStrength,
    VeinFrequency,
    VeinOctaves,
    VeinLacunarity,
    VeinGain,
    VeinThreshold,
    VeinThickness,
    VeinFrequency2,
    VeinOctaves2,
    VeinLacunarity2,
    VeinGain2,
    VeinThreshold2,
    VeinThickness2,
    RednessIntensity,
    RednessPower,
    RednessNoiseOctaves,
    RednessNoiseThreshold,
    RednessNoiseMagnitude,
    FresnelPower,
    EnvMapIntensity,
    EnvMapBlur,
}

impl ParamId {
    pub fn spec(self) -> &'static ParamSpec {
        &SCHEMA[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Resolves a schema name such as `pupilSize`.
    pub fn from_name(name: &str) -> Option<Self> {
        SCHEMA.iter().find(|spec| spec.name == name).map(|spec| spec.id)
    }
}

pub const PARAM_COUNT: usize = ParamId::ALL.len();

use ParamId as P;

/// The parameter table, in panel order.
pub static SCHEMA: [ParamSpec; PARAM_COUNT] = TABLE;

/// Number of float parameters in the schema.
pub const FLOAT_PARAM_COUNT: usize = kind_counts(&TABLE).0;
/// Number of integer (octave count) parameters in the schema.
pub const INT_PARAM_COUNT: usize = kind_counts(&TABLE).1;
/// Number of colour parameters in the schema.
pub const COLOR_PARAM_COUNT: usize = kind_counts(&TABLE).2;

const fn kind_counts(table: &[ParamSpec]) -> (usize, usize, usize) {
    let (mut floats, mut ints, mut colors) = (0, 0, 0);
    let mut index = 0;
    while index < table.len() {
        match table[index].kind {
            ParamKind::Float { .. } => floats += 1,
            ParamKind::Int { .. } => ints += 1,
            ParamKind::Color { .. } => colors += 1,
        }
        index += 1;
    }
    (floats, ints, colors)
}

const TABLE: [ParamSpec; PARAM_COUNT] = [
    ParamSpec::float(P::PupilSize, "pupilSize", "uPupilSize", "Size", "Pupil", (0.05, 0.3, 0.01, 0.15)),
    ParamSpec::color(P::PupilColor, "pupilColor", "uPupilColor", "Color", "Pupil", Rgb::new(0, 0, 0)),
    ParamSpec::float(P::IrisSize, "irisSize", "uIrisSize", "Size", "Iris", (0.2, 0.6, 0.01, 0.37)),
    ParamSpec::float(P::IrisFeather, "irisFeather", "uIrisFeather", "Feather", "Iris", (0.0, 0.1, 0.005, 0.0)),
    ParamSpec::color(P::IrisInnerColor, "irisInnerColor", "uIrisInnerColor", "Inner Color", "Iris", Rgb::new(255, 115, 0)),
    ParamSpec::color(P::IrisOuterColor, "irisOuterColor", "uIrisOuterColor", "Outer Color", "Iris", Rgb::new(136, 47, 3)),
    ParamSpec::color(P::LimbusColor, "limbusColor", "uLimbusColor", "Color", "Limbus Band", Rgb::new(29, 13, 0)),
    ParamSpec::float(P::LimbusThickness, "limbusThickness", "uLimbusThickness", "Thickness", "Limbus Band", (0.0, 0.1, 0.005, 0.05)),
    ParamSpec::float(P::LimbusFalloff, "limbusFalloff", "uLimbusFalloff", "Falloff", "Limbus Band", (0.0, 1.0, 0.05, 0.7)),
    ParamSpec::float(P::LimbusOpacity, "limbusOpacity", "uLimbusOpacity", "Opacity", "Limbus Band", (0.0, 1.0, 0.05, 1.0)),
    ParamSpec::int(P::NoiseOctaves, "noiseOctaves", "uNoiseOctaves", "Octaves", "Noise Pattern", (1, 8, 8)),
    ParamSpec::float(P::NoiseFrequency, "noiseFrequency", "uNoiseFrequency", "Frequency", "Noise Pattern", (0.1, 1.0, 0.01, 0.57)),
    ParamSpec::float(P::NoiseAmplitude, "noiseAmplitude", "uNoiseAmplitude", "Amplitude", "Noise Pattern", (0.0, 2.0, 0.1, 2.0)),
    ParamSpec::float(P::NoiseLacunarity, "noiseLacunarity", "uNoiseLacunarity", "Lacunarity", "Noise Pattern", (1.0, 4.0, 0.1, 2.0)),
    ParamSpec::float(P::NoiseGain, "noiseGain", "uNoiseGain", "Gain", "Noise Pattern", (0.0, 1.0, 0.05, 0.9)),
    ParamSpec::color(P::ScleraColor, "scleraColor", "uScleraColor", "Color", "Sclera", Rgb::new(255, 248, 240)),
    ParamSpec::float(P::DepthFade, "depthFade", "uDepthFade", "Depth Fade", "Sclera", (0.0, 1.0, 0.01, 0.92)),
    ParamSpec::color(P::VeinColor, "veinColor", "uVeinColor", "Color", "Veins", Rgb::new(200, 50, 50)),
    ParamSpec::float(P::VeinIntensity, "veinIntensity", "uVeinIntensity", "Intensity", "Veins", (0.0, 1.0, 0.01, 0.7)),
    ParamSpec::float(P::VeinBumpStrength, "veinBumpStrength", "uVeinBumpStrength", "Bump Strength", "Veins", (0.0, 2.0, 0.05, 0.1)),
    ParamSpec::float(P::VeinFrequency, "veinFrequency", "uVeinFrequency", "Frequency", "Vein Layer 1", (1.0, 15.0, 0.5, 2.0)),
    ParamSpec::int(P::VeinOctaves, "veinOctaves", "uVeinOctaves", "Octaves", "Vein Layer 1", (1, 5, 5)),
    ParamSpec::float(P::VeinLacunarity, "veinLacunarity", "uVeinLacunarity", "Lacunarity", "Vein Layer 1", (1.0, 4.0, 0.1, 1.7)),
    ParamSpec::float(P::VeinGain, "veinGain", "uVeinGain", "Gain", "Vein Layer 1", (0.0, 1.0, 0.05, 0.55)),
    ParamSpec::float(P::VeinThreshold, "veinThreshold", "uVeinThreshold", "Threshold", "Vein Layer 1", (0.0, 0.1, 0.001, 0.052)),
    ParamSpec::float(P::VeinThickness, "veinThickness", "uVeinThickness", "Thickness", "Vein Layer 1", (0.0, 0.1, 0.001, 0.1)),
    ParamSpec::float(P::VeinFrequency2, "veinFrequency2", "uVeinFrequency2", "Frequency", "Vein Layer 2", (1.0, 15.0, 0.5, 6.0)),
    ParamSpec::int(P::VeinOctaves2, "veinOctaves2", "uVeinOctaves2", "Octaves", "Vein Layer 2", (1, 5, 4)),
    ParamSpec::float(P::VeinLacunarity2, "veinLacunarity2", "uVeinLacunarity2", "Lacunarity", "Vein Layer 2", (1.0, 4.0, 0.1, 2.1)),
    ParamSpec::float(P::VeinGain2, "veinGain2", "uVeinGain2", "Gain", "Vein Layer 2", (0.0, 1.0, 0.05, 0.5)),
    ParamSpec::float(P::VeinThreshold2, "veinThreshold2", "uVeinThreshold2", "Threshold", "Vein Layer 2", (0.0, 0.1, 0.001, 0.04)),
    ParamSpec::float(P::VeinThickness2, "veinThickness2", "uVeinThickness2", "Thickness", "Vein Layer 2", (0.0, 0.1, 0.001, 0.1)),
    ParamSpec::float(P::RednessIntensity, "rednessIntensity", "uRednessIntensity", "Intensity", "Fresnel Redness", (0.0, 10.0, 0.01, 5.0)),
    ParamSpec::float(P::RednessPower, "rednessPower", "uRednessPower", "Power", "Fresnel Redness", (1.0, 10.0, 0.1, 1.0)),
    ParamSpec::int(P::RednessNoiseOctaves, "rednessNoiseOctaves", "uRednessNoiseOctaves", "Vein Pattern Octaves", "Fresnel Redness", (1, 8, 5)),
    ParamSpec::float(P::RednessNoiseThreshold, "rednessNoiseThreshold", "uRednessNoiseThreshold", "Vein Pattern Threshold", "Fresnel Redness", (0.0, 1.0, 0.01, 0.18)),
    ParamSpec::float(P::RednessNoiseMagnitude, "rednessNoiseMagnitude", "uRednessNoiseMagnitude", "Vein Pattern Opacity", "Fresnel Redness", (0.0, 2.0, 0.05, 0.05)),
    ParamSpec::float(P::FresnelPower, "fresnelPower", "uFresnelPower", "Fresnel Power", "Lighting", (0.1, 10.0, 0.1, 1.4)),
    ParamSpec::float(P::EnvMapIntensity, "envMapIntensity", "uEnvMapIntensity", "Env Map", "Lighting", (0.0, 2.0, 0.1, 2.0)),
    ParamSpec::float(P::EnvMapBlur, "envMapBlur", "uEnvMapBlur", "Env Blur", "Lighting", (0.0, 10.0, 0.1, 6.0)),
];

/// Which of the two independently configured vein layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VeinLayer {
    First,
    Second,
}

/// Noise settings plus the line threshold band of one vein layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VeinLayerConfig {
    pub noise: NoiseLayerConfig,
    pub threshold: f32,
    pub thickness: f32,
}

/// Current value of every parameter, indexed by [`ParamId`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingParameters {
    values: [ParamValue; PARAM_COUNT],
}

impl Default for ShadingParameters {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|index| SCHEMA[index].kind.default_value()),
        }
    }
}

impl ShadingParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ParamId) -> ParamValue {
        self.values[id as usize]
    }

    /// Stores a value after clamping it against the schema.
    pub fn set(&mut self, id: ParamId, value: ParamValue) -> Result<ParamValue, ParamError> {
        let clamped = id.spec().clamp(value)?;
        self.values[id as usize] = clamped;
        Ok(clamped)
    }

    pub fn reset(&mut self, id: ParamId) {
        self.values[id as usize] = id.spec().kind.default_value();
    }

    /// Numeric view of a scalar or integer parameter. Colours read as zero.
    pub fn float(&self, id: ParamId) -> f32 {
        self.get(id).as_float()
    }

    pub fn octaves(&self, id: ParamId) -> u32 {
        match self.get(id) {
            ParamValue::Int(v) => v,
            ParamValue::Float(v) => v.max(0.0) as u32,
            ParamValue::Color(_) => 0,
        }
    }

    /// Unit-float view of a colour parameter. Scalars read as black.
    pub fn color(&self, id: ParamId) -> Vec3 {
        match self.get(id) {
            ParamValue::Color(c) => c.to_unit(),
            _ => Vec3::ZERO,
        }
    }

    pub fn iris_noise(&self) -> NoiseLayerConfig {
        NoiseLayerConfig::new(
            self.octaves(P::NoiseOctaves),
            self.float(P::NoiseFrequency),
            self.float(P::NoiseAmplitude),
            self.float(P::NoiseLacunarity),
            self.float(P::NoiseGain),
        )
    }

    pub fn vein_layer(&self, layer: VeinLayer) -> VeinLayerConfig {
        let (octaves, frequency, lacunarity, gain, threshold, thickness) = match layer {
            VeinLayer::First => (
                P::VeinOctaves,
                P::VeinFrequency,
                P::VeinLacunarity,
                P::VeinGain,
                P::VeinThreshold,
                P::VeinThickness,
            ),
            VeinLayer::Second => (
                P::VeinOctaves2,
                P::VeinFrequency2,
                P::VeinLacunarity2,
                P::VeinGain2,
                P::VeinThreshold2,
                P::VeinThickness2,
            ),
        };
        VeinLayerConfig {
            noise: NoiseLayerConfig::new(
                self.octaves(octaves),
                self.float(frequency),
                1.0,
                self.float(lacunarity),
                self.float(gain),
            ),
            threshold: self.float(threshold),
            thickness: self.float(thickness),
        }
    }

    /// Redness pattern layer: the vein layer's frequency, lacunarity and gain
    /// with the redness octave count.
    pub fn redness_layer(&self, layer: VeinLayer) -> NoiseLayerConfig {
        NoiseLayerConfig {
            octaves: self.octaves(P::RednessNoiseOctaves),
            ..self.vein_layer(layer).noise
        }
    }

    /// Iterates `(spec, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static ParamSpec, ParamValue)> + '_ {
        SCHEMA.iter().zip(self.values.iter().copied())
    }

    /// Serialises every value into the XML preset format.
    pub fn to_preset_xml(&self) -> String {
        let mut xml = String::from("<eyeball>\n");
        for (spec, value) in self.iter() {
            xml.push_str(&format!("  <param name=\"{}\">{}</param>\n", spec.name, value));
        }
        xml.push_str("</eyeball>\n");
        xml
    }
}
