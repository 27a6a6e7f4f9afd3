//! WGSL source for the eye and background pipelines.
//!
//! The uniform struct and one accessor per parameter are generated from the
//! [`UniformLayout`], so the shader reads every parameter from the slot the
//! binder writes it to. The fragment stage follows `crate::shading` step for
//! step.

use crate::noise::MAX_OCTAVES;
use crate::shading::{
    EDGE_EPSILON, MIN_VEIN_THICKNESS, PUPIL_BLEND_WIDTH, REDNESS_BAND, VEIN_FADE_WIDTH,
};
use crate::uniforms::{constant_name, UniformLayout, UniformSlot, COLOR_ROWS, OCTAVE_ROWS, SCALAR_ROWS};

const LANES: [&str; 4] = ["x", "y", "z", "w"];

/// WGSL function name used to read a parameter, e.g. `vein_frequency2`.
pub fn accessor_name(parameter: &str) -> String {
    constant_name(parameter).to_ascii_lowercase()
}

/// Complete shader module source for `layout`.
pub fn eye_shader_source(layout: &UniformLayout) -> String {
    let mut source = String::with_capacity(HEADER.len() + BODY.len() + 4096);
    source.push_str(HEADER);
    source.push_str(&format!(
        "const MAX_OCTAVES: i32 = {MAX_OCTAVES};\n\
         const EDGE_EPSILON: f32 = {};\n\
         const MIN_VEIN_THICKNESS: f32 = {};\n\
         const REDNESS_BAND: f32 = {};\n\
         const VEIN_FADE_WIDTH: f32 = {};\n\
         const PUPIL_BLEND_WIDTH: f32 = {};\n\n",
        wgsl_float(EDGE_EPSILON),
        wgsl_float(MIN_VEIN_THICKNESS),
        wgsl_float(REDNESS_BAND),
        wgsl_float(VEIN_FADE_WIDTH),
        wgsl_float(PUPIL_BLEND_WIDTH),
    ));
    source.push_str(&format!(
        "struct EyeUniforms {{\n    \
             colors: array<vec4<f32>, {COLOR_ROWS}>,\n    \
             scalars: array<vec4<f32>, {SCALAR_ROWS}>,\n    \
             octaves: array<vec4<i32>, {OCTAVE_ROWS}>,\n    \
             eye_direction: vec4<f32>,\n    \
             frame: vec4<f32>,\n\
         }}\n\n\
         @group(0) @binding(1)\n\
         var<uniform> eye: EyeUniforms;\n\n"
    ));
    for (id, slot) in layout.iter() {
        source.push_str(&accessor(id.name(), slot));
    }
    source.push('\n');
    source.push_str(BODY);
    source
}

fn accessor(parameter: &str, slot: UniformSlot) -> String {
    let name = accessor_name(parameter);
    match slot {
        UniformSlot::Color { row } => {
            format!("fn {name}() -> vec3<f32> {{ return eye.colors[{row}].rgb; }}\n")
        }
        UniformSlot::Scalar { row, lane } => format!(
            "fn {name}() -> f32 {{ return eye.scalars[{row}].{}; }}\n",
            LANES[lane]
        ),
        UniformSlot::Octaves { row, lane } => format!(
            "fn {name}() -> i32 {{ return eye.octaves[{row}].{}; }}\n",
            LANES[lane]
        ),
    }
}

fn wgsl_float(value: f32) -> String {
    format!("{value:?}")
}

const HEADER: &str = r#"const PI: f32 = 3.14159265358979;

struct Globals {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    camera_position: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: Globals;
@group(0) @binding(2)
var env_texture: texture_2d<f32>;
@group(0) @binding(3)
var env_sampler: sampler;

"#;

const BODY: &str = r#"fn hash_component(x: f32) -> f32 {
    return -1.0 + 2.0 * fract(sin(x) * 43758.5453123);
}

fn hash2(p: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(
        hash_component(dot(p, vec2<f32>(127.1, 311.7))),
        hash_component(dot(p, vec2<f32>(269.5, 183.3))),
    );
}

fn hash3(p: vec3<f32>) -> vec3<f32> {
    return vec3<f32>(
        hash_component(dot(p, vec3<f32>(127.1, 311.7, 74.7))),
        hash_component(dot(p, vec3<f32>(269.5, 183.3, 246.1))),
        hash_component(dot(p, vec3<f32>(113.5, 271.9, 124.6))),
    );
}

fn quintic(t: vec3<f32>) -> vec3<f32> {
    return t * t * t * (t * (t * 6.0 - 15.0) + 10.0);
}

fn corner2(cell: vec2<f32>, f: vec2<f32>, offset: vec2<f32>) -> f32 {
    return dot(hash2(cell + offset), f - offset);
}

fn corner3(cell: vec3<f32>, f: vec3<f32>, offset: vec3<f32>) -> f32 {
    return dot(hash3(cell + offset), f - offset);
}

fn noise2(p: vec2<f32>) -> f32 {
    let cell = floor(p);
    let f = p - cell;
    let u = quintic(vec3<f32>(f, 0.0));
    let bottom = mix(corner2(cell, f, vec2<f32>(0.0, 0.0)), corner2(cell, f, vec2<f32>(1.0, 0.0)), u.x);
    let top = mix(corner2(cell, f, vec2<f32>(0.0, 1.0)), corner2(cell, f, vec2<f32>(1.0, 1.0)), u.x);
    return clamp(mix(bottom, top, u.y), -1.0, 1.0);
}

fn noise3(p: vec3<f32>) -> f32 {
    let cell = floor(p);
    let f = p - cell;
    let u = quintic(f);
    let near = mix(
        mix(corner3(cell, f, vec3<f32>(0.0, 0.0, 0.0)), corner3(cell, f, vec3<f32>(1.0, 0.0, 0.0)), u.x),
        mix(corner3(cell, f, vec3<f32>(0.0, 1.0, 0.0)), corner3(cell, f, vec3<f32>(1.0, 1.0, 0.0)), u.x),
        u.y,
    );
    let far = mix(
        mix(corner3(cell, f, vec3<f32>(0.0, 0.0, 1.0)), corner3(cell, f, vec3<f32>(1.0, 0.0, 1.0)), u.x),
        mix(corner3(cell, f, vec3<f32>(0.0, 1.0, 1.0)), corner3(cell, f, vec3<f32>(1.0, 1.0, 1.0)), u.x),
        u.y,
    );
    return clamp(mix(near, far, u.z), -1.0, 1.0);
}

struct NoiseLayer {
    octaves: i32,
    frequency: f32,
    amplitude: f32,
    lacunarity: f32,
    gain: f32,
}

fn fbm2(p: vec2<f32>, layer: NoiseLayer) -> f32 {
    var value = 0.0;
    var frequency = layer.frequency;
    var amplitude = layer.amplitude;
    let count = min(layer.octaves, MAX_OCTAVES);
    for (var i = 0; i < count; i = i + 1) {
        value = value + amplitude * noise2(p * frequency);
        frequency = frequency * layer.lacunarity;
        amplitude = amplitude * layer.gain;
    }
    return value;
}

fn fbm3(p: vec3<f32>, layer: NoiseLayer) -> f32 {
    var value = 0.0;
    var frequency = layer.frequency;
    var amplitude = layer.amplitude;
    let count = min(layer.octaves, MAX_OCTAVES);
    for (var i = 0; i < count; i = i + 1) {
        value = value + amplitude * noise3(p * frequency);
        frequency = frequency * layer.lacunarity;
        amplitude = amplitude * layer.gain;
    }
    return value;
}

fn linear_step(edge0: f32, edge1: f32, x: f32) -> f32 {
    var span = edge1 - edge0;
    if (abs(span) < EDGE_EPSILON) {
        span = select(EDGE_EPSILON, -EDGE_EPSILON, span < 0.0);
    }
    return clamp((x - edge0) / span, 0.0, 1.0);
}

fn safe_smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    var span = edge1 - edge0;
    if (abs(span) < EDGE_EPSILON) {
        span = select(EDGE_EPSILON, -EDGE_EPSILON, span < 0.0);
    }
    let t = clamp((x - edge0) / span, 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}

fn iris_layer() -> NoiseLayer {
    return NoiseLayer(noise_octaves(), noise_frequency(), noise_amplitude(), noise_lacunarity(), noise_gain());
}

fn vein_layer_1(octaves: i32) -> NoiseLayer {
    return NoiseLayer(octaves, vein_frequency(), 1.0, vein_lacunarity(), vein_gain());
}

fn vein_layer_2(octaves: i32) -> NoiseLayer {
    return NoiseLayer(octaves, vein_frequency2(), 1.0, vein_lacunarity2(), vein_gain2());
}

fn vein_line(value: f32, threshold: f32, thickness: f32) -> f32 {
    return safe_smoothstep(threshold, threshold - max(thickness, MIN_VEIN_THICKNESS), abs(value));
}

fn vein_signal_pair(p: vec3<f32>) -> f32 {
    let first = vein_line(fbm3(p, vein_layer_1(vein_octaves())), vein_threshold(), vein_thickness());
    let second = vein_line(fbm3(p, vein_layer_2(vein_octaves2())), vein_threshold2(), vein_thickness2());
    return first + second;
}

fn redness_signal(p: vec3<f32>) -> f32 {
    let octaves = redness_noise_octaves();
    let threshold = redness_noise_threshold();
    return vein_line(fbm3(p, vein_layer_1(octaves)), threshold, REDNESS_BAND)
        + vein_line(fbm3(p, vein_layer_2(octaves)), threshold, REDNESS_BAND);
}

fn shade_iris(p: vec3<f32>, d: f32) -> vec3<f32> {
    let pupil = pupil_size();
    let iris = iris_size();
    let thickness = limbus_thickness();

    let noise = fbm2(vec2<f32>(atan2(p.y, p.x), d), iris_layer());
    let intensity = 0.7 + 0.3 * noise;

    var color = mix(iris_inner_color(), iris_outer_color(), linear_step(pupil, iris, d)) * intensity;
    color = color * (0.5 + 0.5 * safe_smoothstep(iris, pupil, d));

    let gradient = safe_smoothstep(iris - thickness * 0.5, iris + thickness * 0.5, d);
    let limbus = clamp(gradient * (1.0 - intensity * (1.0 - limbus_falloff())) * limbus_opacity(), 0.0, 1.0);
    color = mix(color, limbus_color(), limbus);

    let emerge = safe_smoothstep(pupil, pupil + PUPIL_BLEND_WIDTH, d);
    color = mix(pupil_color(), color, emerge);

    let edge_fade = 1.0 - safe_smoothstep(iris + thickness * 0.3, iris + thickness, d);
    return mix(sclera_color(), color, edge_fade);
}

fn shade_sclera(p: vec3<f32>, d: f32) -> vec3<f32> {
    let start = iris_size() + iris_feather();
    let depth = mix(1.0, (1.0 - p.z) * 0.5 + 0.5, depth_fade());
    let fade = safe_smoothstep(start, start + VEIN_FADE_WIDTH, d);
    let veins = vein_signal_pair(p) * fade * depth;
    return mix(sclera_color(), vein_color(), veins * vein_intensity());
}

fn base_color(p: vec3<f32>, d: f32) -> vec3<f32> {
    if (d < pupil_size()) {
        return pupil_color();
    }
    if (d < iris_size() + limbus_thickness()) {
        return shade_iris(p, d);
    }
    return shade_sclera(p, d);
}

fn tangent_of(n: vec3<f32>) -> vec3<f32> {
    let around_y = cross(n, vec3<f32>(0.0, 1.0, 0.0));
    if (dot(around_y, around_y) > 1e-12) {
        return normalize(around_y);
    }
    let around_x = cross(n, vec3<f32>(1.0, 0.0, 0.0));
    if (dot(around_x, around_x) > 1e-12) {
        return normalize(around_x);
    }
    return vec3<f32>(1.0, 0.0, 0.0);
}

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    let low = c / 12.92;
    let high = pow((c + 0.055) / 1.055, vec3<f32>(2.4));
    return select(high, low, c <= vec3<f32>(0.04045));
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let v = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
    let low = v * 12.92;
    let high = 1.055 * pow(v, vec3<f32>(1.0 / 2.4)) - 0.055;
    return select(high, low, v <= vec3<f32>(0.0031308));
}

fn sample_environment(direction: vec3<f32>, lod: f32) -> vec3<f32> {
    let dir = normalize(direction);
    let u = atan2(dir.z, dir.x) / (2.0 * PI) + 0.5;
    let v = clamp(0.5 - asin(clamp(dir.y, -1.0, 1.0)) / PI, 0.0, 1.0);
    let level = clamp(lod, 0.0, max(eye.frame.y - 1.0, 0.0));
    return textureSampleLevel(env_texture, env_sampler, vec2<f32>(u, v), level).rgb;
}

fn srgb_target() -> bool {
    return eye.frame.z > 0.5;
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) object_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) view_dir: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = globals.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world;
    out.object_pos = input.position;
    let normal_matrix = mat3x3<f32>(
        globals.normal[0].xyz,
        globals.normal[1].xyz,
        globals.normal[2].xyz,
    );
    out.normal = normalize(normal_matrix * input.normal);
    out.view_dir = globals.camera_position.xyz - world.xyz;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let position = normalize(input.object_pos);
    var normal = normalize(input.normal);

    // Derivatives are taken before any per-fragment branching.
    let redness_noise = redness_signal(input.object_pos);
    let relief = vein_signal_pair(input.object_pos) + redness_noise;
    let dx = dpdx(relief);
    let dy = dpdy(relief);
    let strength = vein_bump_strength();
    if (strength > 0.0) {
        let tangent = tangent_of(normal);
        let bitangent = normalize(cross(normal, tangent));
        normal = normalize(normal + (tangent * dx + bitangent * dy) * strength);
    }

    var color = base_color(position, length(position.xy));

    let eye_dir = normalize(eye.eye_direction.xyz);
    let facing = max(1.0 - dot(normal, eye_dir) * 0.5 - 0.5, 0.0);
    let redness = clamp(pow(facing, redness_power()) + redness_noise * redness_noise_magnitude(), 0.0, 1.0);
    let depth = mix(1.0, (1.0 - position.z) * 0.5, depth_fade());
    color = mix(color, vein_color(), clamp(redness * redness_intensity() * depth, 0.0, 1.0));

    let view = normalize(input.view_dir);
    let fresnel = pow(max(1.0 - abs(dot(view, normal)), 0.0), fresnel_power());
    let reflected = sample_environment(reflect(-view, normal), env_map_blur());
    color = mix(color, reflected, clamp(fresnel * env_map_intensity() * 0.5, 0.0, 1.0));

    color = clamp(color, vec3<f32>(0.0), vec3<f32>(1.0));
    return vec4<f32>(select(color, srgb_to_linear(color), srgb_target()), 1.0);
}

struct BackgroundOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
}

@vertex
fn vs_background(@builtin(vertex_index) index: u32) -> BackgroundOutput {
    var out: BackgroundOutput;
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    out.ndc = uv * 2.0 - 1.0;
    out.position = vec4<f32>(out.ndc, 0.0, 1.0);
    return out;
}

@fragment
fn fs_background(input: BackgroundOutput) -> @location(0) vec4<f32> {
    let near = globals.inv_view_proj * vec4<f32>(input.ndc, 0.0, 1.0);
    let far = globals.inv_view_proj * vec4<f32>(input.ndc, 1.0, 1.0);
    let direction = far.xyz / far.w - near.xyz / near.w;
    let color = sample_environment(direction, 0.0);
    return vec4<f32>(select(linear_to_srgb(color), color, srgb_target()), 1.0);
}
"#;
