//! WGSL sources for the hover plane.
//!
//! Both stages read one uniform block (`PlaneUniform` in
//! [`gpu`](super::gpu)) and the fragment stage samples the three material
//! textures. Texture rows are stored top-down, so `v` is flipped on lookup.
//! The fragment stage writes premultiplied alpha.

pub const PLANE_VERTEX_SHADER: &str = r#"
const PI: f32 = 3.14159265;

struct PlaneUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    // x: hover_state
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> plane: PlaneUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let hover = plane.params.x;
    var position = input.position;
    position.z = position.z + sin(input.uv.x * PI) * hover * 0.5;
    out.position = plane.view_proj * plane.model * vec4<f32>(position, 1.0);
    out.uv = input.uv;
    return out;
}
"#;

pub const PLANE_FRAGMENT_SHADER: &str = r#"
struct PlaneUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> plane: PlaneUniform;
@group(0) @binding(1)
var logo_primary: texture_2d<f32>;
@group(0) @binding(2)
var logo_secondary: texture_2d<f32>;
@group(0) @binding(3)
var displacement: texture_2d<f32>;
@group(0) @binding(4)
var plane_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

fn flip(uv: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(uv.x, 1.0 - uv.y);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let hover = plane.params.x;
    let noise = textureSample(displacement, plane_sampler, flip(input.uv)).r;
    let offset = (noise - 0.5) * 0.2;

    let out_uv = input.uv + vec2<f32>(offset * hover, 0.0);
    let in_uv = input.uv + vec2<f32>(offset * (1.0 - hover), 0.0);

    let primary = textureSample(logo_primary, plane_sampler, flip(out_uv));
    let secondary = textureSample(logo_secondary, plane_sampler, flip(in_uv));
    let color = mix(primary, secondary, smoothstep(0.0, 1.0, hover));
    return vec4<f32>(color.rgb * color.a, color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_share_uniform_layout_and_entry_points() {
        assert!(PLANE_VERTEX_SHADER.contains("fn vs_main"));
        assert!(PLANE_FRAGMENT_SHADER.contains("fn fs_main"));
        for source in [PLANE_VERTEX_SHADER, PLANE_FRAGMENT_SHADER] {
            assert!(source.contains("params: vec4<f32>"));
            assert!(source.contains("@group(0) @binding(0)"));
        }
    }
}
