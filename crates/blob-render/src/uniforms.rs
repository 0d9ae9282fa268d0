//! GPU-side layouts. Every field is packed into vec4 slots so the Rust and
//! WGSL layouts agree without manual padding.

use blob_core::{Camera, FrameSnapshot, ShapeElements};
use palette::{LinSrgb, Srgb};

/// One point of the cloud: rest position and per-point random seed.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub position: [f32; 3],
    pub seed: [f32; 3],
}

pub fn pack_instances(elements: &ShapeElements) -> Vec<InstanceData> {
    elements
        .positions
        .iter()
        .zip(&elements.seeds)
        .map(|(p, s)| InstanceData {
            position: p.to_array(),
            seed: *s,
        })
        .collect()
}

/// Unit quad corners for the point sprites, two triangles.
pub const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color_a: [f32; 4],   // linear rgb, time
    pub color_b: [f32; 4],   // linear rgb, density
    pub noise: [f32; 4],     // amplitude, frequency, jitter, point size
    pub breath: [f32; 4],    // hz, jitter, social sink, pixel ratio
    pub pointer: [f32; 4],   // xyz, zone gate (0 when absent)
    pub offset: [f32; 4],    // xyz, stretch
    pub direction: [f32; 4], // xyz, detail amount
    pub zones: [f32; 4],     // dead radius, response radius, press boost, mode
    pub extra: [f32; 4],     // target width, target height, detail noise, attract strength
}

impl ShapeUniforms {
    pub fn new(frame: &FrameSnapshot, camera: &Camera, target_size: (u32, u32)) -> Self {
        let v = &frame.visual;
        let d = &frame.deformation;
        let cfg = &frame.interaction;
        let [ar, ag, ab] = srgb_to_linear(v.primary_rgb);
        let [br, bg, bb] = srgb_to_linear(v.secondary_rgb);
        let (pointer, gate) = match frame.pointer {
            Some(p) => (p, d.gate),
            None => (glam::Vec3::ZERO, 0.0),
        };
        let boost = if frame.pressed {
            cfg.click_boost
        } else {
            1.0
        };
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            color_a: [ar, ag, ab, frame.elapsed_sec],
            color_b: [br, bg, bb, v.density],
            noise: [v.noise_amplitude, v.noise_frequency, v.jitter, v.point_size],
            breath: [
                v.breath_hz,
                v.breath_jitter,
                v.social_sink,
                frame.viewport.pixel_ratio,
            ],
            pointer: [pointer.x, pointer.y, pointer.z, gate],
            offset: [d.offset.x, d.offset.y, d.offset.z, d.stretch],
            direction: [d.direction.x, d.direction.y, d.direction.z, d.detail_amount],
            zones: [
                d.dead_zone_radius,
                d.response_zone_radius,
                boost,
                frame.mode.shader_code() as f32,
            ],
            extra: [
                target_size.0.max(1) as f32,
                target_size.1.max(1) as f32,
                cfg.detail_noise,
                cfg.attract_strength,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostUniforms {
    pub resolution: [f32; 2],
    pub blur_dir: [f32; 2],
    pub bloom_strength: f32,
    pub threshold: f32,
    pub bloom_radius: f32,
    pub _pad: f32,
}

/// Gamma-encoded sRGB to linear, clamped to \[0, 1\] first.
pub fn srgb_to_linear(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb.map(|c| c.clamp(0.0, 1.0));
    let linear: LinSrgb = Srgb::new(r, g, b).into_linear();
    let (r, g, b) = linear.into_components();
    [r, g, b]
}

pub fn clear_color(background: [f32; 3]) -> wgpu::Color {
    let [r, g, b] = srgb_to_linear(background);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
