//! Pure mapping from the mood state to the renderer's visual parameters.
//!
//! Every output is a linear interpolation between fixed endpoints, so the
//! same state always produces bit-identical parameters.

use crate::state::StateVector;
use palette::{FromColor, Srgb};

// Color endpoints
pub const HUE_RANGE: (f32, f32) = (0.6, 0.03); // cool blue at low valence, warm at high
pub const SATURATION_RANGE: (f32, f32) = (0.35, 0.9);
pub const LIGHTNESS_RANGE: (f32, f32) = (0.38, 0.72);
pub const SECONDARY_HUE_SHIFT: f32 = 0.08;
pub const SECONDARY_SATURATION_DROP: f32 = 0.2;
pub const SECONDARY_SATURATION_MIN: f32 = 0.25;
pub const SECONDARY_LIGHTNESS_DROP: f32 = 0.18;
pub const SECONDARY_LIGHTNESS_MIN: f32 = 0.2;

// Texture and motion endpoints
pub const NOISE_AMPLITUDE_RANGE: (f32, f32) = (0.06, 0.42);
pub const NOISE_FREQUENCY_RANGE: (f32, f32) = (0.6, 3.2);
pub const JITTER_RANGE: (f32, f32) = (0.02, 0.35);
pub const DENSITY_RANGE: (f32, f32) = (0.36, 1.0);
pub const POINT_SIZE_RANGE: (f32, f32) = (1.8, 3.1);
pub const BREATH_HZ_RANGE: (f32, f32) = (0.08, 0.25);
pub const BREATH_JITTER_RANGE: (f32, f32) = (0.001, 0.04);
pub const SOCIAL_SINK_RANGE: (f32, f32) = (0.0, 0.38);

// Blend weights
pub const NOISE_LOAD_WEIGHT: f32 = 0.7;
pub const NOISE_INTENSITY_WEIGHT: f32 = 0.3;
pub const DENSITY_INTENSITY_WEIGHT: f32 = 0.65;
pub const DENSITY_LOAD_WEIGHT: f32 = 0.35;

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn lerp_range(r: (f32, f32), t: f32) -> f32 {
    lerp(r.0, r.1, t)
}

/// Hue/saturation/lightness triple, each in \[0, 1\].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn to_rgb(self) -> [f32; 3] {
        let hsl: palette::Hsl = palette::Hsl::new(self.h * 360.0, self.s, self.l);
        let rgb: Srgb = Srgb::from_color(hsl);
        let (r, g, b) = rgb.into_components();
        [r, g, b]
    }
}

/// Visual parameter bundle consumed by the renderer each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualParams {
    pub primary_hsl: Hsl,
    pub secondary_hsl: Hsl,
    pub primary_rgb: [f32; 3],
    pub secondary_rgb: [f32; 3],
    pub noise_amplitude: f32,
    pub noise_frequency: f32,
    pub jitter: f32,
    pub density: f32,
    pub point_size: f32,
    pub breath_hz: f32,
    pub breath_jitter: f32,
    pub social_sink: f32,
}

/// Map a state vector to visual parameters.
pub fn map_state_to_visual(state: &StateVector) -> VisualParams {
    let hue = lerp_range(HUE_RANGE, state.valence);
    let saturation = lerp_range(SATURATION_RANGE, state.arousal);
    let lightness = lerp_range(LIGHTNESS_RANGE, state.arousal);
    let primary_hsl = Hsl {
        h: hue,
        s: saturation,
        l: lightness,
    };
    let secondary_hsl = Hsl {
        h: (hue + SECONDARY_HUE_SHIFT * (1.0 - state.valence)) % 1.0,
        s: (saturation - SECONDARY_SATURATION_DROP).max(SECONDARY_SATURATION_MIN),
        l: (lightness - SECONDARY_LIGHTNESS_DROP).max(SECONDARY_LIGHTNESS_MIN),
    };

    let load_boost = state.load * NOISE_LOAD_WEIGHT + state.intensity * NOISE_INTENSITY_WEIGHT;
    let density_t = (state.intensity * DENSITY_INTENSITY_WEIGHT + state.load * DENSITY_LOAD_WEIGHT).min(1.0);
    let density = lerp_range(DENSITY_RANGE, density_t);

    VisualParams {
        primary_hsl,
        secondary_hsl,
        primary_rgb: primary_hsl.to_rgb(),
        secondary_rgb: secondary_hsl.to_rgb(),
        noise_amplitude: lerp_range(NOISE_AMPLITUDE_RANGE, load_boost),
        noise_frequency: lerp_range(NOISE_FREQUENCY_RANGE, state.load),
        jitter: lerp_range(JITTER_RANGE, 1.0 - state.stability),
        density,
        point_size: lerp_range(POINT_SIZE_RANGE, density),
        breath_hz: lerp_range(BREATH_HZ_RANGE, state.arousal),
        breath_jitter: lerp_range(BREATH_JITTER_RANGE, 1.0 - state.stability),
        social_sink: lerp_range(SOCIAL_SINK_RANGE, state.social_drain),
    }
}
