//! Pointer-driven deformation of the blob.
//!
//! A spring-damper pulls the shape's center offset toward a gated,
//! falloff-weighted target derived from the pointer, while a separate
//! exponential relaxation tracks the pointer direction and a ring-shaped
//! stretch profile. All config is range-clamped before it reaches here, and
//! the offset is hard-clamped every tick, so the integrator cannot diverge.

use crate::config::{EngineContext, InteractionConfig};
use crate::constants::*;
use glam::Vec3;
use serde::Deserialize;

/// How the pointer influences the shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Shape leans toward the pointer.
    #[default]
    #[serde(alias = "attract", alias = "gravity")]
    Follow,
    /// Shape leans away from the pointer.
    Repel,
    /// Shape drifts tangentially around the pointer.
    Vortex,
    Off,
}

impl InteractionMode {
    pub fn name(self) -> &'static str {
        match self {
            InteractionMode::Follow => "follow",
            InteractionMode::Repel => "repel",
            InteractionMode::Vortex => "vortex",
            InteractionMode::Off => "off",
        }
    }

    /// Cycle order used by the keyboard shortcut.
    pub fn next(self) -> Self {
        match self {
            InteractionMode::Follow => InteractionMode::Repel,
            InteractionMode::Repel => InteractionMode::Vortex,
            InteractionMode::Vortex => InteractionMode::Off,
            InteractionMode::Off => InteractionMode::Follow,
        }
    }

    /// Integer code shared with the shader.
    pub fn shader_code(self) -> u32 {
        match self {
            InteractionMode::Off => 0,
            InteractionMode::Follow => 1,
            InteractionMode::Repel => 2,
            InteractionMode::Vortex => 3,
        }
    }
}

/// Per-tick deformer output handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deformation {
    pub offset: Vec3,
    pub direction: Vec3,
    pub stretch: f32,
    /// Upper bound on the secondary detail-noise contribution.
    pub detail_amount: f32,
    /// Zone gate of the current pointer distance, 0 inside the dead zone.
    pub gate: f32,
    pub dead_zone_radius: f32,
    pub response_zone_radius: f32,
}

/// Cubic smoothstep; exactly 0 at or below `edge0`, exactly 1 at or above
/// `edge1`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if x <= edge0 {
        return 0.0;
    }
    if x >= edge1 {
        return 1.0;
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Dead/response zone radii for a shape of radius `base_radius`, with the
/// response edge kept strictly outside the dead edge.
pub fn zone_radii(cfg: &InteractionConfig, base_radius: f32) -> (f32, f32) {
    let dead = cfg.dead_zone_ratio * base_radius;
    let response = (cfg.response_zone_ratio * base_radius).max(dead + ZONE_EDGE_EPSILON);
    (dead, response)
}

/// Smooth 0..1 response weight of a pointer at distance `dist` from center.
#[inline]
pub fn zone_gate(dist: f32, dead: f32, response: f32) -> f32 {
    if dist < dead {
        return 0.0;
    }
    smoothstep(dead, response, dist)
}

/// Ring-shaped stretch weight peaking near `peak`, zero outside
/// `(inner, outer)`.
pub fn stretch_profile(dist: f32, inner: f32, peak: f32, outer: f32) -> f32 {
    let inner = inner.max(ZONE_EDGE_EPSILON);
    let peak = peak.max(inner + ZONE_EDGE_EPSILON);
    let outer = outer.max(peak + ZONE_EDGE_EPSILON);
    if !(dist > inner && dist < outer) {
        return 0.0;
    }
    let x = (dist / peak).clamp(0.0, 2.0);
    let ring = x * (1.0 - x).exp();
    let inner_gate = ((dist - inner) / (peak - inner)).clamp(0.0, 1.0);
    let outer_gate = ((outer - dist) / (outer - peak)).clamp(0.0, 1.0);
    ring * inner_gate * outer_gate
}

/// Continuous spring-damper simulation of the blob's pointer response.
pub struct PointerDeformer {
    center: Vec3,
    base_radius: f32,
    offset: Vec3,
    velocity: Vec3,
    direction: Vec3,
    stretch: f32,
    last: Deformation,
}

impl PointerDeformer {
    pub fn new(ctx: &EngineContext) -> Self {
        Self::with_base_radius(ctx.settings.shape.radius)
    }

    pub fn with_base_radius(base_radius: f32) -> Self {
        let base_radius = if base_radius.is_finite() { base_radius.max(0.0) } else { SHAPE_RADIUS };
        let (dead, response) = zone_radii(&InteractionConfig::default(), base_radius);
        Self {
            center: Vec3::ZERO,
            base_radius,
            offset: Vec3::ZERO,
            velocity: Vec3::ZERO,
            direction: Vec3::X,
            stretch: 0.0,
            last: Deformation {
                offset: Vec3::ZERO,
                direction: Vec3::X,
                stretch: 0.0,
                detail_amount: 0.0,
                gate: 0.0,
                dead_zone_radius: dead,
                response_zone_radius: response,
            },
        }
    }

    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Output of the most recent update.
    pub fn last(&self) -> Deformation {
        self.last
    }

    /// Spring target for a pointer at `pointer`, before integration.
    ///
    /// Zero when the mode is off, the pointer is absent, or the pointer is
    /// inside the dead zone.
    pub fn target_offset(
        &self,
        pointer: Option<Vec3>,
        pressed: bool,
        mode: InteractionMode,
        cfg: &InteractionConfig,
    ) -> (Vec3, f32) {
        let Some(p) = pointer.filter(|p| p.is_finite()) else {
            return (Vec3::ZERO, 0.0);
        };
        let v = p - self.center;
        let dist = v.length();
        let (dead, response) = zone_radii(cfg, self.base_radius);
        let gate = zone_gate(dist, dead, response);
        if mode == InteractionMode::Off || gate <= 0.0 {
            return (Vec3::ZERO, gate);
        }
        let heading = match mode {
            InteractionMode::Follow => v,
            InteractionMode::Repel => -v,
            InteractionMode::Vortex => Vec3::new(-v.y, v.x, 0.0),
            InteractionMode::Off => Vec3::ZERO,
        };
        let boost = if pressed { cfg.hover_boost } else { 1.0 };
        let radius = cfg.attract_radius.max(ZONE_EDGE_EPSILON);
        let falloff = (-(dist * dist) / (2.0 * radius * radius)).exp();
        let target = heading * (cfg.attract_strength * boost * gate * falloff);
        (target.clamp_length_max(cfg.max_offset), gate)
    }

    /// Advance the simulation by `dt` seconds using the latest pointer sample.
    pub fn update(
        &mut self,
        dt: f32,
        pointer: Option<Vec3>,
        pressed: bool,
        mode: InteractionMode,
        cfg: &InteractionConfig,
    ) -> Deformation {
        let dt = if dt.is_finite() { dt.clamp(0.0, DEFORMER_MAX_STEP_SEC) } else { 0.0 };
        let pointer = pointer.filter(|p| p.is_finite());
        let (target, gate) = self.target_offset(pointer, pressed, mode, cfg);

        // Semi-implicit Euler: velocity first, then position from new velocity.
        let accel = (target - self.offset) * cfg.stiffness - self.velocity * cfg.damping;
        self.velocity += accel * dt;
        self.offset += self.velocity * dt;
        self.offset = self.offset.clamp_length_max(cfg.max_offset);

        let alpha = (1.0 - (-cfg.relax_speed * dt).exp()).clamp(0.0, 1.0);
        let boost = if pressed { cfg.hover_boost } else { 1.0 };
        let mut target_stretch = 0.0;
        if let (Some(p), true) = (pointer, mode != InteractionMode::Off) {
            let rel = p - (self.center + self.offset);
            let dist = rel.length();
            if rel.length_squared() > 1e-8 {
                let blended = self.direction.lerp(rel / dist, alpha);
                if blended.length_squared() > 1e-8 {
                    self.direction = blended.normalize();
                }
            }
            let profile = stretch_profile(dist, cfg.inner_radius, cfg.peak_radius, cfg.outer_radius);
            target_stretch = (cfg.stretch_strength * boost * profile).clamp(0.0, cfg.stretch_max);
        }
        self.stretch += (target_stretch - self.stretch) * alpha;

        let (dead, response) = zone_radii(cfg, self.base_radius);
        self.last = Deformation {
            offset: self.offset,
            direction: self.direction,
            stretch: self.stretch,
            detail_amount: (self.stretch * DETAIL_PER_STRETCH).min(DETAIL_AMOUNT_MAX),
            gate,
            dead_zone_radius: dead,
            response_zone_radius: response,
        };
        self.last
    }

    /// Keep the last output without integrating, re-clamped to `cfg` so a
    /// limit lowered while paused still holds.
    pub fn hold(&mut self, cfg: &InteractionConfig) -> Deformation {
        self.offset = self.offset.clamp_length_max(cfg.max_offset);
        self.stretch = self.stretch.min(cfg.stretch_max);
        self.last.offset = self.last.offset.clamp_length_max(cfg.max_offset);
        self.last.stretch = self.last.stretch.min(cfg.stretch_max);
        self.last.detail_amount = (self.last.stretch * DETAIL_PER_STRETCH).min(DETAIL_AMOUNT_MAX);
        self.last
    }
}
