//! Mood state vector, timed transitions and the session state owner.
//!
//! `StateModel` is the only place the six-dimensional state, the interaction
//! mode and the runtime config overrides change. Hosts mutate it through
//! explicit setters; the frame governor reads it once per tick.

use crate::config::{validate_config, ConfigValue, ConfigWrite, EngineContext, InteractionConfig, RenderOverrides};
use crate::constants::*;
use crate::deformer::InteractionMode;
use crate::error::ControlError;
use crate::presets::Preset;
use serde::Deserialize;

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Six independent scalars, each kept in \[0, 1\].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateVector {
    pub arousal: f32,
    pub valence: f32,
    pub stability: f32,
    pub load: f32,
    pub social_drain: f32,
    pub intensity: f32,
}

impl Default for StateVector {
    fn default() -> Self {
        Self {
            arousal: DEFAULT_AROUSAL,
            valence: DEFAULT_VALENCE,
            stability: DEFAULT_STABILITY,
            load: DEFAULT_LOAD,
            social_drain: DEFAULT_SOCIAL_DRAIN,
            intensity: DEFAULT_INTENSITY,
        }
    }
}

impl StateVector {
    pub fn to_array(self) -> [f32; 6] {
        [
            self.arousal,
            self.valence,
            self.stability,
            self.load,
            self.social_drain,
            self.intensity,
        ]
    }

    pub fn from_array(a: [f32; 6]) -> Self {
        Self {
            arousal: a[0],
            valence: a[1],
            stability: a[2],
            load: a[3],
            social_drain: a[4],
            intensity: a[5],
        }
    }

    /// Overlay the present, finite fields of `patch` and clamp everything.
    pub fn merged(self, patch: &StatePatch) -> Self {
        let pick = |next: Option<f32>, base: f32| match next {
            Some(v) if v.is_finite() => clamp01(v),
            _ => clamp01(base),
        };
        Self {
            arousal: pick(patch.arousal, self.arousal),
            valence: pick(patch.valence, self.valence),
            stability: pick(patch.stability, self.stability),
            load: pick(patch.load, self.load),
            social_drain: pick(patch.social_drain, self.social_drain),
            intensity: pick(patch.intensity, self.intensity),
        }
    }

    /// Per-field `a + (b - a) * t`.
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let (a, b) = (a.to_array(), b.to_array());
        Self::from_array(std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t))
    }
}

/// Partial state update; absent fields keep their current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    pub arousal: Option<f32>,
    pub valence: Option<f32>,
    pub stability: Option<f32>,
    pub load: Option<f32>,
    pub social_drain: Option<f32>,
    pub intensity: Option<f32>,
}

/// Linear interpolation from `start` to `end` over `duration_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub start: StateVector,
    pub end: StateVector,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
}

impl Transition {
    pub fn new(start: StateVector, end: StateVector, duration_ms: f32) -> Self {
        Self {
            start,
            end,
            duration_ms,
            elapsed_ms: 0.0,
        }
    }

    pub fn ratio(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        clamp01(self.elapsed_ms / self.duration_ms)
    }

    pub fn is_complete(&self) -> bool {
        self.ratio() >= 1.0
    }

    /// Interpolated value at the current elapsed time. Exactly `end` once
    /// complete, exactly `start` at zero.
    pub fn sample(&self) -> StateVector {
        let t = self.ratio();
        if t >= 1.0 {
            self.end
        } else {
            StateVector::lerp(self.start, self.end, t)
        }
    }

    fn step(&mut self, dt_ms: f32) {
        self.elapsed_ms = (self.elapsed_ms + dt_ms).clamp(0.0, self.duration_ms);
    }
}

/// Owner of the session's state vector, transition and runtime overrides.
pub struct StateModel {
    state: StateVector,
    transition: Option<Transition>,
    mode: InteractionMode,
    paused: bool,
    interaction: InteractionConfig,
    overrides: RenderOverrides,
}

impl StateModel {
    pub fn new(ctx: &EngineContext) -> Self {
        Self {
            state: StateVector::default(),
            transition: None,
            mode: InteractionMode::default(),
            paused: false,
            interaction: ctx.settings.interaction.clamped(),
            overrides: RenderOverrides {
                point_size: None,
                bloom_enabled: ctx.settings.bloom.enabled,
            },
        }
    }

    pub fn state(&self) -> StateVector {
        self.state
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn interaction(&self) -> &InteractionConfig {
        &self.interaction
    }

    pub fn overrides(&self) -> RenderOverrides {
        self.overrides
    }

    /// Merge `patch` over the current state and move there over
    /// `transition_ms`. Replaces any transition already running.
    pub fn set_state(&mut self, patch: &StatePatch, transition_ms: f32) {
        let target = self.state.merged(patch);
        self.start_transition(target, transition_ms);
    }

    /// Move toward a preset, optionally overriding its intensity.
    pub fn set_preset(&mut self, preset: Preset, intensity: Option<f32>, transition_ms: f32) {
        let mut target = preset.state();
        if let Some(i) = intensity.filter(|i| i.is_finite()) {
            target.intensity = clamp01(i);
        }
        log::debug!("[state] preset {} ({} ms)", preset.name(), transition_ms);
        self.start_transition(target, transition_ms);
    }

    pub fn set_preset_by_name(
        &mut self,
        name: &str,
        intensity: Option<f32>,
        transition_ms: f32,
    ) -> Result<(), ControlError> {
        let preset = Preset::from_name(name).ok_or_else(|| ControlError::UnknownPreset(name.to_string()))?;
        self.set_preset(preset, intensity, transition_ms);
        Ok(())
    }

    fn start_transition(&mut self, target: StateVector, transition_ms: f32) {
        if !(transition_ms.is_finite() && transition_ms > 0.0) {
            self.state = target;
            self.transition = None;
            return;
        }
        self.transition = Some(Transition::new(self.state, target, transition_ms));
    }

    /// Advance the active transition by `dt_sec` and return the current state.
    pub fn advance(&mut self, dt_sec: f32) -> StateVector {
        let dt_ms = if dt_sec.is_finite() { dt_sec.max(0.0) * 1000.0 } else { 0.0 };
        if let Some(tr) = self.transition.as_mut() {
            tr.step(dt_ms);
            self.state = tr.sample();
            if tr.is_complete() {
                self.transition = None;
            }
        }
        self.state
    }

    /// Drop the in-flight transition, leaving the state where it is.
    pub fn cancel_transition(&mut self) {
        self.transition = None;
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }

    pub fn toggle_bloom(&mut self) {
        self.overrides.bloom_enabled = !self.overrides.bloom_enabled;
    }

    /// Validate and apply a `setConfig` write. Nothing changes on error.
    pub fn try_apply_config(&mut self, key: &str, value: &ConfigValue) -> Result<(), ControlError> {
        match validate_config(key, value)? {
            ConfigWrite::Bool(_, enabled) => self.overrides.bloom_enabled = enabled,
            ConfigWrite::Number(k, v) => {
                if self.interaction.get(k).is_some() {
                    self.interaction.set(k, v);
                } else if let Some((lo, hi)) = k.range() {
                    self.overrides.point_size = Some(v.clamp(lo, hi));
                }
            }
        }
        Ok(())
    }

    /// Boolean form of [`Self::try_apply_config`]; rejections are logged.
    pub fn apply_config_override(&mut self, key: &str, value: impl Into<ConfigValue>) -> bool {
        match self.try_apply_config(key, &value.into()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[state] rejected config override: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::OVERLOADED;

    fn model() -> StateModel {
        StateModel::new(&EngineContext::default())
    }

    #[test]
    fn immediate_preset_with_intensity_override() {
        let mut m = model();
        m.set_preset(Preset::Overloaded, Some(0.9), 0.0);
        let expected = StateVector {
            intensity: 0.9,
            ..OVERLOADED
        };
        assert_eq!(m.state(), expected);
        assert!(m.transition().is_none());
    }

    #[test]
    fn out_of_range_patch_clamps_single_field() {
        let mut m = model();
        let before = m.state();
        m.set_state(
            &StatePatch {
                arousal: Some(2.0),
                ..Default::default()
            },
            0.0,
        );
        let after = m.state();
        assert_eq!(after.arousal, 1.0);
        assert_eq!(after.valence, before.valence);
        assert_eq!(after.stability, before.stability);
        assert_eq!(after.load, before.load);
        assert_eq!(after.social_drain, before.social_drain);
        assert_eq!(after.intensity, before.intensity);
    }

    #[test]
    fn non_finite_patch_fields_are_ignored() {
        let mut m = model();
        let before = m.state();
        m.set_state(
            &StatePatch {
                valence: Some(f32::NAN),
                load: Some(f32::NEG_INFINITY),
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(m.state(), before);
    }

    #[test]
    fn transition_endpoints_are_exact() {
        let mut m = model();
        let start = m.state();
        m.set_preset(Preset::Happy, None, 400.0);
        assert_eq!(m.advance(0.0), start);
        let mid = m.advance(0.1);
        let expected = StateVector::lerp(start, Preset::Happy.state(), 0.25);
        for (a, b) in mid.to_array().iter().zip(expected.to_array()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(m.advance(1.0), Preset::Happy.state());
        assert!(m.transition().is_none());
    }

    #[test]
    fn new_call_replaces_running_transition_from_current_value() {
        let mut m = model();
        m.set_preset(Preset::Angry, None, 1000.0);
        let halfway = m.advance(0.5);
        m.set_preset(Preset::Sad, None, 1000.0);
        let tr = m.transition().copied().expect("transition");
        assert_eq!(tr.start, halfway);
        assert_eq!(tr.end, Preset::Sad.state());
        assert_eq!(tr.elapsed_ms, 0.0);
    }

    #[test]
    fn zero_duration_clears_in_flight_transition() {
        let mut m = model();
        m.set_preset(Preset::Angry, None, 1000.0);
        m.advance(0.2);
        m.set_state(
            &StatePatch {
                load: Some(0.1),
                ..Default::default()
            },
            0.0,
        );
        assert!(m.transition().is_none());
        assert_eq!(m.state().load, 0.1);
    }

    #[test]
    fn unknown_preset_name_is_rejected() {
        let mut m = model();
        let before = m.state();
        assert_eq!(
            m.set_preset_by_name("elated", None, 0.0),
            Err(ControlError::UnknownPreset("elated".into()))
        );
        assert_eq!(m.state(), before);
    }

    #[test]
    fn config_override_paths() {
        let mut m = model();
        assert!(m.apply_config_override("interaction.maxOffset", 9.0_f32));
        assert_eq!(m.interaction().max_offset, 1.5);
        assert!(m.apply_config_override("cloud.pointSize", 0.1_f32));
        assert_eq!(m.overrides().point_size, Some(0.8));
        assert!(m.apply_config_override("cloud.enableBloom", false));
        assert!(!m.overrides().bloom_enabled);
        assert!(!m.apply_config_override("cloud.enableBloom", 1.0_f32));
        assert!(!m.apply_config_override("renderer.backend", 1.0_f32));
    }
}
