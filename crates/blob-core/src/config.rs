//! Engine settings, the runtime-tunable interaction config and the
//! `setConfig` allow-list.
//!
//! Settings are loaded once (defaults or a TOML file) and wrapped in an
//! [`EngineContext`] that is handed by reference to every component
//! constructor. Only the keys listed in [`ConfigKey::ALL`] can change at
//! runtime, and every write goes through the key's range clamp.

use crate::constants::*;
use crate::error::{ControlError, SettingsError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Physical tunables of the pointer deformer. Every write is range-clamped.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub attract_strength: f32,
    pub attract_radius: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub max_offset: f32,
    pub dead_zone_ratio: f32,
    pub response_zone_ratio: f32,
    pub inner_radius: f32,
    pub peak_radius: f32,
    pub outer_radius: f32,
    pub stretch_strength: f32,
    pub stretch_max: f32,
    pub relax_speed: f32,
    pub hover_boost: f32,
    pub click_boost: f32,
    pub detail_noise: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            attract_strength: 0.9,
            attract_radius: 1.25,
            stiffness: 18.0,
            damping: 8.5,
            max_offset: 0.6,
            dead_zone_ratio: 0.22,
            response_zone_ratio: 1.1,
            inner_radius: 0.2,
            peak_radius: 0.65,
            outer_radius: 1.35,
            stretch_strength: 0.4,
            stretch_max: 0.52,
            relax_speed: 10.0,
            hover_boost: 1.7,
            click_boost: 1.8,
            detail_noise: 0.08,
        }
    }
}

impl InteractionConfig {
    /// Read a numeric field by key. Returns `None` for non-interaction keys.
    pub fn get(&self, key: ConfigKey) -> Option<f32> {
        let v = match key {
            ConfigKey::AttractStrength => self.attract_strength,
            ConfigKey::AttractRadius => self.attract_radius,
            ConfigKey::Stiffness => self.stiffness,
            ConfigKey::Damping => self.damping,
            ConfigKey::MaxOffset => self.max_offset,
            ConfigKey::DeadZoneRatio => self.dead_zone_ratio,
            ConfigKey::ResponseZoneRatio => self.response_zone_ratio,
            ConfigKey::InnerRadius => self.inner_radius,
            ConfigKey::PeakRadius => self.peak_radius,
            ConfigKey::OuterRadius => self.outer_radius,
            ConfigKey::StretchStrength => self.stretch_strength,
            ConfigKey::StretchMax => self.stretch_max,
            ConfigKey::RelaxSpeed => self.relax_speed,
            ConfigKey::HoverBoost => self.hover_boost,
            ConfigKey::ClickBoost => self.click_boost,
            ConfigKey::DetailNoise => self.detail_noise,
            ConfigKey::PointSize | ConfigKey::EnableBloom => return None,
        };
        Some(v)
    }

    fn field_mut(&mut self, key: ConfigKey) -> Option<&mut f32> {
        let f = match key {
            ConfigKey::AttractStrength => &mut self.attract_strength,
            ConfigKey::AttractRadius => &mut self.attract_radius,
            ConfigKey::Stiffness => &mut self.stiffness,
            ConfigKey::Damping => &mut self.damping,
            ConfigKey::MaxOffset => &mut self.max_offset,
            ConfigKey::DeadZoneRatio => &mut self.dead_zone_ratio,
            ConfigKey::ResponseZoneRatio => &mut self.response_zone_ratio,
            ConfigKey::InnerRadius => &mut self.inner_radius,
            ConfigKey::PeakRadius => &mut self.peak_radius,
            ConfigKey::OuterRadius => &mut self.outer_radius,
            ConfigKey::StretchStrength => &mut self.stretch_strength,
            ConfigKey::StretchMax => &mut self.stretch_max,
            ConfigKey::RelaxSpeed => &mut self.relax_speed,
            ConfigKey::HoverBoost => &mut self.hover_boost,
            ConfigKey::ClickBoost => &mut self.click_boost,
            ConfigKey::DetailNoise => &mut self.detail_noise,
            ConfigKey::PointSize | ConfigKey::EnableBloom => return None,
        };
        Some(f)
    }

    /// Clamp `value` into the key's range and store it.
    ///
    /// Returns false (and writes nothing) for non-interaction keys or
    /// non-finite values.
    pub fn set(&mut self, key: ConfigKey, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        let Some((lo, hi)) = key.range() else {
            return false;
        };
        match self.field_mut(key) {
            Some(field) => {
                *field = value.clamp(lo, hi);
                true
            }
            None => false,
        }
    }

    /// Copy with every field clamped into its range; non-finite fields fall
    /// back to the default.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let mut out = self;
        for key in ConfigKey::ALL {
            let (Some(v), Some(d)) = (self.get(key), defaults.get(key)) else {
                continue;
            };
            if !out.set(key, v) {
                out.set(key, d);
            }
        }
        out
    }
}

/// Every key accepted by `setConfig`. Anything else is rejected untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    PointSize,
    EnableBloom,
    AttractStrength,
    AttractRadius,
    Stiffness,
    Damping,
    MaxOffset,
    DeadZoneRatio,
    ResponseZoneRatio,
    InnerRadius,
    PeakRadius,
    OuterRadius,
    StretchStrength,
    StretchMax,
    RelaxSpeed,
    HoverBoost,
    ClickBoost,
    DetailNoise,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 18] = [
        ConfigKey::PointSize,
        ConfigKey::EnableBloom,
        ConfigKey::AttractStrength,
        ConfigKey::AttractRadius,
        ConfigKey::Stiffness,
        ConfigKey::Damping,
        ConfigKey::MaxOffset,
        ConfigKey::DeadZoneRatio,
        ConfigKey::ResponseZoneRatio,
        ConfigKey::InnerRadius,
        ConfigKey::PeakRadius,
        ConfigKey::OuterRadius,
        ConfigKey::StretchStrength,
        ConfigKey::StretchMax,
        ConfigKey::RelaxSpeed,
        ConfigKey::HoverBoost,
        ConfigKey::ClickBoost,
        ConfigKey::DetailNoise,
    ];

    /// Wire name used by `setConfig`.
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::PointSize => "cloud.pointSize",
            ConfigKey::EnableBloom => "cloud.enableBloom",
            ConfigKey::AttractStrength => "interaction.attractStrength",
            ConfigKey::AttractRadius => "interaction.attractRadius",
            ConfigKey::Stiffness => "interaction.stiffness",
            ConfigKey::Damping => "interaction.damping",
            ConfigKey::MaxOffset => "interaction.maxOffset",
            ConfigKey::DeadZoneRatio => "interaction.deadZoneRatio",
            ConfigKey::ResponseZoneRatio => "interaction.responseZoneRatio",
            ConfigKey::InnerRadius => "interaction.innerRadius",
            ConfigKey::PeakRadius => "interaction.peakRadius",
            ConfigKey::OuterRadius => "interaction.outerRadius",
            ConfigKey::StretchStrength => "interaction.stretchStrength",
            ConfigKey::StretchMax => "interaction.stretchMax",
            ConfigKey::RelaxSpeed => "interaction.relaxSpeed",
            ConfigKey::HoverBoost => "interaction.hoverBoost",
            ConfigKey::ClickBoost => "interaction.clickBoost",
            ConfigKey::DetailNoise => "interaction.detailNoise",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == "cloud.enableBloomByDefault" {
            return Some(ConfigKey::EnableBloom);
        }
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Inclusive numeric range, or `None` for boolean keys.
    pub fn range(self) -> Option<(f32, f32)> {
        let r = match self {
            ConfigKey::EnableBloom => return None,
            ConfigKey::PointSize => (0.8, 6.0),
            ConfigKey::AttractStrength => (0.0, 3.0),
            ConfigKey::AttractRadius => (0.05, 3.0),
            ConfigKey::Stiffness => (1.0, 60.0),
            ConfigKey::Damping => (0.5, 30.0),
            ConfigKey::MaxOffset => (0.0, 1.5),
            ConfigKey::DeadZoneRatio => (0.0, 0.95),
            ConfigKey::ResponseZoneRatio => (0.05, 4.0),
            ConfigKey::InnerRadius => (0.001, 3.0),
            ConfigKey::PeakRadius => (0.002, 3.0),
            ConfigKey::OuterRadius => (0.003, 4.0),
            ConfigKey::StretchStrength => (0.0, 2.0),
            ConfigKey::StretchMax => (0.0, 1.0),
            ConfigKey::RelaxSpeed => (0.5, 40.0),
            ConfigKey::HoverBoost => (1.0, 3.0),
            ConfigKey::ClickBoost => (1.0, 3.0),
            ConfigKey::DetailNoise => (0.0, 0.5),
        };
        Some(r)
    }
}

/// Untyped value as it arrives from a control message.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Number(f64),
    Bool(bool),
    Other,
}

impl From<&serde_json::Value> for ConfigValue {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => ConfigValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(ConfigValue::Other, ConfigValue::Number),
            _ => ConfigValue::Other,
        }
    }
}

impl From<f32> for ConfigValue {
    fn from(v: f32) -> Self {
        ConfigValue::Number(v as f64)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

/// A config write that passed allow-list and type validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigWrite {
    Number(ConfigKey, f32),
    Bool(ConfigKey, bool),
}

/// Check `key` against the allow-list and `value` against the key's type.
///
/// Range is not checked here: finite numbers are clamped when written.
pub fn validate_config(key: &str, value: &ConfigValue) -> Result<ConfigWrite, ControlError> {
    let parsed = ConfigKey::from_name(key).ok_or_else(|| ControlError::KeyNotAllowed(key.to_string()))?;
    match (parsed.range(), value) {
        (None, ConfigValue::Bool(b)) => Ok(ConfigWrite::Bool(parsed, *b)),
        (None, _) => Err(ControlError::WrongValueType {
            key: key.to_string(),
            expected: "boolean",
        }),
        (Some(_), ConfigValue::Number(n)) => {
            let v = *n as f32;
            if n.is_finite() && v.is_finite() {
                Ok(ConfigWrite::Number(parsed, v))
            } else {
                Err(ControlError::NonFinite(key.to_string()))
            }
        }
        (Some(_), _) => Err(ControlError::WrongValueType {
            key: key.to_string(),
            expected: "number",
        }),
    }
}

/// Render-side values that `setConfig` may override.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOverrides {
    pub point_size: Option<f32>,
    pub bloom_enabled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShapeSettings {
    pub radius: f32,
    pub point_size: f32,
    pub background: [f32; 3],
    pub seed: u64,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self {
            radius: SHAPE_RADIUS,
            point_size: SHAPE_POINT_SIZE,
            background: BACKGROUND_RGB,
            seed: DEFAULT_SHAPE_SEED,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: BLOOM_ENABLED,
            strength: BLOOM_STRENGTH,
            radius: BLOOM_RADIUS,
            threshold: BLOOM_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub z: f32,
    pub fovy_deg: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            z: CAMERA_Z,
            fovy_deg: CAMERA_FOVY_DEG,
        }
    }
}

/// Frame-loop and degrade-ladder tunables.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GovernorSettings {
    pub max_dt_sec: f32,
    pub fps_threshold: f32,
    pub fps_window: usize,
    pub full_elements: u32,
    pub mid_elements: u32,
    pub fallback_elements: u32,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            max_dt_sec: MAX_FRAME_DT_SEC,
            fps_threshold: DEGRADE_FPS_THRESHOLD,
            fps_window: FPS_WINDOW,
            full_elements: FULL_ELEMENT_COUNT,
            mid_elements: MID_ELEMENT_COUNT,
            fallback_elements: FALLBACK_ELEMENT_COUNT,
        }
    }
}

/// Everything the engine reads at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub shape: ShapeSettings,
    pub bloom: BloomSettings,
    pub camera: CameraSettings,
    pub interaction: InteractionConfig,
    pub governor: GovernorSettings,
}

impl EngineSettings {
    pub fn from_toml_str(src: &str) -> Result<Self, SettingsError> {
        let raw: EngineSettings = toml::from_str(src)?;
        Ok(raw.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        log::info!("[config] loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Clamp loaded values so no file can push the engine outside its ranges.
    pub fn sanitized(mut self) -> Self {
        self.interaction = self.interaction.clamped();
        if !(self.shape.radius.is_finite() && self.shape.radius > 0.0) {
            self.shape.radius = SHAPE_RADIUS;
        }
        let g = &mut self.governor;
        if !(g.max_dt_sec.is_finite() && g.max_dt_sec > 0.0) {
            g.max_dt_sec = MAX_FRAME_DT_SEC;
        }
        if !(g.fps_threshold.is_finite() && g.fps_threshold >= 0.0) {
            g.fps_threshold = DEGRADE_FPS_THRESHOLD;
        }
        g.fps_window = g.fps_window.max(1);
        g.full_elements = g.full_elements.max(1);
        g.mid_elements = g.mid_elements.clamp(1, g.full_elements);
        g.fallback_elements = g.fallback_elements.clamp(1, g.mid_elements);
        self
    }
}

/// Session-wide handle passed by reference into component constructors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineContext {
    pub settings: EngineSettings,
}

impl EngineContext {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings: settings.sanitized(),
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_round_trips_by_name() {
        for key in ConfigKey::ALL {
            assert_eq!(ConfigKey::from_name(key.name()), Some(key));
        }
        assert_eq!(ConfigKey::from_name("interaction.gravity"), None);
        assert_eq!(ConfigKey::from_name(""), None);
        assert_eq!(
            ConfigKey::from_name("cloud.enableBloomByDefault"),
            Some(ConfigKey::EnableBloom)
        );
    }

    #[test]
    fn set_clamps_into_range() {
        let mut cfg = InteractionConfig::default();
        assert!(cfg.set(ConfigKey::Stiffness, 1000.0));
        assert_eq!(cfg.stiffness, 60.0);
        assert!(cfg.set(ConfigKey::Damping, -4.0));
        assert_eq!(cfg.damping, 0.5);
        assert!(!cfg.set(ConfigKey::Damping, f32::NAN));
        assert_eq!(cfg.damping, 0.5);
        assert!(!cfg.set(ConfigKey::PointSize, 2.0));
    }

    #[test]
    fn validate_rejects_wrong_types() {
        assert!(matches!(
            validate_config("cloud.enableBloom", &ConfigValue::Number(1.0)),
            Err(ControlError::WrongValueType { .. })
        ));
        assert!(matches!(
            validate_config("interaction.stiffness", &ConfigValue::Bool(true)),
            Err(ControlError::WrongValueType { .. })
        ));
        assert!(matches!(
            validate_config("interaction.stiffness", &ConfigValue::Number(f64::INFINITY)),
            Err(ControlError::NonFinite(_))
        ));
        assert_eq!(
            validate_config("interaction.stiffness", &ConfigValue::Number(20.0)),
            Ok(ConfigWrite::Number(ConfigKey::Stiffness, 20.0))
        );
    }

    #[test]
    fn toml_overrides_are_clamped() {
        let src = r#"
            [interaction]
            stiffness = 500.0
            dead_zone_ratio = 0.3

            [governor]
            fps_threshold = 30.0
            mid_elements = 9000
        "#;
        let s = EngineSettings::from_toml_str(src).expect("parse");
        assert_eq!(s.interaction.stiffness, 60.0);
        assert_eq!(s.interaction.dead_zone_ratio, 0.3);
        assert_eq!(s.interaction.damping, InteractionConfig::default().damping);
        assert_eq!(s.governor.fps_threshold, 30.0);
        assert_eq!(s.governor.mid_elements, s.governor.full_elements);

        for bad in ["nan", "inf", "-5.0"] {
            let s = EngineSettings::from_toml_str(&format!("[governor]\nfps_threshold = {bad}\n")).expect("parse");
            assert_eq!(s.governor.fps_threshold, crate::constants::DEGRADE_FPS_THRESHOLD, "{bad}");
        }
    }
}
