//! JSON control messages and host keyboard commands.
//!
//! Wire format is an envelope `{type, payload, v?, ts?, reqId?}`; fields
//! other than `type` and `payload` are ignored. Parsing is all-or-nothing:
//! a message either decodes completely or is rejected before anything is
//! applied.

use crate::config::ConfigValue;
use crate::constants::*;
use crate::deformer::InteractionMode;
use crate::error::ControlError;
use crate::presets::Preset;
use crate::state::{StateModel, StatePatch};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetStatePayload {
    state: StatePatch,
    transition_ms: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetPresetPayload {
    name: String,
    intensity: Option<f32>,
    transition_ms: Option<f32>,
}

#[derive(Deserialize)]
struct SetModePayload {
    mode: InteractionMode,
}

#[derive(Deserialize)]
struct SetConfigPayload {
    key: String,
    value: serde_json::Value,
}

/// A decoded control message.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlMessage {
    SetState {
        patch: StatePatch,
        transition_ms: Option<f32>,
    },
    SetPreset {
        name: String,
        intensity: Option<f32>,
        transition_ms: Option<f32>,
    },
    SetInteractionMode(InteractionMode),
    SetConfig {
        key: String,
        value: ConfigValue,
    },
}

fn payload<T: DeserializeOwned>(kind: &str, value: serde_json::Value) -> Result<T, ControlError> {
    serde_json::from_value(value).map_err(|e| ControlError::Malformed(format!("{kind}: {e}")))
}

impl ControlMessage {
    pub fn parse(raw: &str) -> Result<Self, ControlError> {
        let env: Envelope = serde_json::from_str(raw).map_err(|e| ControlError::Malformed(e.to_string()))?;
        let kind = env.kind.as_str();
        let msg = match kind {
            "setState" | "set_state" => {
                let p: SetStatePayload = payload(kind, env.payload)?;
                ControlMessage::SetState {
                    patch: p.state,
                    transition_ms: p.transition_ms,
                }
            }
            "setPreset" | "set_preset" => {
                let p: SetPresetPayload = payload(kind, env.payload)?;
                ControlMessage::SetPreset {
                    name: p.name,
                    intensity: p.intensity,
                    transition_ms: p.transition_ms,
                }
            }
            "setInteractionMode" | "set_interaction_mode" => {
                let p: SetModePayload = payload(kind, env.payload)?;
                ControlMessage::SetInteractionMode(p.mode)
            }
            "setConfig" | "set_config" => {
                let p: SetConfigPayload = payload(kind, env.payload)?;
                ControlMessage::SetConfig {
                    key: p.key,
                    value: ConfigValue::from(&p.value),
                }
            }
            other => {
                return Err(ControlError::Malformed(format!("unsupported message type: {other}")));
            }
        };
        Ok(msg)
    }

    /// Apply to `model`. Validation happens before any write, so a rejected
    /// message leaves the model exactly as it was.
    pub fn apply(&self, model: &mut StateModel) -> Result<(), ControlError> {
        match self {
            ControlMessage::SetState { patch, transition_ms } => {
                model.set_state(patch, transition_ms.unwrap_or(DEFAULT_STATE_TRANSITION_MS));
            }
            ControlMessage::SetPreset {
                name,
                intensity,
                transition_ms,
            } => {
                model.set_preset_by_name(
                    name,
                    *intensity,
                    transition_ms.unwrap_or(DEFAULT_PRESET_TRANSITION_MS),
                )?;
            }
            ControlMessage::SetInteractionMode(mode) => {
                model.set_interaction_mode(*mode);
                log::info!("[control] interaction mode {}", mode.name());
            }
            ControlMessage::SetConfig { key, value } => {
                model.try_apply_config(key, value)?;
                log::debug!("[control] config {} = {:?}", key, value);
            }
        }
        Ok(())
    }
}

/// Keyboard shortcuts shared by the native and web hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    Preset(Preset),
    TogglePause,
    ToggleGlow,
    CycleMode,
}

impl KeyCommand {
    /// Map a key name (`KeyboardEvent.key` style) to a command.
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(p) = Preset::for_digit(key) {
            return Some(KeyCommand::Preset(p));
        }
        match key {
            " " | "Space" => Some(KeyCommand::TogglePause),
            "b" | "B" => Some(KeyCommand::ToggleGlow),
            "m" | "M" => Some(KeyCommand::CycleMode),
            _ => None,
        }
    }

    pub fn apply(self, model: &mut StateModel) {
        match self {
            KeyCommand::Preset(p) => model.set_preset(p, None, DEFAULT_PRESET_TRANSITION_MS),
            KeyCommand::TogglePause => model.toggle_paused(),
            KeyCommand::ToggleGlow => model.toggle_bloom(),
            KeyCommand::CycleMode => {
                let next = model.mode().next();
                model.set_interaction_mode(next);
                log::info!("[control] interaction mode {}", next.name());
            }
        }
    }
}
