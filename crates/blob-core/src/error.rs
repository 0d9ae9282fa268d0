//! Error types shared by the engine and its hosts.

use thiserror::Error;

/// Reasons a control message or config override is rejected.
///
/// Rejection never mutates engine state; callers only use these to log or
/// surface the problem to the host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("malformed control message: {0}")]
    Malformed(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    #[error("config key not allowed: {0}")]
    KeyNotAllowed(String),

    #[error("config key {key} expects a {expected} value")]
    WrongValueType { key: String, expected: &'static str },

    #[error("config key {0} received a non-finite number")]
    NonFinite(String),
}

/// Failures coming from a `ShapeRenderer`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A required graphics capability is missing; the loop never starts.
    #[error("renderer initialization failed: {0}")]
    Init(String),

    /// A frame could not be produced; rendering halts until re-initialized.
    #[error("frame failed: {0}")]
    Frame(String),
}

/// Failures while loading `EngineSettings` from disk.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}
