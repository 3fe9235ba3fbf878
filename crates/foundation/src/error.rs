use std::fmt;

use crate::fov::RenderMode;

/// A malformed viewpoint, scene id or field of view.
///
/// Raised for values arriving from either the relay or the view surface.
/// These are never fatal: the offending update is logged and dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A numeric field was missing, non-numeric, or not finite.
    NonFinite { field: &'static str },
    /// A zoom level that is negative or not an integer.
    BadZoom(String),
    /// Scene identifiers must be non-empty tokens.
    EmptySceneId,
    /// Scene identifiers must not contain whitespace or control characters.
    MalformedSceneId(String),
    /// Field of view components must be finite and positive.
    BadFov { hfov: f64, vfov: f64 },
    /// A viewport with a zero dimension has no aspect ratio.
    EmptyViewport { width: u32, height: u32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonFinite { field } => {
                write!(f, "{field} is not a finite number")
            }
            ValidationError::BadZoom(raw) => write!(f, "bad zoom level: {raw}"),
            ValidationError::EmptySceneId => write!(f, "scene id is empty"),
            ValidationError::MalformedSceneId(id) => write!(f, "malformed scene id: {id:?}"),
            ValidationError::BadFov { hfov, vfov } => {
                write!(f, "bad field of view: hfov={hfov} vfov={vfov}")
            }
            ValidationError::EmptyViewport { width, height } => {
                write!(f, "viewport has no area: {width}x{height}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Bad startup configuration. Fatal: initialization must halt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownRenderMode(String),
    ZoomOutOfRange { mode: RenderMode, zoom: u32, max: u32 },
    /// Offset fractions must be finite.
    BadOffset { axis: &'static str },
    /// No relay endpoint was provided for an online node.
    MissingRelayUrl,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownRenderMode(mode) => {
                write!(f, "unknown render mode: {mode:?}")
            }
            ConfigurationError::ZoomOutOfRange { mode, zoom, max } => {
                write!(f, "zoom {zoom} out of range for {mode} (max {max})")
            }
            ConfigurationError::BadOffset { axis } => {
                write!(f, "{axis} offset fraction is not a finite number")
            }
            ConfigurationError::MissingRelayUrl => write!(f, "no relay url configured"),
        }
    }
}

impl std::error::Error for ConfigurationError {}
