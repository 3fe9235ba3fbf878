use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Camera orientation within a panorama.
///
/// Heading is circular but never normalized here: comparisons are exact, so
/// producers are expected to deliver normalized values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub heading: f64,
    pub pitch: f64,
    pub zoom: u32,
}

impl Viewpoint {
    pub fn new(heading: f64, pitch: f64, zoom: u32) -> Self {
        Self {
            heading,
            pitch,
            zoom,
        }
    }

    /// Exact heading/pitch equality. Zoom is not part of view identity.
    pub fn same_direction(&self, other: &Viewpoint) -> bool {
        self.heading == other.heading && self.pitch == other.pitch
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.heading.is_finite() {
            return Err(ValidationError::NonFinite { field: "heading" });
        }
        if !self.pitch.is_finite() {
            return Err(ValidationError::NonFinite { field: "pitch" });
        }
        Ok(())
    }
}

impl fmt::Display for Viewpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heading={:.3} pitch={:.3} zoom={}",
            self.heading, self.pitch, self.zoom
        )
    }
}

/// Opaque panorama identifier. Equality is string identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SceneId(String);

impl SceneId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::EmptySceneId);
        }
        if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::MalformedSceneId(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SceneId {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<SceneId> for String {
    fn from(id: SceneId) -> Self {
        id.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A navigable neighbor of the current scene.
///
/// Passed through untouched; the sync layer never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(pub serde_json::Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_ignores_zoom() {
        let a = Viewpoint::new(10.0, 5.0, 1);
        let b = Viewpoint::new(10.0, 5.0, 3);
        assert!(a.same_direction(&b));
        assert!(!a.same_direction(&Viewpoint::new(10.0, 5.5, 1)));
    }

    #[test]
    fn heading_is_not_wrapped() {
        let a = Viewpoint::new(0.0, 0.0, 0);
        let b = Viewpoint::new(360.0, 0.0, 0);
        assert!(!a.same_direction(&b));
    }

    #[test]
    fn non_finite_viewpoint_rejected() {
        assert_eq!(
            Viewpoint::new(f64::NAN, 0.0, 0).validate(),
            Err(ValidationError::NonFinite { field: "heading" })
        );
        assert_eq!(
            Viewpoint::new(0.0, f64::NEG_INFINITY, 0).validate(),
            Err(ValidationError::NonFinite { field: "pitch" })
        );
        assert!(Viewpoint::new(359.9, -90.0, 4).validate().is_ok());
    }

    #[test]
    fn scene_id_grammar() {
        assert_eq!(SceneId::parse("").unwrap_err(), ValidationError::EmptySceneId);
        assert!(matches!(
            SceneId::parse("abc def"),
            Err(ValidationError::MalformedSceneId(_))
        ));
        let id = SceneId::parse("F:-gVtvWovRsQ/VTtVQmFfDfI").unwrap();
        assert_eq!(id.as_str(), "F:-gVtvWovRsQ/VTtVQmFfDfI");
    }

    #[test]
    fn scene_id_rejected_during_deserialize() {
        assert!(serde_json::from_str::<SceneId>("\"\"").is_err());
        let id: SceneId = serde_json::from_str("\"pano-1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"pano-1\"");
    }
}
