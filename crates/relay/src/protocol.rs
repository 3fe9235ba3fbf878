//! Relay wire format.
//!
//! Every frame is a JSON object `{"type": <name>, "data": <payload>}`:
//! - `refresh` (out): ask the relay for the current authoritative state
//! - `pov` (in/out): `{heading, pitch, zoom}`
//! - `pano` (in/out): `{panoid}`
//! - `links` (out): `{links}`
//!
//! Inbound payloads are kept raw until the coordinator validates them, so a
//! malformed peer message is rejected by the component that owns the state.

use std::fmt;

use foundation::{Link, SceneId, ValidationError, Viewpoint};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MSG_REFRESH: &str = "refresh";
pub const MSG_POV: &str = "pov";
pub const MSG_PANO: &str = "pano";
pub const MSG_LINKS: &str = "links";

/// Frame sent from a node to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    Refresh {},
    Pov(Viewpoint),
    Pano { panoid: SceneId },
    Links { links: Vec<Link> },
}

impl OutboundMessage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Refresh {} => MSG_REFRESH,
            Self::Pov(_) => MSG_POV,
            Self::Pano { .. } => MSG_PANO,
            Self::Links { .. } => MSG_LINKS,
        }
    }
}

/// Frame delivered by the relay, payload not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Pov(PovPayload),
    Pano(PanoPayload),
    /// A well-formed frame this node has no use for (peers' `links`, etc).
    Ignored { name: String },
}

/// Raw `pov` payload as sent by the relay.
///
/// Numeric fields may arrive as JSON numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PovPayload {
    #[serde(default)]
    pub heading: Value,
    #[serde(default)]
    pub pitch: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub zoom: Value,
}

impl PovPayload {
    /// Validate into a viewpoint. A missing zoom takes `fallback_zoom`.
    pub fn validate(&self, fallback_zoom: u32) -> Result<Viewpoint, ValidationError> {
        let pov = Viewpoint {
            heading: finite_number(&self.heading, "heading")?,
            pitch: finite_number(&self.pitch, "pitch")?,
            zoom: zoom_level(&self.zoom, fallback_zoom)?,
        };
        pov.validate()?;
        Ok(pov)
    }
}

impl From<Viewpoint> for PovPayload {
    fn from(pov: Viewpoint) -> Self {
        Self {
            heading: Value::from(pov.heading),
            pitch: Value::from(pov.pitch),
            zoom: Value::from(pov.zoom),
        }
    }
}

/// Raw `pano` payload as sent by the relay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PanoPayload {
    #[serde(default)]
    pub panoid: Value,
}

impl PanoPayload {
    pub fn validate(&self) -> Result<SceneId, ValidationError> {
        match &self.panoid {
            Value::Null => Err(ValidationError::EmptySceneId),
            Value::String(s) => SceneId::parse(s.as_str()),
            other => Err(ValidationError::MalformedSceneId(other.to_string())),
        }
    }
}

impl From<SceneId> for PanoPayload {
    fn from(id: SceneId) -> Self {
        Self {
            panoid: Value::String(id.into()),
        }
    }
}

fn finite_number(v: &Value, field: &'static str) -> Result<f64, ValidationError> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::NonFinite { field }),
    }
}

fn zoom_level(v: &Value, fallback: u32) -> Result<u32, ValidationError> {
    let parsed = match v {
        Value::Null => return Ok(fallback),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|z| u32::try_from(z).ok())
        .ok_or_else(|| ValidationError::BadZoom(v.to_string()))
}

#[derive(Debug)]
pub enum DecodeError {
    Json(serde_json::Error),
    MissingType,
    /// The payload of a known message had the wrong shape.
    Payload {
        name: &'static str,
        source: serde_json::Error,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Json(err) => write!(f, "relay frame is not valid JSON: {err}"),
            DecodeError::MissingType => write!(f, "relay frame has no message type"),
            DecodeError::Payload { name, source } => {
                write!(f, "bad {name} payload: {source}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Json(err) => Some(err),
            DecodeError::Payload { source, .. } => Some(source),
            DecodeError::MissingType => None,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Value,
}

pub fn encode(msg: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

pub fn decode(text: &str) -> Result<InboundMessage, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::Json)?;
    let kind = envelope.kind.ok_or(DecodeError::MissingType)?;

    // A missing payload decodes the same as an empty object.
    let data = match envelope.data {
        Value::Null => Value::Object(Default::default()),
        data => data,
    };

    match kind.as_str() {
        MSG_POV => serde_json::from_value(data)
            .map(InboundMessage::Pov)
            .map_err(|source| DecodeError::Payload {
                name: MSG_POV,
                source,
            }),
        MSG_PANO => serde_json::from_value(data)
            .map(InboundMessage::Pano)
            .map_err(|source| DecodeError::Payload {
                name: MSG_PANO,
                source,
            }),
        _ => Ok(InboundMessage::Ignored { name: kind }),
    }
}
