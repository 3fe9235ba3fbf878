//! Node configuration.
//!
//! One [`NodeConfig`] is loaded per display node and split into the pieces
//! each component needs: the coordinator gets a [`SyncConfig`], the surface
//! wiring gets a [`SurfaceConfig`].

use std::fmt;
use std::str::FromStr;

use foundation::{ConfigurationError, RenderMode, hfov_for};
use serde::{Deserialize, Serialize};

/// Which directions of view traffic this node participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Forwards local surface changes to the relay.
    Source,
    /// Applies relay changes to the local surface.
    #[default]
    Sink,
    Both,
    None,
}

impl NodeRole {
    pub fn from_flags(send: bool, receive: bool) -> Self {
        match (send, receive) {
            (true, true) => Self::Both,
            (true, false) => Self::Source,
            (false, true) => Self::Sink,
            (false, false) => Self::None,
        }
    }

    pub fn sends(self) -> bool {
        matches!(self, Self::Source | Self::Both)
    }

    pub fn receives(self) -> bool {
        matches!(self, Self::Sink | Self::Both)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Sink => "sink",
            Self::Both => "both",
            Self::None => "none",
        })
    }
}

/// Display size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Viewport {
    type Err = String;

    /// Parses `WIDTHxHEIGHT`, e.g. `1080x1920`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
        let height = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
        Ok(Self { width, height })
    }
}

/// What the sync coordinator needs to know about its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    pub role: NodeRole,
    /// Horizontal position in the wall, in screen widths from the center.
    pub yaw_offset: f64,
    /// Vertical position in the wall, in screen heights from the center.
    pub pitch_offset: f64,
    /// Zoom substituted when the relay omits it.
    pub zoom: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::Sink,
            yaw_offset: 0.0,
            pitch_offset: 0.0,
            zoom: 3,
        }
    }
}

/// What the surface wiring needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub render_mode: RenderMode,
    pub zoom: u32,
    /// Keep the surface's neighbor-link arrows visible.
    pub show_links: bool,
    /// Report neighbor links to the relay.
    pub link_capture: bool,
}

/// Full per-node configuration as loaded from file and command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeConfig {
    pub relay_url: Option<String>,
    pub render_mode: String,
    pub zoom: u32,
    pub yaw_offset: f64,
    pub pitch_offset: f64,
    pub send: bool,
    pub receive: bool,
    pub show_links: bool,
    pub link_capture: bool,
    pub viewport: Viewport,
    pub debug: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            render_mode: RenderMode::Webgl.as_str().to_string(),
            zoom: 3,
            yaw_offset: 0.0,
            pitch_offset: 0.0,
            send: false,
            receive: true,
            show_links: false,
            link_capture: false,
            viewport: Viewport::default(),
            debug: false,
        }
    }
}

impl NodeConfig {
    pub fn role(&self) -> NodeRole {
        NodeRole::from_flags(self.send, self.receive)
    }

    pub fn render_mode(&self) -> Result<RenderMode, ConfigurationError> {
        self.render_mode.parse()
    }

    /// Check everything that must hold before a node may start.
    ///
    /// Returns the horizontal FOV for the configured mode and zoom.
    pub fn validate(&self) -> Result<f64, ConfigurationError> {
        if !self.yaw_offset.is_finite() {
            return Err(ConfigurationError::BadOffset { axis: "yaw" });
        }
        if !self.pitch_offset.is_finite() {
            return Err(ConfigurationError::BadOffset { axis: "pitch" });
        }
        hfov_for(self.render_mode()?, self.zoom)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            role: self.role(),
            yaw_offset: self.yaw_offset,
            pitch_offset: self.pitch_offset,
            zoom: self.zoom,
        }
    }

    pub fn surface_config(&self) -> Result<SurfaceConfig, ConfigurationError> {
        Ok(SurfaceConfig {
            render_mode: self.render_mode()?,
            zoom: self.zoom,
            show_links: self.show_links,
            link_capture: self.link_capture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn role_flags() {
        assert_eq!(NodeRole::from_flags(true, true), NodeRole::Both);
        assert_eq!(NodeRole::from_flags(true, false), NodeRole::Source);
        assert_eq!(NodeRole::from_flags(false, true), NodeRole::Sink);
        assert_eq!(NodeRole::from_flags(false, false), NodeRole::None);

        assert!(NodeRole::Both.sends() && NodeRole::Both.receives());
        assert!(!NodeRole::Sink.sends());
        assert!(!NodeRole::Source.receives());
        assert!(!NodeRole::None.sends() && !NodeRole::None.receives());
    }

    #[test]
    fn parses_viewport() {
        assert_eq!("1080x1920".parse::<Viewport>(), Ok(Viewport::new(1080, 1920)));
        assert_eq!("640 X 480".parse::<Viewport>(), Ok(Viewport::new(640, 480)));
        assert!("1080".parse::<Viewport>().is_err());
        assert!("axb".parse::<Viewport>().is_err());
    }

    #[test]
    fn loads_camel_case_json_with_defaults() {
        let cfg: NodeConfig = serde_json::from_str(
            r#"{"renderMode":"html4","zoom":1,"yawOffset":-1.0,"send":true,
                "viewport":{"width":1080,"height":1920}}"#,
        )
        .unwrap();
        assert_eq!(cfg.render_mode().unwrap(), RenderMode::Html4);
        assert_eq!(cfg.role(), NodeRole::Both);
        assert_eq!(cfg.pitch_offset, 0.0);
        assert_eq!(cfg.validate(), Ok(90.0));

        let sync = cfg.sync_config();
        assert_eq!(sync.yaw_offset, -1.0);
        assert_eq!(sync.zoom, 1);
        assert_eq!(
            cfg.surface_config().unwrap(),
            SurfaceConfig {
                render_mode: RenderMode::Html4,
                zoom: 1,
                show_links: false,
                link_capture: false,
            }
        );
    }

    #[test]
    fn bad_config_halts_validation() {
        let cfg = NodeConfig {
            render_mode: "canvas".to_string(),
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigurationError::UnknownRenderMode("canvas".to_string()))
        );

        let cfg = NodeConfig {
            zoom: 9,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::ZoomOutOfRange { zoom: 9, .. })
        ));

        let cfg = NodeConfig {
            pitch_offset: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigurationError::BadOffset { axis: "pitch" })
        );
    }
}
