//! Headless view surface driven from the terminal.
//!
//! Stands in for the panorama widget: applied viewpoints and scenes are
//! logged, and operator commands on stdin become surface change
//! notifications, the way a viewer dragging the panorama would.
//!
//! Commands:
//! - `pov <heading> <pitch> [zoom]`
//! - `pano <id>`
//! - `links <json array>`
//! - `resize <width> <height>` or `resize <W>x<H>`
//! - `status`

use foundation::{Link, RenderMode, SceneId, Viewpoint};
use runtime::EventBus;
use tracing::{info, warn};
use viewsync::{SurfaceEvent, ViewSurface, Viewport};

#[derive(Debug)]
pub struct ConsoleSurface {
    pov: Option<Viewpoint>,
    scene: Option<SceneId>,
    links: Vec<Link>,
    viewport: Viewport,
    render_mode: RenderMode,
    events: EventBus<SurfaceEvent>,
}

impl ConsoleSurface {
    /// A new surface reports ready as its first event.
    pub fn new(viewport: Viewport) -> Self {
        let mut events = EventBus::new();
        events.emit(SurfaceEvent::Ready);
        Self {
            pov: None,
            scene: None,
            links: Vec::new(),
            viewport,
            render_mode: RenderMode::default(),
            events,
        }
    }

    /// Notifications raised since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        self.events.drain()
    }

    pub fn command(&mut self, line: &str) -> Result<(), String> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match cmd {
            "" => Ok(()),
            "pov" => {
                let parts: Vec<&str> = rest.split_whitespace().collect();
                let (heading, pitch, zoom) = match parts.as_slice() {
                    [h, p] => (*h, *p, None),
                    [h, p, z] => (*h, *p, Some(*z)),
                    _ => return Err("usage: pov <heading> <pitch> [zoom]".to_string()),
                };
                let heading = heading.parse().map_err(|e| format!("bad heading: {e}"))?;
                let pitch = pitch.parse().map_err(|e| format!("bad pitch: {e}"))?;
                let zoom = match zoom {
                    Some(z) => z.parse().map_err(|e| format!("bad zoom: {e}"))?,
                    None => self.pov.map_or(0, |p| p.zoom),
                };
                let pov = Viewpoint::new(heading, pitch, zoom);
                self.pov = Some(pov);
                self.events.emit(SurfaceEvent::PovChanged(pov));
                Ok(())
            }
            "pano" => {
                if rest.is_empty() {
                    return Err("usage: pano <id>".to_string());
                }
                // Reported raw: validation belongs to the listener.
                self.scene = SceneId::parse(rest).ok();
                self.events.emit(SurfaceEvent::SceneChanged(rest.to_string()));
                Ok(())
            }
            "links" => {
                self.links =
                    serde_json::from_str(rest).map_err(|e| format!("bad links json: {e}"))?;
                self.events.emit(SurfaceEvent::LinksChanged(self.links()));
                Ok(())
            }
            "resize" => {
                let viewport = match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                    [w, h] => format!("{w}x{h}").parse::<Viewport>()?,
                    [wh] => wh.parse::<Viewport>()?,
                    _ => return Err("usage: resize <width> <height>".to_string()),
                };
                self.viewport = viewport;
                self.events.emit(SurfaceEvent::SizeChanged(viewport));
                Ok(())
            }
            "status" => {
                info!(
                    pov = ?self.pov,
                    scene = ?self.scene,
                    links = self.links.len(),
                    viewport = %self.viewport,
                    mode = %self.render_mode,
                    "surface status"
                );
                Ok(())
            }
            other => Err(format!("unknown command {other:?}")),
        }
    }
}

impl ViewSurface for ConsoleSurface {
    fn pov(&self) -> Option<Viewpoint> {
        self.pov
    }

    fn set_pov(&mut self, pov: Viewpoint) {
        info!(%pov, "show pov");
        self.pov = Some(pov);
        self.events.emit(SurfaceEvent::PovChanged(pov));
    }

    fn scene(&self) -> Option<SceneId> {
        self.scene.clone()
    }

    fn set_scene(&mut self, id: SceneId) {
        info!(scene = %id, "show pano");
        self.events
            .emit(SurfaceEvent::SceneChanged(id.as_str().to_string()));
        self.scene = Some(id);
        // A real panorama would now recompute its neighbors.
        self.links.clear();
    }

    fn links(&self) -> Vec<Link> {
        self.links.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    fn disable_navigation(&mut self, show_links: bool) {
        if show_links {
            info!("navigation disabled, link arrows shown");
        } else {
            info!("navigation disabled");
        }
    }
}

/// Log a rejected console command without stopping the node.
pub fn report(line: &str, err: &str) {
    warn!(command = line.trim(), "{err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn surface() -> ConsoleSurface {
        let mut s = ConsoleSurface::new(Viewport::new(800, 600));
        assert_eq!(s.take_events(), vec![SurfaceEvent::Ready]);
        s
    }

    #[test]
    fn pov_command_reports_change() {
        let mut s = surface();
        s.command("pov 12.5 -3 2").unwrap();
        s.command("pov 13 -3").unwrap();
        assert_eq!(
            s.take_events(),
            vec![
                SurfaceEvent::PovChanged(Viewpoint::new(12.5, -3.0, 2)),
                SurfaceEvent::PovChanged(Viewpoint::new(13.0, -3.0, 2)),
            ]
        );
        assert!(s.command("pov north").is_err());
    }

    #[test]
    fn pano_links_and_resize() {
        let mut s = surface();
        s.command("pano abc-123").unwrap();
        s.command(r#"links [{"pano":"next","heading":90}]"#).unwrap();
        s.command("resize 1080 1920").unwrap();
        s.command("resize 640x480").unwrap();
        assert_eq!(
            s.take_events(),
            vec![
                SurfaceEvent::SceneChanged("abc-123".to_string()),
                SurfaceEvent::LinksChanged(vec![Link(json!({"pano": "next", "heading": 90}))]),
                SurfaceEvent::SizeChanged(Viewport::new(1080, 1920)),
                SurfaceEvent::SizeChanged(Viewport::new(640, 480)),
            ]
        );
        assert_eq!(s.scene().unwrap().as_str(), "abc-123");
        assert_eq!(s.viewport(), Viewport::new(640, 480));
    }

    #[test]
    fn setters_echo_like_a_real_surface() {
        let mut s = surface();
        s.set_pov(Viewpoint::new(1.0, 2.0, 3));
        s.set_scene(SceneId::parse("p").unwrap());
        assert_eq!(
            s.take_events(),
            vec![
                SurfaceEvent::PovChanged(Viewpoint::new(1.0, 2.0, 3)),
                SurfaceEvent::SceneChanged("p".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_unknown_and_malformed_commands() {
        let mut s = surface();
        assert!(s.command("fly").is_err());
        assert!(s.command("pano").is_err());
        assert!(s.command("links {").is_err());
        assert!(s.command("resize 0").is_err());
        assert!(s.command("").is_ok());
        assert!(s.take_events().is_empty());
    }
}
