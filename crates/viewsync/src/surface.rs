use foundation::{Link, RenderMode, SceneId, Viewpoint};

use crate::config::Viewport;

/// The panorama presentation capability a node drives.
///
/// Setters take effect immediately. Implementations report their own
/// changes back through a [`SurfaceListener`], including changes caused by
/// these setters.
pub trait ViewSurface {
    fn pov(&self) -> Option<Viewpoint>;
    fn set_pov(&mut self, pov: Viewpoint);

    fn scene(&self) -> Option<SceneId>;
    fn set_scene(&mut self, id: SceneId);

    fn links(&self) -> Vec<Link>;

    fn viewport(&self) -> Viewport;

    fn set_render_mode(&mut self, mode: RenderMode);

    /// Hide interactive controls. The wall is output-only; `show_links`
    /// keeps the neighbor arrows drawn, without making them clickable.
    fn disable_navigation(&mut self, show_links: bool);
}

/// Receiver of view surface notifications.
pub trait SurfaceListener {
    fn on_ready(&mut self);
    fn on_pov_changed(&mut self, pov: Viewpoint);
    /// Scene ids come straight from the surface and are validated by the listener.
    fn on_scene_changed(&mut self, raw_id: &str);
    fn on_links_changed(&mut self, links: Vec<Link>);
    fn on_size_changed(&mut self, viewport: Viewport);
}

/// A surface notification, for surfaces that queue rather than call back.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Ready,
    PovChanged(Viewpoint),
    SceneChanged(String),
    LinksChanged(Vec<Link>),
    SizeChanged(Viewport),
}

impl SurfaceEvent {
    pub fn dispatch<L: SurfaceListener + ?Sized>(self, listener: &mut L) {
        match self {
            SurfaceEvent::Ready => listener.on_ready(),
            SurfaceEvent::PovChanged(pov) => listener.on_pov_changed(pov),
            SurfaceEvent::SceneChanged(id) => listener.on_scene_changed(&id),
            SurfaceEvent::LinksChanged(links) => listener.on_links_changed(links),
            SurfaceEvent::SizeChanged(viewport) => listener.on_size_changed(viewport),
        }
    }
}
