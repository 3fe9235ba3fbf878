use foundation::{ConfigurationError, Fov, Link, SceneId, Viewpoint};
use relay::{DecodeError, InboundMessage, RelayChannel, RelayEvent};
use tracing::{debug, info, warn};

use crate::config::{NodeConfig, NodeRole, SurfaceConfig, Viewport};
use crate::coordinator::{SyncCoordinator, SyncEvent};
use crate::surface::{SurfaceEvent, SurfaceListener, ViewSurface};

/// One display node: a view surface wired to a sync coordinator.
///
/// All handlers run to completion on the caller's thread. Each input is
/// handled, then whatever the coordinator asked for is applied to the
/// surface before returning.
pub struct NodeAdapter<S, C> {
    surface: S,
    coordinator: SyncCoordinator<C>,
    config: SurfaceConfig,
    role: NodeRole,
    hfov: f64,
    // Last values the surface is known to hold, either because we set them
    // or because it reported them. Reports matching these are echoes.
    surface_pov: Option<Viewpoint>,
    surface_scene: Option<SceneId>,
}

impl<S: ViewSurface, C: RelayChannel> NodeAdapter<S, C> {
    /// Validate the configuration and prepare the surface.
    ///
    /// Fails on a configuration error; nothing is sent to the relay until
    /// the surface reports ready.
    pub fn new(config: &NodeConfig, mut surface: S, channel: C) -> Result<Self, ConfigurationError> {
        let hfov = config.validate()?;
        let surface_config = config.surface_config()?;

        surface.set_render_mode(surface_config.render_mode);
        surface.disable_navigation(surface_config.show_links);
        let initial = Viewpoint::new(0.0, 0.0, surface_config.zoom);
        surface.set_pov(initial);

        let mut adapter = Self {
            surface,
            coordinator: SyncCoordinator::new(config.sync_config(), channel),
            config: surface_config,
            role: config.role(),
            hfov,
            surface_pov: Some(initial),
            surface_scene: None,
        };
        let viewport = adapter.surface.viewport();
        adapter.on_size_changed(viewport);
        Ok(adapter)
    }

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        event.dispatch(self);
    }

    pub fn handle_relay_event(&mut self, event: RelayEvent) {
        match event {
            RelayEvent::Connected => info!("relay connected"),
            RelayEvent::Disconnected => warn!("relay disconnected"),
            RelayEvent::Message(msg) => self.handle_relay_message(msg),
        }
    }

    /// Decode and handle one raw relay frame. Malformed frames are dropped.
    pub fn handle_relay_text(&mut self, text: &str) -> Result<(), DecodeError> {
        match relay::decode(text) {
            Ok(msg) => {
                self.handle_relay_message(msg);
                Ok(())
            }
            Err(err) => {
                warn!(%err, "dropping malformed relay frame");
                Err(err)
            }
        }
    }

    fn handle_relay_message(&mut self, msg: InboundMessage) {
        if let InboundMessage::Ignored { name } = &msg {
            debug!(%name, "ignoring relay message");
            return;
        }
        if !self.role.receives() {
            debug!(role = %self.role, "not a sink, ignoring relay view update");
            return;
        }
        let result = match &msg {
            InboundMessage::Pov(payload) => self.coordinator.on_remote_viewpoint(payload),
            InboundMessage::Pano(payload) => self.coordinator.on_remote_scene(payload),
            InboundMessage::Ignored { .. } => Ok(false),
        };
        match result {
            Ok(true) => self.flush(),
            Ok(false) => {}
            // Already logged and counted by the coordinator.
            Err(err) => debug!(%err, "relay update rejected"),
        }
    }

    /// Apply everything the coordinator asked for.
    fn flush(&mut self) {
        for event in self.coordinator.drain_events() {
            match event {
                SyncEvent::Ready => info!(role = %self.role, "node ready"),
                SyncEvent::ViewpointChanged(pov) => self.apply_pov(pov),
                SyncEvent::SceneChanged(id) => self.apply_scene(id),
            }
        }
    }

    /// The surface always renders at the configured zoom: offsets are derived
    /// from that zoom's field of view, whatever zoom the relay carries.
    fn apply_pov(&mut self, pov: Viewpoint) {
        let pov = Viewpoint {
            zoom: self.config.zoom,
            ..pov
        };
        if self.surface_pov == Some(pov) {
            debug!(%pov, "surface already at pov");
            return;
        }
        self.surface_pov = Some(pov);
        self.surface.set_pov(pov);
    }

    fn apply_scene(&mut self, id: SceneId) {
        if self.surface.scene().as_ref() == Some(&id) {
            warn!(scene = %id, "ignoring redundant scene change");
            self.surface_scene = Some(id);
            return;
        }
        self.surface_scene = Some(id.clone());
        self.surface.set_scene(id);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn coordinator(&self) -> &SyncCoordinator<C> {
        &self.coordinator
    }

    pub fn surface_config(&self) -> &SurfaceConfig {
        &self.config
    }
}

impl<S: ViewSurface, C: RelayChannel> SurfaceListener for NodeAdapter<S, C> {
    fn on_ready(&mut self) {
        self.coordinator.start();
        self.flush();
    }

    fn on_pov_changed(&mut self, pov: Viewpoint) {
        if !self.role.sends() {
            return;
        }
        if self.surface_pov == Some(pov) {
            debug!(%pov, "surface echoed pov");
            return;
        }
        self.surface_pov = Some(pov);
        if let Err(err) = self.coordinator.on_local_viewpoint_changed(pov) {
            debug!(%err, "local pov rejected");
        }
    }

    fn on_scene_changed(&mut self, raw_id: &str) {
        if !self.role.sends() {
            return;
        }
        if self.surface_scene.as_ref().is_some_and(|s| s.as_str() == raw_id) {
            debug!(scene = raw_id, "surface echoed scene");
            return;
        }
        if let Ok(true) = self.coordinator.on_local_scene_changed(raw_id) {
            self.surface_scene = self.coordinator.last_sent_scene().cloned();
        }
    }

    fn on_links_changed(&mut self, links: Vec<Link>) {
        if !self.config.link_capture {
            return;
        }
        self.coordinator.on_local_links_changed(links);
    }

    fn on_size_changed(&mut self, viewport: Viewport) {
        let fov = match Fov::for_viewport(self.hfov, viewport.width, viewport.height) {
            Ok(fov) => fov,
            Err(err) => {
                warn!(%err, %viewport, "ignoring bad resize");
                return;
            }
        };
        debug!(%viewport, hfov = fov.hfov, vfov = fov.vfov, "resize");
        match self.coordinator.resize(fov) {
            Ok(()) => self.flush(),
            Err(err) => debug!(%err, "resize rejected"),
        }
    }
}
