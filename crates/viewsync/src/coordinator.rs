//! View synchronization between one node and the relay.
//!
//! The coordinator keeps two independent tracks:
//! - the last authoritative (remote) viewpoint and scene, used to drop
//!   redundant relay updates and to re-translate on resize
//! - the last viewpoint and scene this node sent, used to drop redundant
//!   local changes
//!
//! Keeping them apart lets a node receive back its own frame without sending
//! it again, and lets a resize re-apply a viewpoint without that re-apply
//! being mistaken for an outbound change.

use foundation::{
    AngularOffset, Fov, Link, SceneId, ValidationError, Viewpoint, compute_offset, translate,
};
use relay::{OutboundMessage, PanoPayload, PovPayload, RelayChannel};
use runtime::{EventBus, Metrics};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;

/// What the coordinator asks of the surface side.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Ready,
    /// Show this (already translated) viewpoint now.
    ViewpointChanged(Viewpoint),
    SceneChanged(SceneId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Ready,
}

pub struct SyncCoordinator<C> {
    config: SyncConfig,
    channel: C,
    state: SyncState,
    fov: Option<Fov>,
    offset: AngularOffset,
    remote_pov: Option<Viewpoint>,
    remote_scene: Option<SceneId>,
    sent_pov: Option<Viewpoint>,
    sent_scene: Option<SceneId>,
    events: EventBus<SyncEvent>,
    metrics: Metrics,
}

impl<C: RelayChannel> SyncCoordinator<C> {
    pub fn new(config: SyncConfig, channel: C) -> Self {
        Self {
            config,
            channel,
            state: SyncState::Uninitialized,
            fov: None,
            offset: AngularOffset::ZERO,
            remote_pov: None,
            remote_scene: None,
            sent_pov: None,
            sent_scene: None,
            events: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    /// Become ready and ask the relay for its current state.
    ///
    /// Only the first call has any effect.
    pub fn start(&mut self) {
        if self.state == SyncState::Ready {
            debug!("sync coordinator already started");
            return;
        }
        self.state = SyncState::Ready;
        info!(role = %self.config.role, "sync coordinator ready");
        self.events.emit(SyncEvent::Ready);
        self.channel.send(OutboundMessage::Refresh {});
    }

    /// A viewpoint arrived from the relay.
    ///
    /// Returns whether it was applied (`false` for a duplicate).
    pub fn on_remote_viewpoint(&mut self, payload: &PovPayload) -> Result<bool, ValidationError> {
        let pov = match payload.validate(self.config.zoom) {
            Ok(pov) => pov,
            Err(err) => {
                warn!(%err, ?payload, "dropping bad pov from relay");
                self.metrics.incr("remote.pov.rejected");
                return Err(err);
            }
        };

        if self
            .remote_pov
            .is_some_and(|last| last.same_direction(&pov))
        {
            debug!(%pov, "ignoring duplicate remote pov");
            self.metrics.incr("remote.pov.duplicate");
            return Ok(false);
        }

        self.remote_pov = Some(pov);
        self.metrics.incr("remote.pov.applied");
        self.apply_remote_pov(pov);
        Ok(true)
    }

    /// A scene id arrived from the relay. Scenes are never translated.
    pub fn on_remote_scene(&mut self, payload: &PanoPayload) -> Result<bool, ValidationError> {
        let id = match payload.validate() {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, ?payload, "dropping bad pano from relay");
                self.metrics.incr("remote.pano.rejected");
                return Err(err);
            }
        };

        if self.remote_scene.as_ref() == Some(&id) {
            debug!(scene = %id, "ignoring duplicate remote pano");
            self.metrics.incr("remote.pano.duplicate");
            return Ok(false);
        }

        debug!(scene = %id, "applying remote pano");
        self.remote_scene = Some(id.clone());
        self.metrics.incr("remote.pano.applied");
        self.events.emit(SyncEvent::SceneChanged(id));
        Ok(true)
    }

    /// The local surface moved. Returns whether a frame was sent.
    pub fn on_local_viewpoint_changed(&mut self, pov: Viewpoint) -> Result<bool, ValidationError> {
        if !self.config.role.sends() {
            return Ok(false);
        }
        if let Err(err) = pov.validate() {
            warn!(%err, "dropping bad pov from surface");
            self.metrics.incr("local.pov.rejected");
            return Err(err);
        }
        if self.state != SyncState::Ready {
            debug!(%pov, "not ready, holding back local pov");
            self.metrics.incr("local.pov.early");
            return Ok(false);
        }
        if self.sent_pov.is_some_and(|last| last.same_direction(&pov)) {
            self.metrics.incr("local.pov.suppressed");
            return Ok(false);
        }

        self.sent_pov = Some(pov);
        self.metrics.incr("local.pov.sent");
        self.channel.send(OutboundMessage::Pov(pov));
        Ok(true)
    }

    /// The local surface switched scenes. Returns whether a frame was sent.
    pub fn on_local_scene_changed(&mut self, raw_id: &str) -> Result<bool, ValidationError> {
        if !self.config.role.sends() {
            return Ok(false);
        }
        let id = match SceneId::parse(raw_id) {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, "dropping bad pano from surface");
                self.metrics.incr("local.pano.rejected");
                return Err(err);
            }
        };
        if self.state != SyncState::Ready {
            debug!(scene = %id, "not ready, holding back local pano");
            self.metrics.incr("local.pano.early");
            return Ok(false);
        }
        if self.sent_scene.as_ref() == Some(&id) {
            self.metrics.incr("local.pano.suppressed");
            return Ok(false);
        }

        debug!(scene = %id, "sending pano");
        self.sent_scene = Some(id.clone());
        self.metrics.incr("local.pano.sent");
        self.channel.send(OutboundMessage::Pano { panoid: id });
        Ok(true)
    }

    /// Links are a snapshot, not state: always forwarded.
    pub fn on_local_links_changed(&mut self, links: Vec<Link>) {
        self.metrics.incr("local.links.sent");
        self.channel.send(OutboundMessage::Links { links });
    }

    /// The field of view changed, so this node's slice of the wall moved.
    pub fn resize(&mut self, fov: Fov) -> Result<(), ValidationError> {
        if let Err(err) = fov.validate() {
            warn!(%err, "ignoring bad fov on resize");
            self.metrics.incr("resize.rejected");
            return Err(err);
        }

        self.fov = Some(fov);
        self.offset = compute_offset(self.config.yaw_offset, self.config.pitch_offset, fov);
        debug!(
            hfov = fov.hfov,
            vfov = fov.vfov,
            yaw_shift = self.offset.yaw_shift,
            pitch_shift = self.offset.pitch_shift,
            "offset recomputed"
        );

        if let Some(pov) = self.remote_pov {
            self.metrics.incr("resize.reapplied");
            self.apply_remote_pov(pov);
        }
        Ok(())
    }

    fn apply_remote_pov(&mut self, pov: Viewpoint) {
        let local = translate(pov, self.offset);
        debug!(remote = %pov, local = %local, "applying remote pov");
        self.events.emit(SyncEvent::ViewpointChanged(local));
    }

    /// Take everything the surface side should act on, oldest first.
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        self.events.drain()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn fov(&self) -> Option<Fov> {
        self.fov
    }

    pub fn offset(&self) -> AngularOffset {
        self.offset
    }

    pub fn last_remote_pov(&self) -> Option<Viewpoint> {
        self.remote_pov
    }

    pub fn last_remote_scene(&self) -> Option<&SceneId> {
        self.remote_scene.as_ref()
    }

    pub fn last_sent_pov(&self) -> Option<Viewpoint> {
        self.sent_pov
    }

    pub fn last_sent_scene(&self) -> Option<&SceneId> {
        self.sent_scene.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }
}
