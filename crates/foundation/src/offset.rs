use crate::fov::Fov;
use crate::pov::Viewpoint;

/// Angular shift between the shared viewpoint and this node's slice of the wall.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngularOffset {
    pub yaw_shift: f64,
    pub pitch_shift: f64,
}

impl AngularOffset {
    /// Until the first FOV is known a node renders the shared view unshifted.
    pub const ZERO: AngularOffset = AngularOffset {
        yaw_shift: 0.0,
        pitch_shift: 0.0,
    };
}

/// Scale this node's fractional wall position by the current FOV.
///
/// A fraction of `1.0` shifts by one full screen width; neighbors in a wall
/// of identical displays are typically one fraction apart.
pub fn compute_offset(fraction_yaw: f64, fraction_pitch: f64, fov: Fov) -> AngularOffset {
    AngularOffset {
        yaw_shift: fraction_yaw * fov.hfov,
        pitch_shift: fraction_pitch * fov.vfov,
    }
}

/// Apply an offset to an authoritative viewpoint. Zoom passes through.
pub fn translate(pov: Viewpoint, offset: AngularOffset) -> Viewpoint {
    Viewpoint {
        heading: pov.heading + offset.yaw_shift,
        pitch: pov.pitch + offset.pitch_shift,
        zoom: pov.zoom,
    }
}
