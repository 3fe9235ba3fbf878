//! Field-of-view geometry.
//!
//! The panorama widget renders a fixed horizontal field of view per zoom
//! level, and the table differs per render mode. The vertical field of view
//! follows from the viewport aspect ratio.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ValidationError};

/// Horizontal FOV (degrees) per zoom level for the WebGL and HTML5 renderers.
const HFOV_WEBGL: [f64; 5] = [127.0, 90.0, 53.5, 28.125, 14.25];

/// Horizontal FOV (degrees) per zoom level for the HTML4 and Flash renderers.
const HFOV_LEGACY: [f64; 5] = [180.0, 90.0, 45.0, 22.5, 11.25];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Webgl,
    Html4,
    Html5,
    Flash,
}

impl RenderMode {
    pub const ALL: [RenderMode; 4] = [
        RenderMode::Webgl,
        RenderMode::Html4,
        RenderMode::Html5,
        RenderMode::Flash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webgl => "webgl",
            Self::Html4 => "html4",
            Self::Html5 => "html5",
            Self::Flash => "flash",
        }
    }

    /// HFOV values indexed by zoom level, widest first.
    pub fn hfov_table(&self) -> &'static [f64] {
        match self {
            Self::Webgl | Self::Html5 => &HFOV_WEBGL,
            Self::Html4 | Self::Flash => &HFOV_LEGACY,
        }
    }

    pub fn max_zoom(&self) -> u32 {
        (self.hfov_table().len() - 1) as u32
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigurationError::UnknownRenderMode(s.to_string()))
    }
}

/// Look up the horizontal field of view for a render mode and zoom level.
pub fn hfov_for(mode: RenderMode, zoom: u32) -> Result<f64, ConfigurationError> {
    mode.hfov_table()
        .get(zoom as usize)
        .copied()
        .ok_or(ConfigurationError::ZoomOutOfRange {
            mode,
            zoom,
            max: mode.max_zoom(),
        })
}

/// Horizontal and vertical field of view, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fov {
    pub hfov: f64,
    pub vfov: f64,
}

impl Fov {
    pub fn new(hfov: f64, vfov: f64) -> Self {
        Self { hfov, vfov }
    }

    /// Derive the vertical FOV from the viewport aspect ratio.
    pub fn for_viewport(hfov: f64, width: u32, height: u32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::EmptyViewport { width, height });
        }
        let fov = Self {
            hfov,
            vfov: hfov * (height as f64 / width as f64),
        };
        fov.validate()?;
        Ok(fov)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.hfov) && ok(self.vfov) {
            Ok(())
        } else {
            Err(ValidationError::BadFov {
                hfov: self.hfov,
                vfov: self.vfov,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_per_mode() {
        assert_eq!(hfov_for(RenderMode::Webgl, 0), Ok(127.0));
        assert_eq!(hfov_for(RenderMode::Html5, 2), Ok(53.5));
        assert_eq!(hfov_for(RenderMode::Html4, 0), Ok(180.0));
        assert_eq!(hfov_for(RenderMode::Flash, 4), Ok(11.25));
    }

    #[test]
    fn zoom_out_of_range_is_config_error() {
        let err = hfov_for(RenderMode::Webgl, 5).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ZoomOutOfRange {
                mode: RenderMode::Webgl,
                zoom: 5,
                max: 4
            }
        );
    }

    #[test]
    fn parses_render_modes() {
        assert_eq!("WebGL".parse::<RenderMode>(), Ok(RenderMode::Webgl));
        assert_eq!(" flash ".parse::<RenderMode>(), Ok(RenderMode::Flash));
        for mode in RenderMode::ALL {
            assert_eq!(mode.as_str().parse::<RenderMode>(), Ok(mode));
        }
        assert!(matches!(
            "canvas".parse::<RenderMode>(),
            Err(ConfigurationError::UnknownRenderMode(_))
        ));
    }

    #[test]
    fn vfov_follows_aspect_ratio() {
        let fov = Fov::for_viewport(90.0, 1920, 1080).unwrap();
        assert_eq!(fov.hfov, 90.0);
        assert!((fov.vfov - 50.625).abs() < 1e-9);

        // Portrait displays see more vertically than horizontally.
        let portrait = Fov::for_viewport(90.0, 1080, 1920).unwrap();
        assert!(portrait.vfov > portrait.hfov);
    }

    #[test]
    fn degenerate_viewport_rejected() {
        assert_eq!(
            Fov::for_viewport(90.0, 0, 1080),
            Err(ValidationError::EmptyViewport {
                width: 0,
                height: 1080
            })
        );
        assert!(Fov::for_viewport(f64::NAN, 10, 10).is_err());
        assert!(Fov::new(90.0, f64::INFINITY).validate().is_err());
    }
}
