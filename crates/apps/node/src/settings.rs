use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser;
use foundation::ConfigurationError;
use viewsync::{NodeConfig, Viewport};

pub const RELAY_URL_ENV: &str = "VIEWSYNC_RELAY_URL";

#[derive(Parser, Debug)]
#[command(author, version, about = "Display wall node: keeps one panorama slice in sync with the relay")]
pub struct Args {
    /// JSON node configuration (camelCase keys); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Relay websocket URL (falls back to $VIEWSYNC_RELAY_URL)
    #[arg(long)]
    pub relay: Option<String>,

    /// Forward local view changes to the relay (source role)
    #[arg(long)]
    pub send: bool,

    /// Do not apply view changes from the relay
    #[arg(long)]
    pub no_receive: bool,

    /// Panorama render mode: webgl, html4, html5 or flash
    #[arg(long)]
    pub render_mode: Option<String>,

    /// Zoom level index into the render mode's FOV table
    #[arg(long)]
    pub zoom: Option<u32>,

    /// Horizontal wall position, in screen widths
    #[arg(long, allow_hyphen_values = true)]
    pub yaw_offset: Option<f64>,

    /// Vertical wall position, in screen heights
    #[arg(long, allow_hyphen_values = true)]
    pub pitch_offset: Option<f64>,

    /// Keep neighbor-link arrows visible
    #[arg(long)]
    pub show_links: bool,

    /// Report neighbor links to the relay
    #[arg(long)]
    pub link_capture: bool,

    /// Display size, WIDTHxHEIGHT
    #[arg(long)]
    pub viewport: Option<Viewport>,

    /// Run without a relay; outbound frames are only logged
    #[arg(long)]
    pub offline: bool,

    /// Debug logging when RUST_LOG is unset
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug)]
pub enum ConfigLoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Invalid(ConfigurationError),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLoadError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConfigLoadError::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
            ConfigLoadError::Invalid(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigLoadError::Io { source, .. } => Some(source),
            ConfigLoadError::Parse { source, .. } => Some(source),
            ConfigLoadError::Invalid(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for ConfigLoadError {
    fn from(err: ConfigurationError) -> Self {
        ConfigLoadError::Invalid(err)
    }
}

/// Build the node configuration: file, then flags, then environment.
pub fn load(args: &Args) -> Result<NodeConfig, ConfigLoadError> {
    load_with_env(args, std::env::var(RELAY_URL_ENV).ok())
}

fn load_with_env(args: &Args, env_relay: Option<String>) -> Result<NodeConfig, ConfigLoadError> {
    let mut cfg = match &args.config {
        Some(path) => read_file(path)?,
        None => NodeConfig::default(),
    };

    if let Some(relay) = &args.relay {
        cfg.relay_url = Some(relay.clone());
    }
    if cfg.relay_url.is_none() {
        cfg.relay_url = env_relay.filter(|url| !url.trim().is_empty());
    }
    if let Some(mode) = &args.render_mode {
        cfg.render_mode = mode.clone();
    }
    if let Some(zoom) = args.zoom {
        cfg.zoom = zoom;
    }
    if let Some(yaw) = args.yaw_offset {
        cfg.yaw_offset = yaw;
    }
    if let Some(pitch) = args.pitch_offset {
        cfg.pitch_offset = pitch;
    }
    if let Some(viewport) = args.viewport {
        cfg.viewport = viewport;
    }
    cfg.send |= args.send;
    cfg.receive &= !args.no_receive;
    cfg.show_links |= args.show_links;
    cfg.link_capture |= args.link_capture;
    cfg.debug |= args.debug;

    cfg.validate()?;
    if !args.offline && cfg.relay_url.is_none() {
        return Err(ConfigurationError::MissingRelayUrl.into());
    }
    Ok(cfg)
}

fn read_file(path: &Path) -> Result<NodeConfig, ConfigLoadError> {
    let payload = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&payload).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use viewsync::NodeRole;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["viewsync-node"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn flags_only() {
        let a = args(&[
            "--relay",
            "ws://relay:9000/ws",
            "--send",
            "--render-mode",
            "html5",
            "--zoom",
            "2",
            "--yaw-offset",
            "-1",
            "--viewport",
            "1080x1920",
        ]);
        let cfg = load_with_env(&a, None).unwrap();
        assert_eq!(cfg.relay_url.as_deref(), Some("ws://relay:9000/ws"));
        assert_eq!(cfg.role(), NodeRole::Both);
        assert_eq!(cfg.yaw_offset, -1.0);
        assert_eq!(cfg.viewport, Viewport::new(1080, 1920));
        assert_eq!(cfg.validate(), Ok(53.5));
    }

    #[test]
    fn file_then_flags_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"renderMode":"flash","zoom":4,"pitchOffset":0.5,"linkCapture":true}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let a = args(&["--config", &path, "--zoom", "0", "--no-receive"]);
        let cfg = load_with_env(&a, Some("ws://env/ws".to_string())).unwrap();
        assert_eq!(cfg.render_mode, "flash");
        assert_eq!(cfg.zoom, 0);
        assert_eq!(cfg.pitch_offset, 0.5);
        assert!(cfg.link_capture);
        assert_eq!(cfg.role(), NodeRole::None);
        assert_eq!(cfg.relay_url.as_deref(), Some("ws://env/ws"));
    }

    #[test]
    fn missing_relay_is_fatal_unless_offline() {
        let err = load_with_env(&args(&[]), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid(ConfigurationError::MissingRelayUrl)
        ));
        assert!(load_with_env(&args(&["--offline"]), None).is_ok());
    }

    #[test]
    fn bad_render_mode_is_fatal() {
        let err = load_with_env(&args(&["--offline", "--render-mode", "vr"]), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::Invalid(ConfigurationError::UnknownRenderMode(_))
        ));
    }

    #[test]
    fn unreadable_and_malformed_files() {
        let a = args(&["--offline", "--config", "/nonexistent/viewsync.json"]);
        assert!(matches!(
            load_with_env(&a, None),
            Err(ConfigLoadError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let a = args(&["--offline", "--config", &path]);
        assert!(matches!(
            load_with_env(&a, None),
            Err(ConfigLoadError::Parse { .. })
        ));
    }
}
