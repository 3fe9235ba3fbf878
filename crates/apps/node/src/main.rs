mod console;
mod settings;
mod ws;

use clap::Parser;
use relay::{OutboundMessage, RelayChannel, RelayEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewsync::{NodeAdapter, NodeConfig};

use console::ConsoleSurface;
use settings::Args;

type Node = NodeAdapter<ConsoleSurface, Box<dyn RelayChannel>>;

/// Stand-in for the relay when running detached: frames are only logged.
struct OfflineChannel;

impl RelayChannel for OfflineChannel {
    fn send(&mut self, msg: OutboundMessage) {
        match relay::encode(&msg) {
            Ok(text) => info!(%text, "offline, not sent"),
            Err(e) => error!("failed to encode {}: {e}", msg.name()),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cfg = settings::load(&args)?;

    let default_level = if cfg.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let node_id = uuid::Uuid::new_v4();
    info!(id = %node_id, role = %cfg.role(), "starting node");
    run(cfg, args.offline).await
}

async fn run(cfg: NodeConfig, offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Kept alive so the offline event stream never ends on its own.
    let (idle_tx, idle_rx) = mpsc::unbounded_channel();
    let (channel, mut relay_events) = match &cfg.relay_url {
        Some(url) if !offline => {
            let (channel, events) = ws::connect(url).await?;
            (Box::new(channel) as Box<dyn RelayChannel>, events)
        }
        _ => {
            info!("running offline");
            (Box::new(OfflineChannel) as Box<dyn RelayChannel>, idle_rx)
        }
    };

    let surface = ConsoleSurface::new(cfg.viewport);
    let mut node: Node = NodeAdapter::new(&cfg, surface, channel)?;
    info!(
        mode = %node.surface_config().render_mode,
        zoom = node.surface_config().zoom,
        fov = ?node.coordinator().fov(),
        "node configured"
    );
    pump(&mut node);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        tokio::select! {
            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if let Err(err) = node.surface_mut().command(&line) {
                        console::report(&line, &err);
                    }
                }
                None => {
                    stdin_open = false;
                    if offline {
                        break;
                    }
                }
            },
            event = relay_events.recv() => match event {
                Some(RelayEvent::Disconnected) | None => {
                    node.handle_relay_event(RelayEvent::Disconnected);
                    break;
                }
                Some(event) => node.handle_relay_event(event),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
        pump(&mut node);
    }

    drop(idle_tx);
    info!(metrics = %node.coordinator().metrics(), "node stopped");
    Ok(())
}

/// Feed queued surface notifications to the node until the surface settles.
fn pump(node: &mut Node) {
    loop {
        let events = node.surface_mut().take_events();
        if events.is_empty() {
            return;
        }
        for event in events {
            node.handle_surface_event(event);
        }
    }
}
