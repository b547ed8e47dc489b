mod buttons;
mod clock;
mod grabber;
mod layer;
mod router;
mod state_machine;
mod uinput_emitter;

use anyhow::{Context, Result};
use clickd_core::config::{self, Config};
use clickd_core::ipc::{self, ClientMsg, DaemonMsg};
use clock::SystemClock;
use evdev::uinput::VirtualDevice;
use router::{Action, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Shared state between the event loop and IPC handlers.
struct Shared {
    router: Router<SystemClock>,
    vdev: VirtualDevice,
    /// Channels to clients that asked for layer change notifications.
    subscriber_txs: Vec<mpsc::UnboundedSender<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clickd=info".parse()?),
        )
        .init();

    info!("clickd starting");

    let config = Config::load().context("loading config")?;
    config.validate().context("validating config")?;
    info!(
        layer = config.layer.id,
        threshold = config.activation.movement_threshold,
        active_timeout_ms = config.activation.active_timeout_ms,
        armed_timeout_ms = config.activation.armed_timeout_ms,
        "config loaded"
    );

    // Find and grab keyboards and pointers
    let devices = grabber::find_devices().context("finding input devices")?;
    if devices.is_empty() {
        anyhow::bail!("no input devices found, check permissions (group 'input' or udev rules)");
    }

    let vdev = uinput_emitter::create_virtual_device().context("creating virtual device")?;
    let router = Router::new(&config, SystemClock).context("building router")?;

    let shared = Arc::new(Mutex::new(Shared {
        router,
        vdev,
        subscriber_txs: Vec::new(),
    }));

    // Event channel from grabbed devices
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    for path in devices {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = grabber::grab_device(path.clone(), tx).await {
                error!(path = %path.display(), error = %e, "grabber task failed");
            }
        });
    }
    drop(event_tx); // Close our copy so the channel closes when all grabbers exit

    // Start IPC listener
    let socket_path = config::socket_path();
    // Remove stale socket
    let _ = std::fs::remove_file(&socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("binding socket {}", socket_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o666)).ok();
    }
    info!(path = %socket_path.display(), "IPC socket listening");

    let shared_ipc = Arc::clone(&shared);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let shared = Arc::clone(&shared_ipc);
                    tokio::spawn(handle_ipc_client(stream, shared));
                }
                Err(e) => {
                    warn!(error = %e, "IPC accept error");
                }
            }
        }
    });

    // Polling tick: timeouts are checked here, never by timer callbacks
    let mut poll = tokio::time::interval(Duration::from_millis(config.general.poll_interval_ms));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    warn!("all grabbed devices are gone");
                    break;
                };
                let mut shared = shared.lock().await;
                let actions = shared.router.process_event(event);
                process_actions(&mut shared, actions);
                announce_layer_change(&mut shared);
            }
            _ = poll.tick() => {
                let mut shared = shared.lock().await;
                shared.router.tick();
                announce_layer_change(&mut shared);
            }
        }
    }

    info!("clickd shutting down");
    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

fn process_actions(shared: &mut Shared, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Relay(event) => {
                if let Err(e) = uinput_emitter::relay_event(&mut shared.vdev, &event) {
                    warn!(error = %e, "relay error");
                }
            }
            Action::SendReport(report) => {
                if let Err(e) = uinput_emitter::send_report(&mut shared.vdev, &report) {
                    warn!(error = %e, "button report error");
                }
            }
            Action::Suppress => {}
        }
    }
}

fn announce_layer_change(shared: &mut Shared) {
    let Some(active) = shared.router.take_layer_change() else {
        return;
    };
    let line = ipc::encode(&DaemonMsg::LayerChanged {
        layer: shared.router.layer_id(),
        active,
    });
    shared.subscriber_txs.retain(|tx| tx.send(line.clone()).is_ok());
}

fn status(shared: &Shared) -> DaemonMsg {
    DaemonMsg::Status {
        enabled: shared.router.is_enabled(),
        state: shared.router.state().as_str().to_string(),
        layer: shared.router.layer_id(),
        active: shared.router.is_layer_active(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn set_enabled(shared: &mut Shared, enabled: bool) -> DaemonMsg {
    let actions = shared.router.set_enabled(enabled);
    process_actions(shared, actions);
    announce_layer_change(shared);
    DaemonMsg::Ack {
        ok: true,
        message: if enabled { "enabled".into() } else { "disabled".into() },
    }
}

async fn handle_ipc_client(stream: UnixStream, shared: Arc<Mutex<Shared>>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // Channel for sending messages back to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Writer task
    let write_handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut is_subscriber = false;

    while let Ok(Some(line)) = lines.next_line().await {
        let Some(msg) = ipc::decode_client(&line) else {
            continue;
        };

        let mut shared = shared.lock().await;

        let reply = match msg {
            ClientMsg::Subscribe => {
                is_subscriber = true;
                shared.subscriber_txs.push(tx.clone());
                DaemonMsg::Ack {
                    ok: true,
                    message: "subscribed".into(),
                }
            }
            ClientMsg::GetStatus => status(&shared),
            ClientMsg::Enable => set_enabled(&mut shared, true),
            ClientMsg::Disable => set_enabled(&mut shared, false),
            ClientMsg::Toggle => {
                let enabled = !shared.router.is_enabled();
                set_enabled(&mut shared, enabled)
            }
        };
        let _ = tx.send(ipc::encode(&reply));
    }

    // Client disconnected: remove subscriber sender if registered
    if is_subscriber {
        let mut shared = shared.lock().await;
        shared.subscriber_txs.retain(|t| !t.is_closed());
    }

    write_handle.abort();
}
