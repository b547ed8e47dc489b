use crate::uinput_emitter::DEVICE_NAME;
use anyhow::{Context, Result};
use evdev::{Device, InputEvent, Key, RelativeAxisType};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Find every keyboard and pointing device under /dev/input/.
/// Combined devices (a keyboard with a built-in trackball) count once.
pub fn find_devices() -> Result<Vec<PathBuf>> {
    let mut devices = Vec::new();
    let input_dir = Path::new("/dev/input");

    for entry in std::fs::read_dir(input_dir).context("reading /dev/input")? {
        let entry = entry?;
        let path = entry.path();

        // Only look at eventN devices
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !name.starts_with("event") {
            continue;
        }

        match Device::open(&path) {
            Ok(dev) => {
                // Skip our own virtual device to avoid feedback loop
                if dev.name().map_or(false, |n| n == DEVICE_NAME) {
                    debug!(path = %path.display(), "skipping own virtual device");
                    continue;
                }
                let keyboard = is_keyboard(&dev);
                let pointer = is_pointer(&dev);
                if keyboard || pointer {
                    info!(path = %path.display(), name = ?dev.name(), keyboard, pointer, "found input device");
                    devices.push(path);
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping device");
            }
        }
    }

    Ok(devices)
}

/// Heuristic: a device is a keyboard if it has KEY events and supports
/// common letter keys (KEY_A through KEY_Z).
fn is_keyboard(dev: &Device) -> bool {
    let Some(keys) = dev.supported_keys() else {
        return false;
    };

    keys.contains(Key::KEY_A) && keys.contains(Key::KEY_Z) && keys.contains(Key::KEY_ENTER)
}

/// A pointer reports relative X/Y motion.
fn is_pointer(dev: &Device) -> bool {
    let Some(axes) = dev.supported_relative_axes() else {
        return false;
    };

    axes.contains(RelativeAxisType::REL_X) && axes.contains(RelativeAxisType::REL_Y)
}

/// Grab a device and forward its events to the channel.
/// Runs until the receiver is dropped or the device errors.
pub async fn grab_device(path: PathBuf, tx: mpsc::UnboundedSender<InputEvent>) -> Result<()> {
    let mut dev = Device::open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let dev_name = dev.name().unwrap_or("unknown").to_string();
    info!(device = %dev_name, path = %path.display(), "grabbing device");

    dev.grab()
        .with_context(|| format!("grabbing {}", path.display()))?;

    let mut stream = dev.into_event_stream()
        .context("creating event stream")?;

    loop {
        match stream.next_event().await {
            Ok(event) => {
                if tx.send(event).is_err() {
                    // Receiver dropped, shut down
                    break;
                }
            }
            Err(e) => {
                warn!(device = %dev_name, error = %e, "device error, stopping grab");
                break;
            }
        }
    }

    Ok(())
}
