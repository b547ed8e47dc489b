use crate::buttons::ButtonReport;
use anyhow::{Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use tracing::info;

/// Name of the virtual device; the grabber skips it to avoid a feedback loop.
pub const DEVICE_NAME: &str = "clickd virtual pointer";

pub trait EventEmitter {
    fn emit_events(&mut self, events: &[InputEvent]) -> Result<()>;
}

impl EventEmitter for VirtualDevice {
    fn emit_events(&mut self, events: &[InputEvent]) -> Result<()> {
        self.emit(events)?;
        Ok(())
    }
}

pub fn create_virtual_device() -> Result<VirtualDevice> {
    let mut keys = AttributeSet::<Key>::new();
    for code in 0..=255u16 {
        keys.insert(Key::new(code));
    }
    // BTN_LEFT..BTN_TASK
    for code in 0x110..=0x117u16 {
        keys.insert(Key::new(code));
    }

    let mut axes = AttributeSet::<RelativeAxisType>::new();
    for axis in [
        RelativeAxisType::REL_X,
        RelativeAxisType::REL_Y,
        RelativeAxisType::REL_HWHEEL,
        RelativeAxisType::REL_WHEEL,
        RelativeAxisType::REL_WHEEL_HI_RES,
        RelativeAxisType::REL_HWHEEL_HI_RES,
    ] {
        axes.insert(axis);
    }

    let vdev = VirtualDeviceBuilder::new()
        .context("creating VirtualDeviceBuilder")?
        .name(DEVICE_NAME)
        .with_keys(&keys)
        .context("setting keys")?
        .with_relative_axes(&axes)
        .context("setting relative axes")?
        .build()
        .context("building virtual device")?;

    info!("virtual uinput device created");
    Ok(vdev)
}

pub fn relay_event(emitter: &mut impl EventEmitter, event: &InputEvent) -> Result<()> {
    emitter.emit_events(&[*event])?;
    Ok(())
}

/// Emit the full pointer button state followed by a SYN_REPORT. The input
/// core drops key events that do not change state, so unchanged buttons
/// cost nothing downstream.
pub fn send_report(emitter: &mut impl EventEmitter, report: &ButtonReport) -> Result<()> {
    let mut events = Vec::with_capacity(4);
    for (key, pressed) in report.key_states() {
        events.push(InputEvent::new(EventType::KEY, key.code(), pressed as i32));
    }
    events.push(InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));
    emitter.emit_events(&events)
}
