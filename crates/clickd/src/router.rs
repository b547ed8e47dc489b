use crate::buttons::{ButtonReport, MappedButton, NativeButtons};
use crate::clock::Clock;
use crate::layer::LayerSwitch;
use crate::state_machine::{ClickLayer, ClickState, Propagation, Settings};
use anyhow::Result;
use clickd_core::config::Config;
use clickd_core::keymap;
use evdev::{EventType, InputEvent, Key, RelativeAxisType};
use std::collections::HashMap;
use tracing::{debug, info};

/// Actions that the router wants the caller to perform.
#[derive(Debug)]
pub enum Action {
    /// Relay event to uinput unchanged.
    Relay(InputEvent),
    /// Emit the pointer button state.
    SendReport(ButtonReport),
    /// Suppress this event (don't relay).
    Suppress,
}

/// Sits between the grabbed devices and the virtual device: sums pointer
/// motion per tick, routes key events into the click layer and keeps the
/// button report.
pub struct Router<C> {
    layer: ClickLayer<C, LayerSwitch>,
    /// Key code → mapped button it becomes while the layer is clickable.
    bindings: HashMap<u16, MappedButton>,
    report: ButtonReport,
    /// Motion since the last tick.
    pending: (i32, i32),
    enabled: bool,
}

impl<C: Clock> Router<C> {
    pub fn new(config: &Config, clock: C) -> Result<Self> {
        let codes = config.buttons.key_codes()?;
        let bindings: HashMap<u16, MappedButton> =
            codes.into_iter().zip(MappedButton::ALL).collect();
        for (code, button) in &bindings {
            debug!(?button, key = keymap::key_name(*code).unwrap_or("?"), "button binding");
        }

        Ok(Self {
            layer: ClickLayer::new(Settings::from_config(config), clock, LayerSwitch::new()),
            bindings,
            report: ButtonReport::default(),
            pending: (0, 0),
            enabled: config.general.enabled,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning automatic activation off drops the layer and releases any
    /// button still held through it.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<Action> {
        if self.enabled == enabled {
            return Vec::new();
        }
        self.enabled = enabled;
        info!(enabled, "click layer activation switched");
        if enabled {
            return Vec::new();
        }

        self.layer.reset();
        self.pending = (0, 0);
        if self.report.mapped.is_empty() {
            return Vec::new();
        }
        self.report.mapped = Default::default();
        vec![Action::SendReport(self.report)]
    }

    pub fn state(&self) -> ClickState {
        self.layer.state()
    }

    pub fn layer_id(&self) -> u8 {
        self.layer.layer()
    }

    pub fn is_layer_active(&self) -> bool {
        self.layer.overlay().is_active()
    }

    /// See [`LayerSwitch::take_change`].
    pub fn take_layer_change(&mut self) -> Option<bool> {
        self.layer.overlay_mut().take_change()
    }

    /// One polling tick: hand the motion collected since the last tick to
    /// the click layer.
    pub fn tick(&mut self) {
        let (dx, dy) = std::mem::take(&mut self.pending);
        if !self.enabled {
            return;
        }
        self.layer.on_motion_sample(dx, dy);
    }

    /// Process an input event, returning actions for the caller.
    pub fn process_event(&mut self, event: InputEvent) -> Vec<Action> {
        match event.event_type() {
            EventType::RELATIVE => {
                self.collect_motion(&event);
                vec![Action::Relay(event)]
            }
            EventType::KEY => self.handle_key(event),
            _ => vec![Action::Relay(event)],
        }
    }

    fn collect_motion(&mut self, event: &InputEvent) {
        if !self.enabled {
            return;
        }
        let axis = RelativeAxisType(event.code());
        if axis == RelativeAxisType::REL_X {
            self.pending.0 = self.pending.0.saturating_add(event.value());
        } else if axis == RelativeAxisType::REL_Y {
            self.pending.1 = self.pending.1.saturating_add(event.value());
        }
    }

    fn handle_key(&mut self, event: InputEvent) -> Vec<Action> {
        let code = event.code();
        let value = event.value(); // 0=release, 1=press, 2=repeat

        // Physical pointer buttons share the report with the mapped ones
        if let Some(native) = NativeButtons::from_key(Key::new(code)) {
            match value {
                1 => self.report.native.insert(native),
                0 => self.report.native.remove(native),
                _ => return vec![Action::Suppress],
            }
            return vec![Action::SendReport(self.report)];
        }

        if !self.enabled {
            return vec![Action::Relay(event)];
        }

        let binding = self.bindings.get(&code).copied();
        let held = binding.map_or(false, |b| self.report.mapped.contains(b.bit()));

        match (binding, value) {
            (Some(button), 1) if self.layer.is_clickable() => {
                let propagation = self.layer.on_mapped_button_event(button, true, &mut self.report);
                vec![Action::SendReport(self.report), forward(propagation, event)]
            }
            // Released through the layer even if the layer has since gone idle
            (Some(button), 0) if held => {
                let propagation = self.layer.on_mapped_button_event(button, false, &mut self.report);
                vec![Action::SendReport(self.report), forward(propagation, event)]
            }
            (Some(_), 2) if held => vec![Action::Suppress],
            (_, 1) => vec![forward(self.layer.on_other_key_event(true), event)],
            (_, 0) => vec![forward(self.layer.on_other_key_event(false), event)],
            _ => vec![Action::Relay(event)],
        }
    }
}

fn forward(propagation: Propagation, event: InputEvent) -> Action {
    match propagation {
        Propagation::Stop => Action::Suppress,
        Propagation::Continue => Action::Relay(event),
    }
}
