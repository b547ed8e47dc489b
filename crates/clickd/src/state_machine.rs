use crate::buttons::{ButtonReport, MappedButton};
use crate::clock::Clock;
use clickd_core::config::Config;
use std::time::{Duration, Instant};
use tracing::debug;

/// Activation states of the click layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickState {
    /// Layer off, nothing pending.
    Idle,
    /// Pointer started moving; collecting movement before turning the layer on.
    Armed,
    /// Layer on; idle countdown running.
    Active,
    /// A mapped button is held; layer forced on, countdown suspended.
    Clicking,
}

impl ClickState {
    pub fn as_str(self) -> &'static str {
        match self {
            ClickState::Idle => "idle",
            ClickState::Armed => "armed",
            ClickState::Active => "active",
            ClickState::Clicking => "clicking",
        }
    }
}

/// Whether a key event continues on to normal key handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Propagation {
    /// The event was consumed by the click layer.
    Stop,
    /// Pass the event on unchanged.
    Continue,
}

/// Switches the overlay layer. Both calls must be idempotent.
pub trait OverlayControl {
    fn enable_overlay(&mut self, layer: u8);
    fn disable_overlay(&mut self, layer: u8);
}

/// Timing and identity of the click layer, read once at startup.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub movement_threshold: u32,
    pub active_timeout: Duration,
    pub armed_timeout: Duration,
    pub layer: u8,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            movement_threshold: config.activation.movement_threshold,
            active_timeout: Duration::from_millis(config.activation.active_timeout_ms),
            armed_timeout: Duration::from_millis(config.activation.armed_timeout_ms),
            layer: config.layer.id,
        }
    }
}

/// Auto click-layer state machine. Fed one motion sample per polling tick
/// and every key event; turns the overlay on and off through `O`.
pub struct ClickLayer<C, O> {
    state: ClickState,
    /// Reference point for both idle timeouts.
    idle_since: Instant,
    /// Sum of |dx| + |dy| while armed, zero otherwise.
    movement: u32,
    settings: Settings,
    clock: C,
    overlay: O,
}

impl<C: Clock, O: OverlayControl> ClickLayer<C, O> {
    pub fn new(settings: Settings, clock: C, overlay: O) -> Self {
        let idle_since = clock.now();
        Self {
            state: ClickState::Idle,
            idle_since,
            movement: 0,
            settings,
            clock,
            overlay,
        }
    }

    pub fn state(&self) -> ClickState {
        self.state
    }

    #[cfg(test)]
    pub fn movement(&self) -> u32 {
        self.movement
    }

    #[cfg(test)]
    pub fn idle_since(&self) -> Instant {
        self.idle_since
    }

    /// True while clicks should go through the layer.
    pub fn is_clickable(&self) -> bool {
        matches!(self.state, ClickState::Active | ClickState::Clicking)
    }

    pub fn layer(&self) -> u8 {
        self.settings.layer
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut O {
        &mut self.overlay
    }

    /// Advance the timers with this tick's pointer motion. (0, 0) is a tick
    /// without motion.
    pub fn on_motion_sample(&mut self, dx: i32, dy: i32) {
        let magnitude = dx.unsigned_abs().saturating_add(dy.unsigned_abs());

        if magnitude != 0 {
            match self.state {
                ClickState::Idle => {
                    self.idle_since = self.clock.now();
                    self.movement = magnitude;
                    self.state = ClickState::Armed;
                    debug!(movement = magnitude, "armed");
                }
                ClickState::Armed => {
                    self.movement = self.movement.saturating_add(magnitude);
                    if self.movement >= self.settings.movement_threshold {
                        debug!(movement = self.movement, "movement threshold reached");
                        self.movement = 0;
                        self.enter_active();
                    }
                }
                ClickState::Active => {
                    self.idle_since = self.clock.now();
                }
                ClickState::Clicking => {}
            }
        } else {
            match self.state {
                ClickState::Idle => {
                    self.movement = 0;
                }
                ClickState::Armed => {
                    if self.elapsed() > self.settings.armed_timeout {
                        debug!(movement = self.movement, "armed timed out");
                        self.movement = 0;
                        self.state = ClickState::Idle;
                    }
                }
                ClickState::Active => {
                    if self.elapsed() > self.settings.active_timeout {
                        debug!("click layer idle timeout");
                        self.exit_overlay();
                    }
                }
                ClickState::Clicking => {}
            }
        }
    }

    /// Press or release of one of the mapped buttons. Updates the button's
    /// bit in `report`; the key event itself is always consumed.
    ///
    /// Releasing any mapped button restarts the idle countdown in `Active`,
    /// even if another mapped button is still held.
    pub fn on_mapped_button_event(
        &mut self,
        button: MappedButton,
        pressed: bool,
        report: &mut ButtonReport,
    ) -> Propagation {
        if pressed {
            report.mapped.insert(button.bit());
            if !self.is_clickable() {
                self.overlay.enable_overlay(self.settings.layer);
            }
            self.movement = 0;
            self.state = ClickState::Clicking;
            debug!(?button, "mapped button pressed");
        } else {
            report.mapped.remove(button.bit());
            debug!(?button, still_held = ?report.mapped, "mapped button released");
            self.enter_active();
        }
        Propagation::Stop
    }

    /// Any key that is not a mapped button. A press leaves the click layer.
    pub fn on_other_key_event(&mut self, pressed: bool) -> Propagation {
        if pressed {
            if self.state != ClickState::Idle {
                debug!(from = self.state.as_str(), "other key pressed, leaving click layer");
            }
            self.exit_overlay();
        }
        Propagation::Continue
    }

    /// Drop back to `Idle` with the overlay off.
    pub fn reset(&mut self) {
        self.exit_overlay();
    }

    fn enter_active(&mut self) {
        self.idle_since = self.clock.now();
        self.overlay.enable_overlay(self.settings.layer);
        self.state = ClickState::Active;
    }

    fn exit_overlay(&mut self) {
        self.movement = 0;
        self.state = ClickState::Idle;
        self.overlay.disable_overlay(self.settings.layer);
    }

    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.idle_since)
    }
}
