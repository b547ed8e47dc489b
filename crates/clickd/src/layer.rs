use crate::state_machine::OverlayControl;
use tracing::debug;

/// The daemon's overlay: remembers whether the click layer is on and which
/// changes have not been announced to IPC subscribers yet.
#[derive(Debug, Default)]
pub struct LayerSwitch {
    active: bool,
    announced: bool,
}

impl LayerSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Net change since the last call, if any. An on/off flicker between two
    /// calls reports nothing.
    pub fn take_change(&mut self) -> Option<bool> {
        if self.active == self.announced {
            return None;
        }
        self.announced = self.active;
        Some(self.active)
    }
}

impl OverlayControl for LayerSwitch {
    fn enable_overlay(&mut self, layer: u8) {
        if !self.active {
            debug!(layer, "click layer on");
            self.active = true;
        }
    }

    fn disable_overlay(&mut self, layer: u8) {
        if self.active {
            debug!(layer, "click layer off");
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off_with_nothing_to_announce() {
        let mut layer = LayerSwitch::new();
        assert!(!layer.is_active());
        assert_eq!(layer.take_change(), None);
    }

    #[test]
    fn enable_is_announced_once() {
        let mut layer = LayerSwitch::new();
        layer.enable_overlay(4);
        layer.enable_overlay(4);
        assert!(layer.is_active());
        assert_eq!(layer.take_change(), Some(true));
        assert_eq!(layer.take_change(), None);
    }

    #[test]
    fn repeated_disable_stays_disabled() {
        let mut layer = LayerSwitch::new();
        layer.enable_overlay(4);
        let _ = layer.take_change();
        layer.disable_overlay(4);
        layer.disable_overlay(4);
        layer.disable_overlay(4);
        assert!(!layer.is_active());
        assert_eq!(layer.take_change(), Some(false));
        assert_eq!(layer.take_change(), None);
    }

    #[test]
    fn flicker_between_announcements_is_not_reported() {
        let mut layer = LayerSwitch::new();
        layer.enable_overlay(4);
        layer.disable_overlay(4);
        assert_eq!(layer.take_change(), None);
    }
}
