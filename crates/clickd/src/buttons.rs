use bitflags::bitflags;
use evdev::Key;

/// The three extra buttons the click layer multiplexes onto the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappedButton {
    Btn1,
    Btn2,
    Btn3,
}

impl MappedButton {
    pub const ALL: [MappedButton; 3] = [MappedButton::Btn1, MappedButton::Btn2, MappedButton::Btn3];

    pub fn bit(self) -> MappedButtons {
        match self {
            MappedButton::Btn1 => MappedButtons::BTN1,
            MappedButton::Btn2 => MappedButtons::BTN2,
            MappedButton::Btn3 => MappedButtons::BTN3,
        }
    }

    /// Pointer button this identity is reported as.
    pub fn key(self) -> Key {
        match self {
            MappedButton::Btn1 => Key::BTN_LEFT,
            MappedButton::Btn2 => Key::BTN_RIGHT,
            MappedButton::Btn3 => Key::BTN_MIDDLE,
        }
    }
}

bitflags! {
    /// Buttons held through the click layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MappedButtons: u8 {
        const BTN1 = 1 << 0;
        const BTN2 = 1 << 1;
        const BTN3 = 1 << 2;
    }
}

bitflags! {
    /// Buttons held on the pointing device itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NativeButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

impl NativeButtons {
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::BTN_LEFT => Some(NativeButtons::LEFT),
            Key::BTN_RIGHT => Some(NativeButtons::RIGHT),
            Key::BTN_MIDDLE => Some(NativeButtons::MIDDLE),
            _ => None,
        }
    }
}

/// Button half of the pointer report. The click layer only ever writes
/// `mapped`; `native` mirrors the physical pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonReport {
    pub native: NativeButtons,
    pub mapped: MappedButtons,
}

impl ButtonReport {
    /// Pressed state of each emitted pointer button: native OR mapped.
    pub fn key_states(&self) -> [(Key, bool); 3] {
        MappedButton::ALL.map(|button| {
            let key = button.key();
            let native = NativeButtons::from_key(key).map_or(false, |n| self.native.contains(n));
            (key, native || self.mapped.contains(button.bit()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(report: &ButtonReport, key: Key) -> bool {
        report.key_states().iter().find(|(k, _)| *k == key).map(|(_, p)| *p).unwrap()
    }

    #[test]
    fn mapped_bits_are_contiguous_from_zero() {
        assert_eq!(MappedButton::Btn1.bit().bits(), 0b001);
        assert_eq!(MappedButton::Btn2.bit().bits(), 0b010);
        assert_eq!(MappedButton::Btn3.bit().bits(), 0b100);
        assert_eq!(MappedButtons::all().bits(), 0b111);
    }

    #[test]
    fn every_identity_has_a_distinct_bit_and_key() {
        for (i, a) in MappedButton::ALL.iter().enumerate() {
            for b in &MappedButton::ALL[i + 1..] {
                assert!(!a.bit().intersects(b.bit()));
                assert_ne!(a.key(), b.key());
            }
        }
    }

    #[test]
    fn native_buttons_resolve_from_pointer_keys() {
        assert_eq!(NativeButtons::from_key(Key::BTN_LEFT), Some(NativeButtons::LEFT));
        assert_eq!(NativeButtons::from_key(Key::BTN_MIDDLE), Some(NativeButtons::MIDDLE));
        assert_eq!(NativeButtons::from_key(Key::BTN_SIDE), None);
        assert_eq!(NativeButtons::from_key(Key::KEY_J), None);
    }

    #[test]
    fn empty_report_has_nothing_pressed() {
        let report = ButtonReport::default();
        assert!(report.key_states().iter().all(|(_, p)| !p));
    }

    #[test]
    fn emitted_state_is_native_or_mapped() {
        let mut report = ButtonReport::default();
        report.mapped.insert(MappedButtons::BTN1);
        report.native.insert(NativeButtons::RIGHT);
        assert!(pressed(&report, Key::BTN_LEFT));
        assert!(pressed(&report, Key::BTN_RIGHT));
        assert!(!pressed(&report, Key::BTN_MIDDLE));

        // Releasing the mapped bit leaves the native hold alone
        report.mapped.remove(MappedButtons::BTN1);
        report.native.insert(NativeButtons::LEFT);
        assert!(pressed(&report, Key::BTN_LEFT));
    }
}
