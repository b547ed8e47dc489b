/// Key names accepted in the `[buttons]` config section, with their evdev
/// key codes from Linux input-event-codes.h.
/// NOTE: These are physical QWERTY positions. A key bound as "j" is the key
/// that sits where J is on a QWERTY board, whatever the active layout.
const KEYS: &[(&str, u16)] = &[
    ("esc", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("minus", 12),
    ("equal", 13),
    ("backspace", 14),
    ("tab", 15),
    ("q", 16),
    ("w", 17),
    ("e", 18),
    ("r", 19),
    ("t", 20),
    ("y", 21),
    ("u", 22),
    ("i", 23),
    ("o", 24),
    ("p", 25),
    ("leftbrace", 26),
    ("rightbrace", 27),
    ("enter", 28),
    ("a", 30),
    ("s", 31),
    ("d", 32),
    ("f", 33),
    ("g", 34),
    ("h", 35),
    ("j", 36),
    ("k", 37),
    ("l", 38),
    ("semicolon", 39),
    ("apostrophe", 40),
    ("grave", 41),
    ("backslash", 43),
    ("z", 44),
    ("x", 45),
    ("c", 46),
    ("v", 47),
    ("b", 48),
    ("n", 49),
    ("m", 50),
    ("comma", 51),
    ("dot", 52),
    ("slash", 53),
    ("space", 57),
];

/// Resolve a key name to its evdev key code.
/// Case-insensitive; an optional `KEY_` prefix is accepted ("KEY_J" == "j").
pub fn key_code(name: &str) -> Option<u16> {
    let lower = name.trim().to_ascii_lowercase();
    let bare = lower.strip_prefix("key_").unwrap_or(&lower);
    KEYS.iter()
        .find(|(key, _)| *key == bare)
        .map(|(_, code)| *code)
}

/// Reverse lookup, used for logging and status output.
pub fn key_name(code: u16) -> Option<&'static str> {
    KEYS.iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- names resolve to evdev codes ---

    #[test]
    fn letters_map_to_qwerty_codes() {
        // evdev keycodes: A=30, E=18, J=36, K=37, L=38, Z=44
        assert_eq!(key_code("a"), Some(30));
        assert_eq!(key_code("e"), Some(18));
        assert_eq!(key_code("j"), Some(36));
        assert_eq!(key_code("k"), Some(37));
        assert_eq!(key_code("l"), Some(38));
        assert_eq!(key_code("z"), Some(44));
    }

    #[test]
    fn digits_map_to_number_row() {
        for (name, expected) in ["1", "2", "3", "4", "5", "6", "7", "8", "9"]
            .iter()
            .zip(2u16..=10)
        {
            assert_eq!(key_code(name), Some(expected));
        }
        assert_eq!(key_code("0"), Some(11));
    }

    #[test]
    fn lookup_is_case_insensitive_and_accepts_prefix() {
        assert_eq!(key_code("J"), Some(36));
        assert_eq!(key_code("KEY_J"), Some(36));
        assert_eq!(key_code("key_semicolon"), Some(39));
        assert_eq!(key_code("  l "), Some(38));
    }

    #[test]
    fn unknown_names_return_none() {
        assert_eq!(key_code(""), None);
        assert_eq!(key_code("key_"), None);
        assert_eq!(key_code("hyper"), None);
        assert_eq!(key_code("f13"), None);
    }

    // --- reverse lookup ---

    #[test]
    fn key_name_round_trips_for_every_entry() {
        for (name, code) in KEYS {
            assert_eq!(key_name(*code), Some(*name));
            assert_eq!(key_code(name), Some(*code));
        }
    }

    #[test]
    fn key_name_returns_none_for_unmapped_codes() {
        assert_eq!(key_name(0), None);
        assert_eq!(key_name(29), None); // KEY_LEFTCTRL
        assert_eq!(key_name(272), None); // BTN_LEFT
    }

    #[test]
    fn table_has_no_duplicate_codes() {
        for (i, (_, a)) in KEYS.iter().enumerate() {
            for (_, b) in &KEYS[i + 1..] {
                assert_ne!(a, b, "duplicate code {}", a);
            }
        }
    }
}
