//! Remap tables.
//!
//! A table is plain data: one [`RemapEntry`] per source keycode, with one substitute for each Shift state.

use splitkb_types::keycode::KeyCode;
use splitkb_types::keycode::keys::*;

/// What a source keycode is replaced with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Substitute {
    pub keycode: KeyCode,
    /// The host must see Shift held while `keycode` is pressed
    pub shift: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemapEntry {
    pub source: KeyCode,
    /// Used when a physical Shift is held at press time
    pub when_shifted: Substitute,
    /// Used when no physical Shift is held at press time
    pub when_unshifted: Substitute,
}

impl RemapEntry {
    pub const fn new(source: KeyCode, when_shifted: (KeyCode, bool), when_unshifted: (KeyCode, bool)) -> Self {
        Self {
            source,
            when_shifted: Substitute {
                keycode: when_shifted.0,
                shift: when_shifted.1,
            },
            when_unshifted: Substitute {
                keycode: when_unshifted.0,
                shift: when_unshifted.1,
            },
        }
    }

    /// The substitute for the given Shift state
    pub fn resolve(&self, shift_active: bool) -> Substitute {
        if shift_active {
            self.when_shifted
        } else {
            self.when_unshifted
        }
    }
}

/// Find the entry for `keycode`, the match is exact including implicit modifiers
pub fn lookup(table: &[RemapEntry], keycode: KeyCode) -> Option<&RemapEntry> {
    table.iter().find(|entry| entry.source == keycode)
}

/// Returns `true` if no source keycode appears twice
pub fn has_unique_sources(table: &[RemapEntry]) -> bool {
    table
        .iter()
        .enumerate()
        .all(|(i, entry)| table[i + 1..].iter().all(|other| other.source != entry.source))
}

const SHIFT: bool = true;
const PLAIN: bool = false;

/// A keyboard printed with US legends, typing on a host configured for the JIS layout.
///
/// Every substitute names the JIS key (by its HID usage) which produces the US legend's symbol.
pub static US_ON_JIS: &[RemapEntry] = &[
    // Number row
    RemapEntry::new(N2, (LEFT_BRACKET, PLAIN), (N2, PLAIN)),
    RemapEntry::new(N6, (EQUAL, PLAIN), (N6, PLAIN)),
    RemapEntry::new(N7, (N6, SHIFT), (N7, PLAIN)),
    RemapEntry::new(N8, (QUOTE, SHIFT), (N8, PLAIN)),
    RemapEntry::new(N9, (N8, SHIFT), (N9, PLAIN)),
    RemapEntry::new(N0, (N9, SHIFT), (N0, PLAIN)),
    RemapEntry::new(MINUS, (INTERNATIONAL1, SHIFT), (MINUS, PLAIN)),
    RemapEntry::new(EQUAL, (SEMICOLON, SHIFT), (MINUS, SHIFT)),
    // Brackets and punctuation
    RemapEntry::new(LEFT_BRACKET, (RIGHT_BRACKET, SHIFT), (RIGHT_BRACKET, PLAIN)),
    RemapEntry::new(RIGHT_BRACKET, (NON_US_HASH, SHIFT), (NON_US_HASH, PLAIN)),
    RemapEntry::new(BACKSLASH, (INTERNATIONAL3, SHIFT), (INTERNATIONAL1, PLAIN)),
    RemapEntry::new(SEMICOLON, (QUOTE, PLAIN), (SEMICOLON, PLAIN)),
    RemapEntry::new(QUOTE, (N2, SHIFT), (N7, SHIFT)),
    RemapEntry::new(GRAVE, (EQUAL, SHIFT), (LEFT_BRACKET, SHIFT)),
    // Shifted symbols bound directly in the keymap
    RemapEntry::new(TILDE, (EQUAL, SHIFT), (EQUAL, SHIFT)),
    RemapEntry::new(AT_SIGN, (LEFT_BRACKET, PLAIN), (LEFT_BRACKET, PLAIN)),
    RemapEntry::new(CARET, (EQUAL, PLAIN), (EQUAL, PLAIN)),
    RemapEntry::new(AMPERSAND, (N6, SHIFT), (N6, SHIFT)),
    RemapEntry::new(ASTERISK, (QUOTE, SHIFT), (QUOTE, SHIFT)),
    RemapEntry::new(LEFT_PAREN, (N8, SHIFT), (N8, SHIFT)),
    RemapEntry::new(RIGHT_PAREN, (N9, SHIFT), (N9, SHIFT)),
    RemapEntry::new(UNDERSCORE, (INTERNATIONAL1, SHIFT), (INTERNATIONAL1, SHIFT)),
    RemapEntry::new(PLUS, (SEMICOLON, SHIFT), (SEMICOLON, SHIFT)),
    RemapEntry::new(LEFT_BRACE, (RIGHT_BRACKET, SHIFT), (RIGHT_BRACKET, SHIFT)),
    RemapEntry::new(RIGHT_BRACE, (NON_US_HASH, SHIFT), (NON_US_HASH, SHIFT)),
    RemapEntry::new(PIPE, (INTERNATIONAL3, SHIFT), (INTERNATIONAL3, SHIFT)),
    RemapEntry::new(COLON, (QUOTE, PLAIN), (QUOTE, PLAIN)),
    RemapEntry::new(DOUBLE_QUOTE, (N2, SHIFT), (N2, SHIFT)),
    RemapEntry::new(KP_EQUAL, (MINUS, SHIFT), (MINUS, SHIFT)),
    RemapEntry::new(COMMA, (COMMA, PLAIN), (COMMA, PLAIN)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_on_jis_sources_are_unique() {
        assert!(has_unique_sources(US_ON_JIS));
    }

    #[test]
    fn test_lookup_is_exact() {
        let entry = lookup(US_ON_JIS, GRAVE).unwrap();
        assert_eq!(entry.resolve(false), Substitute {
            keycode: LEFT_BRACKET,
            shift: true
        });

        // Tilde is grave with implicit shift, and has its own entry
        let entry = lookup(US_ON_JIS, TILDE).unwrap();
        assert_eq!(entry.resolve(false).keycode, EQUAL);

        assert!(lookup(US_ON_JIS, A).is_none());
        assert!(lookup(US_ON_JIS, CAPS_LOCK).is_none());
    }

    #[test]
    fn test_duplicate_sources_are_detected() {
        let table = [
            RemapEntry::new(N2, (N2, PLAIN), (N2, PLAIN)),
            RemapEntry::new(N3, (N3, PLAIN), (N3, PLAIN)),
            RemapEntry::new(N2, (N4, PLAIN), (N4, PLAIN)),
        ];
        assert!(!has_unique_sources(&table));
        assert!(has_unique_sources(&table[..2]));
    }
}
