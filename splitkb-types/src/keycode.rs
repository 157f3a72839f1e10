use core::fmt;

use crate::modifier::HidModifiers;

/// Usage page of keyboard/keypad keys
pub const HID_USAGE_PAGE_KEYBOARD: u8 = 0x07;

/// An encoded keycode.
///
/// The encoding packs the HID usage and the modifiers implied by the keycode into one `u32`:
///
/// | bits 31..24 | bits 23..16 | bits 15..0 |
/// | --- | --- | --- |
/// | implicit modifiers | usage page | usage id |
///
/// Keycodes which differ only in their implicit modifiers are different keycodes, e.g. [`keys::TILDE`]
/// is `Grave` with an implicit left shift and is not equal to [`keys::GRAVE`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCode(u32);

impl KeyCode {
    pub const fn new(page: u8, id: u16) -> Self {
        Self(((page as u32) << 16) | id as u32)
    }

    /// Keycode in the keyboard/keypad usage page
    pub const fn keyboard(id: u8) -> Self {
        Self::new(HID_USAGE_PAGE_KEYBOARD, id as u16)
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn page(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub const fn id(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub const fn implicit_modifiers(self) -> HidModifiers {
        HidModifiers::from_bits((self.0 >> 24) as u8)
    }

    /// Same keycode with the given implicit modifiers added
    pub const fn with_modifiers(self, modifiers: HidModifiers) -> Self {
        Self(self.0 | ((modifiers.into_bits() as u32) << 24))
    }

    /// Same usage with implicit left shift, the `LS(..)` of keymap notation
    pub const fn shifted(self) -> Self {
        self.with_modifiers(crate::modifier::LSHIFT)
    }

    /// The bare usage, implicit modifiers stripped
    pub const fn usage(self) -> Self {
        Self(self.0 & 0x00FF_FFFF)
    }

    /// Returns `true` if the keycode is one of the eight HID modifier keys
    pub const fn is_modifier(self) -> bool {
        self.page() == HID_USAGE_PAGE_KEYBOARD && self.id() >= 0xE0 && self.id() <= 0xE7
    }

    pub const fn is_shift(self) -> bool {
        self.0 == keys::LEFT_SHIFT.0 || self.0 == keys::RIGHT_SHIFT.0
    }
}

impl fmt::Debug for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mods = self.implicit_modifiers();
        if mods.is_empty() {
            write!(f, "KeyCode({:#04x}:{:#04x})", self.page(), self.id())
        } else {
            write!(f, "KeyCode({:#04x}:{:#04x}+{:#04x})", self.page(), self.id(), mods.into_bits())
        }
    }
}

/// Named keycodes of the keyboard usage page.
///
/// Names follow the symbol printed on a US ANSI key. Shifted symbols (`TILDE`, `AT_SIGN`, ...)
/// carry an implicit left shift.
pub mod keys {
    use super::KeyCode;

    pub const A: KeyCode = KeyCode::keyboard(0x04);
    pub const B: KeyCode = KeyCode::keyboard(0x05);
    pub const C: KeyCode = KeyCode::keyboard(0x06);
    pub const D: KeyCode = KeyCode::keyboard(0x07);
    pub const E: KeyCode = KeyCode::keyboard(0x08);
    pub const F: KeyCode = KeyCode::keyboard(0x09);
    pub const G: KeyCode = KeyCode::keyboard(0x0A);
    pub const H: KeyCode = KeyCode::keyboard(0x0B);
    pub const I: KeyCode = KeyCode::keyboard(0x0C);
    pub const J: KeyCode = KeyCode::keyboard(0x0D);
    pub const K: KeyCode = KeyCode::keyboard(0x0E);
    pub const L: KeyCode = KeyCode::keyboard(0x0F);
    pub const M: KeyCode = KeyCode::keyboard(0x10);
    pub const N: KeyCode = KeyCode::keyboard(0x11);
    pub const O: KeyCode = KeyCode::keyboard(0x12);
    pub const P: KeyCode = KeyCode::keyboard(0x13);
    pub const Q: KeyCode = KeyCode::keyboard(0x14);
    pub const R: KeyCode = KeyCode::keyboard(0x15);
    pub const S: KeyCode = KeyCode::keyboard(0x16);
    pub const T: KeyCode = KeyCode::keyboard(0x17);
    pub const U: KeyCode = KeyCode::keyboard(0x18);
    pub const V: KeyCode = KeyCode::keyboard(0x19);
    pub const W: KeyCode = KeyCode::keyboard(0x1A);
    pub const X: KeyCode = KeyCode::keyboard(0x1B);
    pub const Y: KeyCode = KeyCode::keyboard(0x1C);
    pub const Z: KeyCode = KeyCode::keyboard(0x1D);

    pub const N1: KeyCode = KeyCode::keyboard(0x1E);
    pub const N2: KeyCode = KeyCode::keyboard(0x1F);
    pub const N3: KeyCode = KeyCode::keyboard(0x20);
    pub const N4: KeyCode = KeyCode::keyboard(0x21);
    pub const N5: KeyCode = KeyCode::keyboard(0x22);
    pub const N6: KeyCode = KeyCode::keyboard(0x23);
    pub const N7: KeyCode = KeyCode::keyboard(0x24);
    pub const N8: KeyCode = KeyCode::keyboard(0x25);
    pub const N9: KeyCode = KeyCode::keyboard(0x26);
    pub const N0: KeyCode = KeyCode::keyboard(0x27);

    pub const ENTER: KeyCode = KeyCode::keyboard(0x28);
    pub const ESCAPE: KeyCode = KeyCode::keyboard(0x29);
    pub const BACKSPACE: KeyCode = KeyCode::keyboard(0x2A);
    pub const TAB: KeyCode = KeyCode::keyboard(0x2B);
    pub const SPACE: KeyCode = KeyCode::keyboard(0x2C);
    /// `-` and `_`
    pub const MINUS: KeyCode = KeyCode::keyboard(0x2D);
    /// `=` and `+`
    pub const EQUAL: KeyCode = KeyCode::keyboard(0x2E);
    /// `[` and `{`
    pub const LEFT_BRACKET: KeyCode = KeyCode::keyboard(0x2F);
    /// `]` and `}`
    pub const RIGHT_BRACKET: KeyCode = KeyCode::keyboard(0x30);
    /// `\` and `|`
    pub const BACKSLASH: KeyCode = KeyCode::keyboard(0x31);
    /// Non-US `#` and `~`, `]` and `}` on JIS
    pub const NON_US_HASH: KeyCode = KeyCode::keyboard(0x32);
    /// `;` and `:`
    pub const SEMICOLON: KeyCode = KeyCode::keyboard(0x33);
    /// `'` and `"`
    pub const QUOTE: KeyCode = KeyCode::keyboard(0x34);
    /// `` ` `` and `~`
    pub const GRAVE: KeyCode = KeyCode::keyboard(0x35);
    /// `,` and `<`
    pub const COMMA: KeyCode = KeyCode::keyboard(0x36);
    /// `.` and `>`
    pub const DOT: KeyCode = KeyCode::keyboard(0x37);
    /// `/` and `?`
    pub const SLASH: KeyCode = KeyCode::keyboard(0x38);
    pub const CAPS_LOCK: KeyCode = KeyCode::keyboard(0x39);
    /// Keypad `=`
    pub const KP_EQUAL: KeyCode = KeyCode::keyboard(0x67);
    /// `\` and `_` on JIS (Ro)
    pub const INTERNATIONAL1: KeyCode = KeyCode::keyboard(0x87);
    /// Katakana/Hiragana on JIS
    pub const INTERNATIONAL2: KeyCode = KeyCode::keyboard(0x88);
    /// `¥` and `|` on JIS (Yen)
    pub const INTERNATIONAL3: KeyCode = KeyCode::keyboard(0x89);
    /// Henkan on JIS
    pub const INTERNATIONAL4: KeyCode = KeyCode::keyboard(0x8A);
    /// Muhenkan on JIS
    pub const INTERNATIONAL5: KeyCode = KeyCode::keyboard(0x8B);

    pub const LEFT_CTRL: KeyCode = KeyCode::keyboard(0xE0);
    pub const LEFT_SHIFT: KeyCode = KeyCode::keyboard(0xE1);
    pub const LEFT_ALT: KeyCode = KeyCode::keyboard(0xE2);
    pub const LEFT_GUI: KeyCode = KeyCode::keyboard(0xE3);
    pub const RIGHT_CTRL: KeyCode = KeyCode::keyboard(0xE4);
    pub const RIGHT_SHIFT: KeyCode = KeyCode::keyboard(0xE5);
    pub const RIGHT_ALT: KeyCode = KeyCode::keyboard(0xE6);
    pub const RIGHT_GUI: KeyCode = KeyCode::keyboard(0xE7);

    pub const EXCLAMATION: KeyCode = N1.shifted();
    pub const AT_SIGN: KeyCode = N2.shifted();
    pub const HASH: KeyCode = N3.shifted();
    pub const DOLLAR: KeyCode = N4.shifted();
    pub const PERCENT: KeyCode = N5.shifted();
    pub const CARET: KeyCode = N6.shifted();
    pub const AMPERSAND: KeyCode = N7.shifted();
    pub const ASTERISK: KeyCode = N8.shifted();
    pub const LEFT_PAREN: KeyCode = N9.shifted();
    pub const RIGHT_PAREN: KeyCode = N0.shifted();
    pub const UNDERSCORE: KeyCode = MINUS.shifted();
    pub const PLUS: KeyCode = EQUAL.shifted();
    pub const LEFT_BRACE: KeyCode = LEFT_BRACKET.shifted();
    pub const RIGHT_BRACE: KeyCode = RIGHT_BRACKET.shifted();
    pub const PIPE: KeyCode = BACKSLASH.shifted();
    pub const COLON: KeyCode = SEMICOLON.shifted();
    pub const DOUBLE_QUOTE: KeyCode = QUOTE.shifted();
    pub const TILDE: KeyCode = GRAVE.shifted();
}
