use splitkb_types::modifier::HidModifiers;

/// Physical state of the two Shift keys.
///
/// Only Shift events from the key matrix are recorded here, never the Shift events the remap engine emits itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShiftState {
    left: bool,
    right: bool,
}

impl ShiftState {
    pub const fn new() -> Self {
        Self {
            left: false,
            right: false,
        }
    }

    pub fn set_left(&mut self, pressed: bool) {
        self.left = pressed;
    }

    pub fn set_right(&mut self, pressed: bool) {
        self.right = pressed;
    }

    pub fn left(&self) -> bool {
        self.left
    }

    pub fn right(&self) -> bool {
        self.right
    }

    /// Either side is held
    pub fn is_active(&self) -> bool {
        self.left || self.right
    }

    /// The held sides as HID modifier bits
    pub fn modifiers(&self) -> HidModifiers {
        HidModifiers::new().with_left_shift(self.left).with_right_shift(self.right)
    }
}
