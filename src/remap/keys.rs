//! Key code and modifier definitions
//!
//! Key codes are macOS virtual key codes (hardware positions on an ANSI
//! layout, from `Events.h`), not characters.

use std::fmt;

/// A hardware key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const H: KeyCode = KeyCode(0x04);
    pub const J: KeyCode = KeyCode(0x26);
    pub const K: KeyCode = KeyCode(0x28);
    pub const L: KeyCode = KeyCode(0x25);

    pub const LEFT_ARROW: KeyCode = KeyCode(0x7B);
    pub const RIGHT_ARROW: KeyCode = KeyCode(0x7C);
    pub const DOWN_ARROW: KeyCode = KeyCode(0x7D);
    pub const UP_ARROW: KeyCode = KeyCode(0x7E);

    /// Convert the raw integer field of an OS event.
    ///
    /// Values outside the `u16` range do not name a key.
    pub fn from_raw(raw: i64) -> Option<Self> {
        u16::try_from(raw).ok().map(KeyCode)
    }

    pub fn to_raw(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Modifier flag masks from macOS CGEventFlags
#[cfg(target_os = "macos")]
pub mod flags {
    use core_graphics::event::CGEventFlags;

    /// Command key modifier flag
    pub const COMMAND: CGEventFlags = CGEventFlags::CGEventFlagCommand;
    /// Control key modifier flag
    pub const CONTROL: CGEventFlags = CGEventFlags::CGEventFlagControl;
    /// Option/Alt key modifier flag
    pub const OPTION: CGEventFlags = CGEventFlags::CGEventFlagAlternate;
    /// Shift key modifier flag
    pub const SHIFT: CGEventFlags = CGEventFlags::CGEventFlagShift;
}

/// Modifier keys held during a key event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    /// Command key is held
    pub command: bool,
    /// Control key is held
    pub control: bool,
    /// Option/Alt key is held
    pub option: bool,
    /// Shift key is held
    pub shift: bool,
}

impl ModifierState {
    /// Create a new ModifierState from CGEventFlags
    #[cfg(target_os = "macos")]
    pub fn from_flags(cg: core_graphics::event::CGEventFlags) -> Self {
        Self {
            command: cg.contains(flags::COMMAND),
            control: cg.contains(flags::CONTROL),
            option: cg.contains(flags::OPTION),
            shift: cg.contains(flags::SHIFT),
        }
    }

    /// Write the tracked modifiers into `cg`, leaving every other bit alone
    #[cfg(target_os = "macos")]
    pub fn apply_to(self, cg: &mut core_graphics::event::CGEventFlags) {
        cg.set(flags::COMMAND, self.command);
        cg.set(flags::CONTROL, self.control);
        cg.set(flags::OPTION, self.option);
        cg.set(flags::SHIFT, self.shift);
    }

    /// Command held without Control or Option. Shift does not matter.
    pub fn activates_remap(&self) -> bool {
        self.command && !self.control && !self.option
    }

    /// Same state with Command released
    pub fn without_command(self) -> Self {
        Self {
            command: false,
            ..self
        }
    }
}
