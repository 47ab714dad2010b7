//! Immutable snapshots of input occurrences. The host shell translates its
//! native events into these and hands them to `ScreenService::invoke_*`;
//! from there they travel through the event queues untouched.

use std::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;

use crate::Vec2;

/// One touch (or pointer) occurrence at an absolute position.
///
/// The stop-propagation flag is settable once per dispatch hop through a
/// shared reference and is never reset; each hop of the dispatch derives a
/// fresh copy via [`TouchState::next_target`].
#[derive(Debug)]
pub struct TouchState {
    position: Vec2,
    stop: AtomicBool,
}

impl TouchState {
    pub fn new(position: Vec2) -> Self {
        TouchState {
            position,
            stop: AtomicBool::new(false),
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        TouchState::new(Vec2::new(x, y))
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Derives the state a child hop receives. Identity on the position for
    /// now; this is the hook where a coordinate-space transform (camera,
    /// scroll offset) would be applied. The flag starts cleared.
    pub fn next_target(&self) -> TouchState {
        TouchState::new(self.position)
    }

    pub fn stop_propagation(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_propagation(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

impl Clone for TouchState {
    fn clone(&self) -> Self {
        TouchState {
            position: self.position,
            stop: AtomicBool::new(self.stop.load(Ordering::Relaxed)),
        }
    }
}

bitflags! {
    /// Packed key data: modifier bits in the high half, key code in the
    /// low 16 bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Keys: u32 {
        const SHIFT = 0x0001_0000;
        const CONTROL = 0x0002_0000;
        const ALT = 0x0004_0000;
        const MODIFIERS = 0xFFFF_0000;
        const KEY_CODE = 0x0000_FFFF;
    }
}

impl Keys {
    pub fn from_code(code: KeyCode) -> Keys {
        Keys::from_bits_retain(code as u32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum KeyCode {
    #[default]
    None = 0,
    Back = 8,
    Tab = 9,
    Enter = 13,
    Escape = 27,
    Space = 32,
    Left = 37,
    Up = 38,
    Right = 39,
    Down = 40,
}

impl KeyCode {
    /// Key codes are discontiguous; anything unmapped collapses to `None`.
    pub fn from_value(value: u32) -> KeyCode {
        match value {
            8 => KeyCode::Back,
            9 => KeyCode::Tab,
            13 => KeyCode::Enter,
            27 => KeyCode::Escape,
            32 => KeyCode::Space,
            37 => KeyCode::Left,
            38 => KeyCode::Up,
            39 => KeyCode::Right,
            40 => KeyCode::Down,
            _ => KeyCode::None,
        }
    }
}

/// A key going down or up, with the modifier state folded in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardState {
    keys: Keys,
}

impl KeyboardState {
    pub fn new(keys: Keys) -> Self {
        KeyboardState { keys }
    }

    pub fn keys(&self) -> Keys {
        self.keys
    }

    pub fn shift(&self) -> bool {
        self.keys.contains(Keys::SHIFT)
    }

    pub fn control(&self) -> bool {
        self.keys.contains(Keys::CONTROL)
    }

    pub fn alt(&self) -> bool {
        self.keys.contains(Keys::ALT)
    }

    pub fn modifiers(&self) -> Keys {
        Keys::from_bits_retain(self.keys.bits() & Keys::MODIFIERS.bits())
    }

    pub fn key_value(&self) -> u32 {
        self.keys.bits() & Keys::KEY_CODE.bits()
    }

    pub fn key_code(&self) -> KeyCode {
        KeyCode::from_value(self.key_value())
    }
}

/// A translated character press (text input), as opposed to a raw key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress {
    pub ch: char,
}

impl KeyPress {
    pub fn new(ch: char) -> Self {
        KeyPress { ch }
    }
}
