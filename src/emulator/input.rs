use std::fmt;

pub const NUM_KEYS: u8 = 16;

/// Which of the 16 hex keys are held down, one bit per key.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState(pub u16);

impl KeyState {
    pub const NONE: KeyState = KeyState(0);

    /// Whether the key in the low nibble of `key` is held.
    pub fn pressed(self, key: u8) -> bool {
        ((self.0 >> (key & 0x0F)) & 1) == 1
    }

    pub fn press(&mut self, key: u8) {
        self.0 |= 1u16 << (key & 0x0F);
    }

    pub fn release(&mut self, key: u8) {
        self.0 &= !(1u16 << (key & 0x0F));
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The lowest numbered key being held, if any.
    pub fn lowest_pressed(self) -> Option<u8> {
        (0..NUM_KEYS).find(|key| self.pressed(*key))
    }
}

impl fmt::Debug for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyState({:#018b})", self.0)
    }
}

/// Represents an input device that reports which of the keys 0..0xF are held.
pub trait EmulatorInput {
    /// Polled once per cycle, before the instruction is fetched.
    fn key_state(&mut self) -> KeyState;
}

/// An input device that never provides any input
pub struct DummyInput;

impl EmulatorInput for DummyInput {
    fn key_state(&mut self) -> KeyState {
        KeyState::NONE
    }
}

/// An input device reporting whatever keys it was last told to hold.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedInput(pub KeyState);

impl EmulatorInput for FixedInput {
    fn key_state(&mut self) -> KeyState {
        self.0
    }
}
