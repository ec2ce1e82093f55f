use chip8_core::emulator::input::{KeyState, NUM_KEYS};
use std::{
    sync::{Mutex, MutexGuard},
    time::{Duration, Instant},
};

/// A thread-safe record of when each hex key was last pressed.
///
/// Terminals only report presses, not releases, so a key counts as held
/// for `timeout` after its latest press. Key repeat keeps it held while it is down.
/// Wrap it in an `std::sync::Arc` to share it between the listener and the emulator.
pub struct KeyBuffer {
    timeout: Duration,
    last_pressed: Mutex<[Option<Instant>; NUM_KEYS as usize]>,
}

impl KeyBuffer {
    /// Create a new `KeyBuffer`, forgetting keypresses that are older than `timeout`.
    pub fn new(timeout: Duration) -> KeyBuffer {
        KeyBuffer {
            timeout,
            last_pressed: Mutex::new([None; NUM_KEYS as usize]),
        }
    }

    /// Record a press of the key in the low nibble of `key`.
    pub fn press(&self, key: u8) {
        self.lock()[(key & 0x0F) as usize] = Some(Instant::now());
    }

    /// The keys pressed recently enough to still count as held.
    pub fn state(&self) -> KeyState {
        let last_pressed = self.lock();
        let mut state = KeyState::NONE;
        for (key, timestamp) in last_pressed.iter().enumerate() {
            if let Some(timestamp) = timestamp {
                if timestamp.elapsed() < self.timeout {
                    state.press(key as u8);
                }
            }
        }
        state
    }

    // A panicking listener leaves nothing half-written behind
    fn lock(&self) -> MutexGuard<'_, [Option<Instant>; NUM_KEYS as usize]> {
        self.last_pressed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
