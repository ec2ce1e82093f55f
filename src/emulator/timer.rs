/// The delay and sound timers.
///
/// Both count down by one per [`Timers::tick`] until they reach zero.
/// The caller decides how often to tick, 60 times per second on real hardware.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Timers {
        Timers::default()
    }

    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// A tone should be playing while the sound timer is nonzero.
    pub fn sound_active(&self) -> bool {
        self.sound > 0
    }
}
