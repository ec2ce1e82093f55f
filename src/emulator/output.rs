use super::framebuffer::Framebuffer;

/// Represents somewhere the screen can be shown and a tone played.
///
/// The emulator never pushes frames itself, whoever drives it
/// hands the current screen over once per frame.
pub trait EmulatorOutput {
    fn present(&mut self, screen: &Framebuffer);

    /// Called once per frame with whether the sound timer is running.
    fn set_sound(&mut self, _active: bool) {}
}

/// A simple output device that keeps the last presented frame around.
#[derive(Debug, Default)]
pub struct DummyOutput {
    pub last_frame: Option<Framebuffer>,
    pub frames: usize,
    pub sound: bool,
}

impl DummyOutput {
    pub fn new() -> DummyOutput {
        DummyOutput::default()
    }
}

impl EmulatorOutput for DummyOutput {
    fn present(&mut self, screen: &Framebuffer) {
        self.last_frame = Some(screen.clone());
        self.frames += 1;
    }

    fn set_sound(&mut self, active: bool) {
        self.sound = active;
    }
}
