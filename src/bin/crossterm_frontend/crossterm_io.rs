use chip8_core::emulator::framebuffer::{Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use chip8_core::emulator::input::{EmulatorInput, KeyState};
use chip8_core::emulator::output::EmulatorOutput;

use super::key_buffer::KeyBuffer;

use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use std::io::{stdout, Stdout, Write};
use std::sync::Arc;

/// Each pixel is two characters wide to look roughly square.
const CELL_WIDTH: u16 = 2;

/// Offset of the top left pixel, inside the border.
const ORIGIN: (u16, u16) = (2, 2);

pub struct CrosstermInput {
    key_buffer: Arc<KeyBuffer>,
}

impl CrosstermInput {
    pub fn new(key_buffer: Arc<KeyBuffer>) -> CrosstermInput {
        CrosstermInput { key_buffer }
    }
}

impl EmulatorInput for CrosstermInput {
    fn key_state(&mut self) -> KeyState {
        self.key_buffer.state()
    }
}

/// Draws the screen in the alternate screen of the terminal, and rings the bell for sound.
pub struct CrosstermOutput {
    stdout: Stdout,
    shown: Framebuffer,
    sound: bool,
}

impl CrosstermOutput {
    pub fn new() -> crossterm::Result<CrosstermOutput> {
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))?;
        terminal::enable_raw_mode()?;
        draw_border(&mut stdout)?;
        stdout.flush()?;
        Ok(CrosstermOutput {
            stdout,
            shown: Framebuffer::new(),
            sound: false,
        })
    }

    /// Redraw only the pixels that changed since the last frame.
    fn redraw(&mut self, screen: &Framebuffer) -> crossterm::Result<()> {
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                let lit = screen.get(x, y);
                if lit != self.shown.get(x, y) {
                    queue!(
                        self.stdout,
                        cursor::MoveTo(ORIGIN.0 + CELL_WIDTH * x as u16, ORIGIN.1 + y as u16),
                        Print(if lit { "██" } else { "  " })
                    )?;
                }
            }
        }
        self.stdout.flush()?;
        self.shown = screen.clone();
        Ok(())
    }
}

impl Drop for CrosstermOutput {
    fn drop(&mut self) {
        // Nothing left to report errors to
        let _ = terminal::disable_raw_mode();
        let _ = execute!(self.stdout, LeaveAlternateScreen, cursor::Show);
    }
}

impl EmulatorOutput for CrosstermOutput {
    fn present(&mut self, screen: &Framebuffer) {
        if let Err(e) = self.redraw(screen) {
            log::error!("Could not draw the screen: {}", e);
        }
    }

    fn set_sound(&mut self, active: bool) {
        // A terminal can only beep, so beep when the tone starts
        if active && !self.sound {
            if let Err(e) = write!(self.stdout, "\x07").and_then(|_| self.stdout.flush()) {
                log::error!("Could not ring the bell: {}", e);
            }
        }
        self.sound = active;
    }
}

fn draw_border(stdout: &mut Stdout) -> crossterm::Result<()> {
    let bottom = SCREEN_HEIGHT as u16 + ORIGIN.1;
    let right = CELL_WIDTH * SCREEN_WIDTH as u16 + ORIGIN.0;
    let (top, left) = (ORIGIN.1 - 1, ORIGIN.0 - 1);
    for y in top..=bottom {
        for x in left..=right {
            let c = if y == top && x == left {
                '┏'
            } else if y == top && x == right {
                '┓'
            } else if y == bottom && x == left {
                '┗'
            } else if y == bottom && x == right {
                '┛'
            } else if y == top || y == bottom {
                '━'
            } else if x == left || x == right {
                '┃'
            } else {
                continue;
            };
            queue!(stdout, cursor::MoveTo(x, y), Print(c))?;
        }
    }
    Ok(())
}
