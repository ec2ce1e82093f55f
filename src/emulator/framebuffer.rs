use std::fmt;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The 64x32 monochrome screen, stored row-major so that `(x, y)` lives at `x + 64 * y`.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [bool; SCREEN_WIDTH * SCREEN_HEIGHT],
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            pixels: [false; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [false; SCREEN_WIDTH * SCREEN_HEIGHT];
    }

    /// The pixel at `(x, y)`, off for anything outside the screen.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < SCREEN_WIDTH && y < SCREEN_HEIGHT && self.pixels[x + SCREEN_WIDTH * y]
    }

    /// XOR a sprite onto the screen with its top left corner at `(x, y)`.
    /// Each byte is one row, most significant bit leftmost.
    /// Pixels falling outside the screen are clipped.
    /// Returns true if any pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (dy, row) in sprite.iter().enumerate() {
            let py = y + dy;
            if py >= SCREEN_HEIGHT {
                break;
            }
            for dx in 0..8 {
                let px = x + dx;
                if px >= SCREEN_WIDTH {
                    break;
                }
                if (row >> (7 - dx)) & 1 == 0 {
                    continue;
                }
                let pixel = &mut self.pixels[px + SCREEN_WIDTH * py];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        collision
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(SCREEN_WIDTH)
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for pixel in row {
                write!(f, "{}", if *pixel { "#" } else { " " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|p| if *p { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
