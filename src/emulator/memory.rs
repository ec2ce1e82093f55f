//! The 4 KiB address space.
//!
//! `0x000..0x200` belongs to the interpreter and holds the font,
//! programs are loaded at `0x200` and may freely modify themselves.

use super::error::{Error, Result};

pub const MEM_SIZE: usize = 4096;
pub const PROGRAM_START: usize = 0x200;
pub const FONT_START: usize = 0x000;
pub const FONT_SPRITE_LEN: usize = 5;

const FONT: [u8; 16 * FONT_SPRITE_LEN] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Address of the font sprite for the hex digit in the low nibble of `digit`.
pub fn font_address(digit: u8) -> u16 {
    (FONT_START + (digit & 0x0F) as usize * FONT_SPRITE_LEN) as u16
}

#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEM_SIZE],
}

impl Memory {
    /// Zeroed memory with the font in place.
    pub fn new() -> Memory {
        let mut bytes = [0; MEM_SIZE];
        bytes[FONT_START..FONT_START + FONT.len()].copy_from_slice(&FONT);
        Memory { bytes }
    }

    /// Copy a program into memory at 0x200.
    /// Nothing is written if the program does not fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        let max = MEM_SIZE - PROGRAM_START;
        if program.len() > max {
            return Err(Error::LoadTooLarge {
                size: program.len(),
                max,
            });
        }
        self.bytes[PROGRAM_START..PROGRAM_START + program.len()].copy_from_slice(program);
        Ok(())
    }

    pub fn read(&self, addr: usize) -> Result<u8> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(Error::OutOfRangeAddress { addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        let byte = self
            .bytes
            .get_mut(addr)
            .ok_or(Error::OutOfRangeAddress { addr })?;
        *byte = value;
        Ok(())
    }

    /// Read the big-endian instruction word at `addr`.
    pub fn read_word(&self, addr: usize) -> Result<u16> {
        let [high, low] = [self.read(addr)?, self.read(addr + 1)?];
        Ok(u16::from(high) << 8 | u16::from(low))
    }

    /// `len` bytes starting at `addr`, or the first address past the end.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        check_range(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    /// Copy `values` into memory at `addr`. Nothing is written if any byte would fall outside.
    pub fn write_slice(&mut self, addr: usize, values: &[u8]) -> Result<()> {
        check_range(addr, values.len())?;
        self.bytes[addr..addr + values.len()].copy_from_slice(values);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(addr: usize, len: usize) -> Result<()> {
    if addr + len > MEM_SIZE {
        let addr = addr.max(MEM_SIZE);
        return Err(Error::OutOfRangeAddress { addr });
    }
    Ok(())
}
