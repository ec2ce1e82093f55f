use std::fmt;

use super::error::{Error, Result};
use crate::util::bit_splitter::BitSplitter;

/// A wrapper for addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr(pub u16);

/// A wrapper for registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reg(pub u8);

/// A wrapper for constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Const(pub u8);

/// A single instruction from the CHIP-8 instruction set.
/// Two bytes written in hexadecimal, with the following special characters:
/// - NNN: address
/// - NN: 8-bit constant
/// - N: 4-bit constant
/// - X and Y: 4-bit register identifier
/// - PC: Program counter
/// - I: 16 bit register for memory address
/// - VN: One of the 16 available variables (register identifiers)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    ClearScreen,                  // 00E0
    Return,                       // 00EE
    Jump(Addr),                   // 1NNN
    Call(Addr),                   // 2NNN
    SkipIfRegEqConst(Reg, Const), // 3XNN
    SkipIfRegNeqConst(Reg, Const), // 4XNN
    SkipIfRegEqReg(Reg, Reg),     // 5XY0
    SetRegToConst(Reg, Const),    // 6XNN
    AddConstToReg(Reg, Const),    // 7XNN
    SetRegToReg(Reg, Reg),        // 8XY0
    Or(Reg, Reg),                 // 8XY1
    And(Reg, Reg),                // 8XY2
    Xor(Reg, Reg),                // 8XY3
    AddRegToReg(Reg, Reg),        // 8XY4
    SubRegFromReg(Reg, Reg),      // 8XY5
    ShiftRight(Reg, Reg),         // 8XY6
    SubRegFromRegReversed(Reg, Reg), // 8XY7
    ShiftLeft(Reg, Reg),          // 8XYE
    SkipIfRegNeqReg(Reg, Reg),    // 9XY0
    SetIndex(Addr),               // ANNN
    JumpWithOffset(Addr),         // BNNN
    Random(Reg, Const),           // CXNN
    Draw(Reg, Reg, Const),        // DXYN
    SkipIfKeyPressed(Reg),        // EX9E
    SkipIfKeyNotPressed(Reg),     // EXA1
    GetDelayTimer(Reg),           // FX07
    WaitForKey(Reg),              // FX0A
    SetDelayTimer(Reg),           // FX15
    SetSoundTimer(Reg),           // FX18
    AddRegToIndex(Reg),           // FX1E
    SetIndexToFontChar(Reg),      // FX29
    StoreBcd(Reg),                // FX33
    StoreRegisters(Reg),          // FX55
    LoadRegisters(Reg),           // FX65
}

impl Instruction {
    /// Decode an instruction word.
    /// Words that match no instruction give `Error::UnknownOpcode`.
    pub fn decode(word: u16) -> Result<Instruction> {
        Instruction::from_fields(BitSplitter::from_u16(word))
    }

    fn from_fields(opcode: BitSplitter) -> Result<Instruction> {
        let addr = Addr(opcode.nnn());
        let nn = Const(opcode.nn());
        let instruction = match opcode.as_four_u8() {
            (0, 0, 0xE, 0) => Instruction::ClearScreen,
            (0, 0, 0xE, 0xE) => Instruction::Return,
            (1, _, _, _) => Instruction::Jump(addr),
            (2, _, _, _) => Instruction::Call(addr),
            (3, x, _, _) => Instruction::SkipIfRegEqConst(Reg(x), nn),
            (4, x, _, _) => Instruction::SkipIfRegNeqConst(Reg(x), nn),
            (5, x, y, 0) => Instruction::SkipIfRegEqReg(Reg(x), Reg(y)),
            (6, x, _, _) => Instruction::SetRegToConst(Reg(x), nn),
            (7, x, _, _) => Instruction::AddConstToReg(Reg(x), nn),
            (8, x, y, 0) => Instruction::SetRegToReg(Reg(x), Reg(y)),
            (8, x, y, 1) => Instruction::Or(Reg(x), Reg(y)),
            (8, x, y, 2) => Instruction::And(Reg(x), Reg(y)),
            (8, x, y, 3) => Instruction::Xor(Reg(x), Reg(y)),
            (8, x, y, 4) => Instruction::AddRegToReg(Reg(x), Reg(y)),
            (8, x, y, 5) => Instruction::SubRegFromReg(Reg(x), Reg(y)),
            (8, x, y, 6) => Instruction::ShiftRight(Reg(x), Reg(y)),
            (8, x, y, 7) => Instruction::SubRegFromRegReversed(Reg(x), Reg(y)),
            (8, x, y, 0xE) => Instruction::ShiftLeft(Reg(x), Reg(y)),
            (9, x, y, 0) => Instruction::SkipIfRegNeqReg(Reg(x), Reg(y)),
            (0xA, _, _, _) => Instruction::SetIndex(addr),
            (0xB, _, _, _) => Instruction::JumpWithOffset(addr),
            (0xC, x, _, _) => Instruction::Random(Reg(x), nn),
            (0xD, x, y, n) => Instruction::Draw(Reg(x), Reg(y), Const(n)),
            (0xE, x, 9, 0xE) => Instruction::SkipIfKeyPressed(Reg(x)),
            (0xE, x, 0xA, 1) => Instruction::SkipIfKeyNotPressed(Reg(x)),
            (0xF, x, 0, 7) => Instruction::GetDelayTimer(Reg(x)),
            (0xF, x, 0, 0xA) => Instruction::WaitForKey(Reg(x)),
            (0xF, x, 1, 5) => Instruction::SetDelayTimer(Reg(x)),
            (0xF, x, 1, 8) => Instruction::SetSoundTimer(Reg(x)),
            (0xF, x, 1, 0xE) => Instruction::AddRegToIndex(Reg(x)),
            (0xF, x, 2, 9) => Instruction::SetIndexToFontChar(Reg(x)),
            (0xF, x, 3, 3) => Instruction::StoreBcd(Reg(x)),
            (0xF, x, 5, 5) => Instruction::StoreRegisters(Reg(x)),
            (0xF, x, 6, 5) => Instruction::LoadRegisters(Reg(x)),
            _ => {
                return Err(Error::UnknownOpcode {
                    opcode: opcode.as_u16(),
                })
            }
        };
        Ok(instruction)
    }
}

/// Assembly-like rendering, used when tracing execution.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(Addr(a)) => write!(f, "JP {:#05x}", a),
            Call(Addr(a)) => write!(f, "CALL {:#05x}", a),
            SkipIfRegEqConst(Reg(x), Const(n)) => write!(f, "SE V{:X}, {:#04x}", x, n),
            SkipIfRegNeqConst(Reg(x), Const(n)) => write!(f, "SNE V{:X}, {:#04x}", x, n),
            SkipIfRegEqReg(Reg(x), Reg(y)) => write!(f, "SE V{:X}, V{:X}", x, y),
            SetRegToConst(Reg(x), Const(n)) => write!(f, "LD V{:X}, {:#04x}", x, n),
            AddConstToReg(Reg(x), Const(n)) => write!(f, "ADD V{:X}, {:#04x}", x, n),
            SetRegToReg(Reg(x), Reg(y)) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(Reg(x), Reg(y)) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(Reg(x), Reg(y)) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(Reg(x), Reg(y)) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddRegToReg(Reg(x), Reg(y)) => write!(f, "ADD V{:X}, V{:X}", x, y),
            SubRegFromReg(Reg(x), Reg(y)) => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight(Reg(x), _) => write!(f, "SHR V{:X}", x),
            SubRegFromRegReversed(Reg(x), Reg(y)) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft(Reg(x), _) => write!(f, "SHL V{:X}", x),
            SkipIfRegNeqReg(Reg(x), Reg(y)) => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex(Addr(a)) => write!(f, "LD I, {:#05x}", a),
            JumpWithOffset(Addr(a)) => write!(f, "JP V0, {:#05x}", a),
            Random(Reg(x), Const(n)) => write!(f, "RND V{:X}, {:#04x}", x, n),
            Draw(Reg(x), Reg(y), Const(n)) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipIfKeyPressed(Reg(x)) => write!(f, "SKP V{:X}", x),
            SkipIfKeyNotPressed(Reg(x)) => write!(f, "SKNP V{:X}", x),
            GetDelayTimer(Reg(x)) => write!(f, "LD V{:X}, DT", x),
            WaitForKey(Reg(x)) => write!(f, "LD V{:X}, K", x),
            SetDelayTimer(Reg(x)) => write!(f, "LD DT, V{:X}", x),
            SetSoundTimer(Reg(x)) => write!(f, "LD ST, V{:X}", x),
            AddRegToIndex(Reg(x)) => write!(f, "ADD I, V{:X}", x),
            SetIndexToFontChar(Reg(x)) => write!(f, "LD F, V{:X}", x),
            StoreBcd(Reg(x)) => write!(f, "LD B, V{:X}", x),
            StoreRegisters(Reg(x)) => write!(f, "LD [I], V{:X}", x),
            LoadRegisters(Reg(x)) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
