/// A structure for easily splitting an instruction word
/// into the fields the instruction set encodes in it.
///
/// A word `0xABCD` is read as:
/// - `A`: the leading nibble, the opcode family
/// - `B`: the register X
/// - `C`: the register Y
/// - `D`: the trailing nibble, a sub-opcode or 4-bit constant
/// - `CD`: the trailing byte, an 8-bit constant
/// - `BCD`: the low 12 bits, an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSplitter(u8, u8);

impl BitSplitter {
    pub fn from_u16(value: u16) -> BitSplitter {
        BitSplitter((value >> 8) as u8, (value & 0x00FF) as u8)
    }

    /// Left-shift the first u8-component 8 bits,
    /// then take bitwise or with the second component
    /// in order to store the components in a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.0 as u16) << 8) | self.1 as u16
    }

    /// All four nibbles, most significant first.
    pub fn as_four_u8(&self) -> (u8, u8, u8, u8) {
        (self.family(), self.x(), self.y(), self.n())
    }

    pub fn family(&self) -> u8 {
        self.0 >> 4
    }

    pub fn x(&self) -> u8 {
        self.0 & 0x0F
    }

    pub fn y(&self) -> u8 {
        self.1 >> 4
    }

    pub fn n(&self) -> u8 {
        self.1 & 0x0F
    }

    pub fn nn(&self) -> u8 {
        self.1
    }

    pub fn nnn(&self) -> u16 {
        self.as_u16() & 0x0FFF
    }
}
