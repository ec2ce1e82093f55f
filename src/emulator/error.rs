use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading or running a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("address {addr:#06x} is out of range")]
    OutOfRangeAddress { addr: usize },

    #[error("call stack overflow: more than 16 nested subroutine calls")]
    StackOverflow,

    #[error("call stack underflow: return with no subroutine to return from")]
    StackUnderflow,

    #[error("unknown opcode {opcode:#06x}")]
    UnknownOpcode { opcode: u16 },

    #[error("program is {size} bytes, but only {max} bytes fit from the load address")]
    LoadTooLarge { size: usize, max: usize },

    #[error("cannot execute instructions while waiting for a key")]
    WaitingForKey,

    #[error("emulator is halted: {0}")]
    Halted(Box<Error>),
}

impl Error {
    /// Whether the error stops the emulator.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnknownOpcode { .. } | Error::WaitingForKey)
    }
}
