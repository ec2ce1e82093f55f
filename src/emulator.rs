//! The virtual machine and the interfaces it talks to the world through.

pub mod emulator;
pub mod error;
pub mod framebuffer;
pub mod input;
pub mod instruction;
pub mod memory;
pub mod output;
pub mod stack;
pub mod timer;

pub use self::emulator::{Emulator, StepOutcome};
pub use self::error::{Error, Result};
