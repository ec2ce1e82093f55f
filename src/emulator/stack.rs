use super::error::{Error, Result};

pub const STACK_SIZE: usize = 16;

/// Return addresses of the subroutines currently being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    stack: [u16; STACK_SIZE],
    stack_pointer: usize,
}

impl CallStack {
    pub fn new() -> CallStack {
        CallStack {
            stack: [0; STACK_SIZE],
            stack_pointer: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<()> {
        let slot = self
            .stack
            .get_mut(self.stack_pointer)
            .ok_or(Error::StackOverflow)?;
        *slot = addr;
        self.stack_pointer += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16> {
        if self.stack_pointer == 0 {
            return Err(Error::StackUnderflow);
        }
        self.stack_pointer -= 1;
        Ok(self.stack[self.stack_pointer])
    }

    /// The address `pop` would return, without removing it.
    pub fn peek(&self) -> Result<u16> {
        match self.stack_pointer {
            0 => Err(Error::StackUnderflow),
            sp => Ok(self.stack[sp - 1]),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack_pointer
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_returns_pushed_addresses_in_reverse() {
        let mut stack = CallStack::new();
        stack.push(0x202).unwrap();
        stack.push(0x304).unwrap();
        assert_eq!(stack.peek(), Ok(0x304));
        assert_eq!(stack.pop(), Ok(0x304));
        assert_eq!(stack.pop(), Ok(0x202));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn seventeenth_push_overflows() {
        let mut stack = CallStack::new();
        for i in 0..STACK_SIZE {
            assert_eq!(stack.push(i as u16), Ok(()));
        }
        assert_eq!(stack.push(0x200), Err(Error::StackOverflow));
        assert_eq!(stack.depth(), STACK_SIZE);
    }

    #[test]
    fn pop_on_empty_underflows() {
        assert_eq!(CallStack::new().pop(), Err(Error::StackUnderflow));
        assert_eq!(CallStack::new().peek(), Err(Error::StackUnderflow));
    }
}
