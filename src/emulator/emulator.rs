//! The CHIP-8 virtual machine as described at https://en.wikipedia.org/wiki/CHIP-8#Virtual_machine_description.
//!
//! The program counter is confined to `0x200..0x1000`. Jumps, calls and returns
//! into the interpreter area below `0x200` are rejected as out of range, so the
//! font is never executed. Data accesses through `I` may still reach it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{Error, Result};
use super::framebuffer::Framebuffer;
use super::input::{DummyInput, EmulatorInput, KeyState};
use super::instruction::*;
use super::memory::{self, Memory, MEM_SIZE, PROGRAM_START};
use super::stack::CallStack;
use super::timer::Timers;

pub const NUM_REGISTERS: usize = 16;
const FLAG: usize = 0xF;
const INSTRUCTION_LEN: u16 = 2;

/// What an executed instruction wants done with the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Move on to the following instruction.
    Next,
    /// Skip the following instruction.
    Skip,
    /// The instruction has chosen where execution continues.
    Jump(u16),
    /// Stay on this instruction until a key is pressed.
    Wait,
}

/// What a call to [`Emulator::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Instruction),
    /// Still blocked on a key wait, nothing changed.
    WaitingForKey,
    /// The word at PC was not an instruction. It was skipped.
    UnknownOpcode(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RunState {
    Running,
    WaitingForKey(Reg),
    Halted(Error),
}

pub struct Emulator<I: EmulatorInput> {
    memory: Memory,
    registers: [u8; NUM_REGISTERS],
    timers: Timers,
    i: u16,
    program_counter: u16,
    stack: CallStack,
    screen: Framebuffer,
    keys: KeyState,

    state: RunState,
    unknown_opcodes: usize,
    image: Memory,
    rng: StdRng,
    input: I,
}

impl Emulator<DummyInput> {
    /// Create a new emulator without any input device
    pub fn new() -> Emulator<DummyInput> {
        Emulator::with_input(DummyInput)
    }
}

impl Default for Emulator<DummyInput> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: EmulatorInput> Emulator<I> {
    /// Create a new emulator reading keys from `input`
    pub fn with_input(input: I) -> Emulator<I> {
        Emulator::with_rng(input, StdRng::from_entropy())
    }

    /// Like `with_input`, but with reproducible random numbers
    pub fn with_seed(input: I, seed: u64) -> Emulator<I> {
        Emulator::with_rng(input, StdRng::seed_from_u64(seed))
    }

    fn with_rng(input: I, rng: StdRng) -> Emulator<I> {
        Emulator {
            memory: Memory::new(),
            registers: [0; NUM_REGISTERS],
            timers: Timers::new(),
            i: 0,
            program_counter: PROGRAM_START as u16,
            stack: CallStack::new(),
            screen: Framebuffer::new(),
            keys: KeyState::NONE,

            state: RunState::Running,
            unknown_opcodes: 0,
            image: Memory::new(),
            rng,
            input,
        }
    }

    /// Copy a program into memory at 0x200.
    pub fn load(&mut self, program: &[u8]) -> Result<()> {
        let mut image = Memory::new();
        image.load_program(program)?;
        self.memory.load_program(program)?;
        self.image = image;
        log::debug!("Loaded {} byte program", program.len());
        Ok(())
    }

    /// Go back to the power-on state, with the last loaded program in place again.
    pub fn reset(&mut self) {
        self.memory = self.image.clone();
        self.registers = [0; NUM_REGISTERS];
        self.timers = Timers::new();
        self.i = 0;
        self.program_counter = PROGRAM_START as u16;
        self.stack = CallStack::new();
        self.screen.clear();
        self.keys = KeyState::NONE;
        self.state = RunState::Running;
        self.unknown_opcodes = 0;
        log::debug!("Reset");
    }

    /// Take a fresh snapshot of the held keys from the input device.
    pub fn refresh_input(&mut self) {
        self.keys = self.input.key_state();
    }

    /// Count both timers down by one. Call this at 60 Hz.
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// Perform a single cycle: snapshot the keys, then fetch, decode and execute one instruction.
    ///
    /// While a key wait is pending this only checks the keys again.
    /// After a fatal error every step returns `Error::Halted` until `reset`.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let RunState::Halted(cause) = &self.state {
            return Err(Error::Halted(Box::new(cause.clone())));
        }
        self.refresh_input();
        let outcome = self.cycle();
        self.check(outcome)
    }

    fn cycle(&mut self) -> Result<StepOutcome> {
        if let RunState::WaitingForKey(reg) = self.state {
            return Ok(match self.keys.lowest_pressed() {
                Some(key) => {
                    log::debug!("Got key {:X} for V{:X}", key, reg.0);
                    self.set_reg(reg, key);
                    self.state = RunState::Running;
                    self.advance(Flow::Next);
                    StepOutcome::Executed(Instruction::WaitForKey(reg))
                }
                None => StepOutcome::WaitingForKey,
            });
        }

        let pc = self.program_counter;
        let word = self.memory.read_word(pc as usize)?;
        match Instruction::decode(word) {
            Ok(instruction) => {
                log::trace!("{:#05x}: {}", pc, instruction);
                let flow = self.execute(instruction)?;
                self.advance(flow);
                Ok(match flow {
                    Flow::Wait => StepOutcome::WaitingForKey,
                    _ => StepOutcome::Executed(instruction),
                })
            }
            Err(Error::UnknownOpcode { opcode }) => {
                log::warn!("Skipping unknown opcode {:#06x} at {:#05x}", opcode, pc);
                self.unknown_opcodes += 1;
                self.advance(Flow::Next);
                Ok(StepOutcome::UnknownOpcode(opcode))
            }
            Err(e) => Err(e),
        }
    }

    /// Execute a single instruction as if it were stored at the current PC.
    ///
    /// Refused with `Error::WaitingForKey` while a key wait is pending,
    /// since the PC still points at the waiting instruction.
    pub fn execute_single(&mut self, instruction: Instruction) -> Result<()> {
        match &self.state {
            RunState::Halted(cause) => return Err(Error::Halted(Box::new(cause.clone()))),
            RunState::WaitingForKey(_) => return Err(Error::WaitingForKey),
            RunState::Running => {}
        }
        let result = self
            .execute(instruction)
            .map(|flow| self.advance(flow));
        self.check(result)
    }

    /// Execute instructions in order, stopping at the first error.
    pub fn execute_many(&mut self, instructions: &[Instruction]) -> Result<()> {
        instructions
            .iter()
            .try_for_each(|instruction| self.execute_single(*instruction))
    }

    /// Halt on fatal errors.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                log::error!("Halting at {:#05x}: {}", self.program_counter, e);
                self.state = RunState::Halted(e.clone());
            }
        }
        result
    }

    fn advance(&mut self, flow: Flow) {
        match flow {
            Flow::Next => self.program_counter += INSTRUCTION_LEN,
            Flow::Skip => self.program_counter += 2 * INSTRUCTION_LEN,
            Flow::Jump(addr) => self.program_counter = addr,
            Flow::Wait => {}
        }
    }

    fn execute(&mut self, instruction: Instruction) -> Result<Flow> {
        let flow = match instruction {
            Instruction::ClearScreen => {
                self.screen.clear();
                Flow::Next
            }

            // Return to the previous call site via the stack.
            Instruction::Return => {
                let addr = self.stack.peek()?;
                let flow = jump_to(addr as usize)?;
                self.stack.pop()?;
                flow
            }

            Instruction::Jump(Addr(addr)) => jump_to(addr as usize)?,

            // Store the address of the next instruction on the stack, then jump to the specified address
            Instruction::Call(Addr(addr)) => {
                let flow = jump_to(addr as usize)?;
                self.stack.push(self.program_counter + INSTRUCTION_LEN)?;
                flow
            }

            Instruction::SkipIfRegEqConst(x, Const(n)) => skip_if(self.reg(x) == n),
            Instruction::SkipIfRegNeqConst(x, Const(n)) => skip_if(self.reg(x) != n),
            Instruction::SkipIfRegEqReg(x, y) => skip_if(self.reg(x) == self.reg(y)),
            Instruction::SkipIfRegNeqReg(x, y) => skip_if(self.reg(x) != self.reg(y)),

            Instruction::SetRegToConst(x, Const(n)) => {
                self.set_reg(x, n);
                Flow::Next
            }

            // No carry flag for this one
            Instruction::AddConstToReg(x, Const(n)) => {
                self.set_reg(x, self.reg(x).wrapping_add(n));
                Flow::Next
            }

            Instruction::SetRegToReg(x, y) => {
                self.set_reg(x, self.reg(y));
                Flow::Next
            }

            Instruction::Or(x, y) => {
                self.set_reg(x, self.reg(x) | self.reg(y));
                Flow::Next
            }

            Instruction::And(x, y) => {
                self.set_reg(x, self.reg(x) & self.reg(y));
                Flow::Next
            }

            Instruction::Xor(x, y) => {
                self.set_reg(x, self.reg(x) ^ self.reg(y));
                Flow::Next
            }

            // VF is 1 on carry
            Instruction::AddRegToReg(x, y) => {
                let (sum, carry) = self.reg(x).overflowing_add(self.reg(y));
                self.set_reg_with_flag(x, sum, carry);
                Flow::Next
            }

            // VF is 1 when there is no borrow
            Instruction::SubRegFromReg(x, y) => {
                let (vx, vy) = (self.reg(x), self.reg(y));
                self.set_reg_with_flag(x, vx.wrapping_sub(vy), vx >= vy);
                Flow::Next
            }

            Instruction::SubRegFromRegReversed(x, y) => {
                let (vx, vy) = (self.reg(x), self.reg(y));
                self.set_reg_with_flag(x, vy.wrapping_sub(vx), vy >= vx);
                Flow::Next
            }

            // VF gets the bit shifted out
            Instruction::ShiftRight(x, _) => {
                let vx = self.reg(x);
                self.set_reg_with_flag(x, vx >> 1, vx & 1 == 1);
                Flow::Next
            }

            Instruction::ShiftLeft(x, _) => {
                let vx = self.reg(x);
                self.set_reg_with_flag(x, vx << 1, vx >> 7 == 1);
                Flow::Next
            }

            Instruction::SetIndex(Addr(addr)) => {
                self.i = addr;
                Flow::Next
            }

            Instruction::JumpWithOffset(Addr(addr)) => {
                jump_to(addr as usize + self.registers[0] as usize)?
            }

            Instruction::Random(x, Const(n)) => {
                let value = self.rng.gen::<u8>() & n;
                self.set_reg(x, value);
                Flow::Next
            }

            // XOR a sprite of `height` rows from I onto the screen, VF is set on collision
            Instruction::Draw(x, y, Const(height)) => {
                let (x_coord, y_coord) = (self.reg(x) as usize, self.reg(y) as usize);
                let sprite = self.memory.slice(self.i as usize, height as usize)?;
                let collision = self.screen.draw_sprite(x_coord, y_coord, sprite);
                self.registers[FLAG] = collision as u8;
                Flow::Next
            }

            Instruction::SkipIfKeyPressed(x) => skip_if(self.keys.pressed(self.reg(x))),
            Instruction::SkipIfKeyNotPressed(x) => skip_if(!self.keys.pressed(self.reg(x))),

            Instruction::GetDelayTimer(x) => {
                self.set_reg(x, self.timers.delay);
                Flow::Next
            }

            // Block until a key is held, then store the lowest one
            Instruction::WaitForKey(x) => match self.keys.lowest_pressed() {
                Some(key) => {
                    self.set_reg(x, key);
                    Flow::Next
                }
                None => {
                    log::debug!("Waiting for key into V{:X}", x.0);
                    self.state = RunState::WaitingForKey(x);
                    Flow::Wait
                }
            },

            Instruction::SetDelayTimer(x) => {
                self.timers.delay = self.reg(x);
                Flow::Next
            }

            Instruction::SetSoundTimer(x) => {
                self.timers.sound = self.reg(x);
                Flow::Next
            }

            Instruction::AddRegToIndex(x) => {
                let vx = self.reg(x);
                self.i = self.i.checked_add(vx as u16).ok_or(Error::OutOfRangeAddress {
                    addr: self.i as usize + vx as usize,
                })?;
                Flow::Next
            }

            // Set i to character address. Each font element is 5 bytes wide.
            Instruction::SetIndexToFontChar(x) => {
                self.i = memory::font_address(self.reg(x));
                Flow::Next
            }

            Instruction::StoreBcd(x) => {
                let value = self.reg(x);
                let digits = [value / 100, value / 10 % 10, value % 10];
                self.memory.write_slice(self.i as usize, &digits)?;
                Flow::Next
            }

            // Dump register values up to Vx
            Instruction::StoreRegisters(Reg(x)) => {
                let last = (x & 0x0F) as usize;
                self.memory
                    .write_slice(self.i as usize, &self.registers[..=last])?;
                Flow::Next
            }

            // Load register values up to Vx
            Instruction::LoadRegisters(Reg(x)) => {
                let last = (x & 0x0F) as usize;
                let values = self.memory.slice(self.i as usize, last + 1)?;
                self.registers[..=last].copy_from_slice(values);
                Flow::Next
            }
        };
        Ok(flow)
    }

    fn reg(&self, Reg(x): Reg) -> u8 {
        self.registers[(x & 0x0F) as usize]
    }

    fn set_reg(&mut self, Reg(x): Reg, value: u8) {
        self.registers[(x & 0x0F) as usize] = value;
    }

    /// The flag is written last, so it wins when VF is also the target.
    fn set_reg_with_flag(&mut self, x: Reg, value: u8, flag: bool) {
        self.set_reg(x, value);
        self.registers[FLAG] = flag as u8;
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn register(&self, x: u8) -> u8 {
        self.reg(Reg(x))
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound
    }

    /// Whoever makes noise should do so while this is true.
    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }

    pub fn screen(&self) -> &Framebuffer {
        &self.screen
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn is_waiting_for_key(&self) -> bool {
        matches!(self.state, RunState::WaitingForKey(_))
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, RunState::Halted(_))
    }

    /// How many unknown opcodes have been skipped since the last reset.
    pub fn unknown_opcodes(&self) -> usize {
        self.unknown_opcodes
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}

fn skip_if(condition: bool) -> Flow {
    if condition {
        Flow::Skip
    } else {
        Flow::Next
    }
}

fn jump_to(addr: usize) -> Result<Flow> {
    if addr < PROGRAM_START || addr >= MEM_SIZE {
        return Err(Error::OutOfRangeAddress { addr });
    }
    Ok(Flow::Jump(addr as u16))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::input::FixedInput;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn seeded() -> Emulator<DummyInput> {
        Emulator::with_seed(DummyInput, 0)
    }

    fn with_registers(values: &[(u8, u8)]) -> Emulator<DummyInput> {
        let mut emulator = seeded();
        for (x, value) in values {
            emulator.set_reg(Reg(*x), *value);
        }
        emulator
    }

    #[test]
    fn starts_at_0x200_with_font_loaded() {
        let emulator = seeded();
        assert_eq!(emulator.program_counter(), 0x200);
        assert_eq!(emulator.registers(), &[0; NUM_REGISTERS]);
        assert_eq!(emulator.memory().slice(0, 5).unwrap(), &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(emulator.stack_depth(), 0);
    }

    #[test]
    fn goto_goes_to() {
        let mut emulator = seeded();
        emulator.execute_single(Instruction::Jump(Addr(0x250))).unwrap();
        assert_eq!(emulator.program_counter(), 0x250);
    }

    #[test]
    fn return_after_call_is_neutral() {
        let mut emulator = seeded();
        let program = [
            0x22, 0x06, // 0x200, call 0x206
            0x00, 0x00, // 0x202
            0x00, 0x00, // 0x204
            0x00, 0xEE, // 0x206, return
        ];
        emulator.load(&program).unwrap();

        emulator.step().unwrap(); // Call 0x206
        assert_eq!(emulator.program_counter(), 0x206);
        assert_eq!(emulator.stack_depth(), 1);
        emulator.step().unwrap(); // Return to 0x202
        assert_eq!(emulator.program_counter(), 0x202);
        assert_eq!(emulator.stack_depth(), 0);
    }

    #[test]
    fn seventeen_nested_calls_overflow_and_halt() {
        let mut emulator = seeded();
        // Calls itself forever
        emulator.load(&[0x22, 0x00]).unwrap();
        for _ in 0..16 {
            assert!(emulator.step().is_ok());
        }
        assert_eq!(emulator.step(), Err(Error::StackOverflow));
        assert!(emulator.is_halted());
        assert_eq!(emulator.stack_depth(), 16);
        assert_eq!(
            emulator.step(),
            Err(Error::Halted(Box::new(Error::StackOverflow)))
        );
    }

    #[test]
    fn return_without_call_underflows() {
        let mut emulator = seeded();
        emulator.load(&[0x00, 0xEE]).unwrap();
        assert_eq!(emulator.step(), Err(Error::StackUnderflow));
        assert_eq!(emulator.program_counter(), 0x200);
    }

    #[test]
    fn pc_advances_by_one_instruction() {
        let mut emulator = seeded();
        emulator.load(&[0x60, 0x12, 0x61, 0x34]).unwrap();
        assert_eq!(
            emulator.step(),
            Ok(StepOutcome::Executed(Instruction::SetRegToConst(Reg(0), Const(0x12))))
        );
        emulator.step().unwrap();
        assert_eq!(emulator.program_counter(), 0x204);
        assert_eq!(emulator.register(0), 0x12);
        assert_eq!(emulator.register(1), 0x34);
    }

    #[test]
    fn skips_skip_one_instruction() {
        let mut emulator = with_registers(&[(1, 5), (2, 5)]);
        emulator.execute_single(Instruction::SkipIfRegEqConst(Reg(1), Const(5))).unwrap();
        assert_eq!(emulator.program_counter(), 0x204);
        emulator.execute_single(Instruction::SkipIfRegNeqConst(Reg(1), Const(5))).unwrap();
        assert_eq!(emulator.program_counter(), 0x206);
        emulator.execute_single(Instruction::SkipIfRegEqReg(Reg(1), Reg(2))).unwrap();
        assert_eq!(emulator.program_counter(), 0x20A);
        emulator.execute_single(Instruction::SkipIfRegNeqReg(Reg(1), Reg(2))).unwrap();
        assert_eq!(emulator.program_counter(), 0x20C);
    }

    #[test]
    fn add_const_wraps_without_flag() {
        let mut emulator = with_registers(&[(3, 0xFF), (0xF, 7)]);
        emulator.execute_single(Instruction::AddConstToReg(Reg(3), Const(2))).unwrap();
        assert_eq!(emulator.register(3), 1);
        assert_eq!(emulator.register(0xF), 7);
    }

    #[test]
    fn logic_ops() {
        let mut emulator = with_registers(&[(0, 0b1100), (1, 0b1010)]);
        emulator.execute_single(Instruction::Or(Reg(0), Reg(1))).unwrap();
        assert_eq!(emulator.register(0), 0b1110);
        emulator.execute_single(Instruction::And(Reg(0), Reg(1))).unwrap();
        assert_eq!(emulator.register(0), 0b1010);
        emulator.execute_single(Instruction::Xor(Reg(0), Reg(1))).unwrap();
        assert_eq!(emulator.register(0), 0);
        emulator.execute_single(Instruction::SetRegToReg(Reg(2), Reg(1))).unwrap();
        assert_eq!(emulator.register(2), 0b1010);
    }

    #[test]
    fn shifts_flag_the_shifted_out_bit() {
        let mut emulator = with_registers(&[(4, 0b1000_0001)]);
        emulator.execute_single(Instruction::ShiftRight(Reg(4), Reg(0))).unwrap();
        assert_eq!((emulator.register(4), emulator.register(0xF)), (0b0100_0000, 1));
        emulator.execute_single(Instruction::ShiftRight(Reg(4), Reg(0))).unwrap();
        assert_eq!((emulator.register(4), emulator.register(0xF)), (0b0010_0000, 0));

        let mut emulator = with_registers(&[(4, 0b1000_0001)]);
        emulator.execute_single(Instruction::ShiftLeft(Reg(4), Reg(0))).unwrap();
        assert_eq!((emulator.register(4), emulator.register(0xF)), (0b0000_0010, 1));
        emulator.execute_single(Instruction::ShiftLeft(Reg(4), Reg(0))).unwrap();
        assert_eq!((emulator.register(4), emulator.register(0xF)), (0b0000_0100, 0));
    }

    #[test]
    fn flag_wins_when_vf_is_the_target() {
        let mut emulator = with_registers(&[(0xF, 200), (1, 100)]);
        emulator.execute_single(Instruction::AddRegToReg(Reg(0xF), Reg(1))).unwrap();
        assert_eq!(emulator.register(0xF), 1);
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut emulator = with_registers(&[(0, 0x10)]);
        emulator.execute_single(Instruction::JumpWithOffset(Addr(0x300))).unwrap();
        assert_eq!(emulator.program_counter(), 0x310);
    }

    #[test]
    fn jump_with_offset_past_memory_is_out_of_range() {
        let mut emulator = with_registers(&[(0, 0xFF)]);
        assert_eq!(
            emulator.execute_single(Instruction::JumpWithOffset(Addr(0xFFF))),
            Err(Error::OutOfRangeAddress { addr: 0x10FE })
        );
        assert_eq!(emulator.program_counter(), 0x200);
        assert!(emulator.is_halted());
    }

    #[test]
    fn random_is_masked() {
        let mut emulator = seeded();
        for _ in 0..32 {
            emulator.execute_single(Instruction::Random(Reg(2), Const(0x0F))).unwrap();
            assert_eq!(emulator.register(2) & 0xF0, 0);
        }
        emulator.execute_single(Instruction::Random(Reg(2), Const(0))).unwrap();
        assert_eq!(emulator.register(2), 0);
    }

    #[test]
    fn random_is_reproducible_with_a_seed() {
        let mut a = Emulator::with_seed(DummyInput, 42);
        let mut b = Emulator::with_seed(DummyInput, 42);
        for _ in 0..8 {
            a.execute_single(Instruction::Random(Reg(0), Const(0xFF))).unwrap();
            b.execute_single(Instruction::Random(Reg(0), Const(0xFF))).unwrap();
            assert_eq!(a.register(0), b.register(0));
        }
    }

    #[test]
    fn clear_then_draw_sets_exactly_the_sprite_bits() {
        let mut emulator = seeded();
        emulator.execute_many(&[
            Instruction::ClearScreen,
            Instruction::SetIndex(Addr(0x300)),
        ]).unwrap();
        emulator.memory.write(0x300, 0b1011_0000).unwrap();
        emulator.execute_single(Instruction::Draw(Reg(0), Reg(0), Const(1))).unwrap();

        let mut expected = Framebuffer::new();
        expected.draw_sprite(0, 0, &[0b1011_0000]);
        assert_eq!(emulator.screen(), &expected);
        assert_eq!(emulator.screen().lit_pixels(), 3);
        assert_eq!(emulator.register(0xF), 0);
    }

    #[test]
    fn drawing_twice_restores_screen_and_sets_collision() {
        let mut emulator = with_registers(&[(1, 20), (2, 10), (3, 0xA)]);
        emulator.execute_many(&[
            Instruction::SetIndexToFontChar(Reg(3)),
            Instruction::Draw(Reg(1), Reg(2), Const(5)),
        ]).unwrap();
        assert_eq!(emulator.register(0xF), 0);
        let drawn = emulator.screen().clone();
        assert!(drawn.get(20, 10));

        emulator.execute_single(Instruction::Draw(Reg(1), Reg(2), Const(5))).unwrap();
        assert_eq!(emulator.register(0xF), 1);
        assert_eq!(emulator.screen(), &Framebuffer::new());
    }

    #[test]
    fn draw_clips_at_the_edges() {
        let mut emulator = with_registers(&[(1, 62), (2, 31)]);
        emulator.execute_many(&[
            Instruction::SetIndexToFontChar(Reg(0)), // 0xF0 in its first row
            Instruction::Draw(Reg(1), Reg(2), Const(5)),
        ]).unwrap();
        assert_eq!(emulator.screen().lit_pixels(), 2);
        assert!(emulator.screen().get(62, 31));
        assert!(emulator.screen().get(63, 31));
        assert!(!emulator.screen().get(0, 0));
    }

    #[test]
    fn draw_reading_past_memory_is_out_of_range_and_draws_nothing() {
        let mut emulator = seeded();
        emulator.execute_single(Instruction::SetIndex(Addr(0xFFE))).unwrap();
        assert!(emulator.execute_single(Instruction::Draw(Reg(0), Reg(0), Const(5))).is_err());
        assert_eq!(emulator.screen().lit_pixels(), 0);
    }

    #[test]
    fn font_char_points_at_the_digit() {
        let mut emulator = with_registers(&[(5, 0x2B)]);
        emulator.execute_single(Instruction::SetIndexToFontChar(Reg(5))).unwrap();
        assert_eq!(emulator.index(), 0xB * 5);
        let sprite = emulator.memory().slice(emulator.index() as usize, 5).unwrap();
        assert_eq!(sprite, &[0xE0, 0x90, 0xE0, 0x90, 0xE0]);
    }

    #[test]
    fn add_to_index_has_no_flag() {
        let mut emulator = with_registers(&[(1, 0x20)]);
        emulator.execute_many(&[
            Instruction::SetIndex(Addr(0xFF0)),
            Instruction::AddRegToIndex(Reg(1)),
        ]).unwrap();
        assert_eq!(emulator.index(), 0x1010);
        assert_eq!(emulator.register(0xF), 0);
    }

    #[test]
    fn bcd_of_255_and_0() {
        let mut emulator = with_registers(&[(0, 255), (1, 0), (2, 109)]);
        emulator.execute_many(&[
            Instruction::SetIndex(Addr(0x300)),
            Instruction::StoreBcd(Reg(0)),
        ]).unwrap();
        assert_eq!(emulator.memory().slice(0x300, 3).unwrap(), &[2, 5, 5]);

        emulator.execute_single(Instruction::StoreBcd(Reg(1))).unwrap();
        assert_eq!(emulator.memory().slice(0x300, 3).unwrap(), &[0, 0, 0]);

        emulator.execute_single(Instruction::StoreBcd(Reg(2))).unwrap();
        assert_eq!(emulator.memory().slice(0x300, 3).unwrap(), &[1, 0, 9]);
    }

    #[test]
    fn bcd_past_memory_writes_nothing() {
        let mut emulator = with_registers(&[(0, 123)]);
        emulator.execute_single(Instruction::SetIndex(Addr(0xFFE))).unwrap();
        assert_eq!(
            emulator.execute_single(Instruction::StoreBcd(Reg(0))),
            Err(Error::OutOfRangeAddress { addr: MEM_SIZE })
        );
        assert_eq!(emulator.memory().slice(0xFFE, 2).unwrap(), &[0, 0]);
    }

    #[test]
    fn store_and_load_registers_up_to_x() {
        let mut emulator = with_registers(&[(0, 1), (1, 2), (2, 3), (3, 4)]);
        emulator.execute_many(&[
            Instruction::SetIndex(Addr(0x400)),
            Instruction::StoreRegisters(Reg(2)),
        ]).unwrap();
        assert_eq!(emulator.memory().slice(0x400, 4).unwrap(), &[1, 2, 3, 0]);
        assert_eq!(emulator.index(), 0x400);

        let mut other = seeded();
        other.memory.write_slice(0x400, &[9, 8, 7, 6]).unwrap();
        other.execute_many(&[
            Instruction::SetIndex(Addr(0x400)),
            Instruction::LoadRegisters(Reg(1)),
        ]).unwrap();
        assert_eq!(&other.registers()[..3], &[9, 8, 0]);
    }

    #[test]
    fn timers_are_set_and_read() {
        let mut emulator = with_registers(&[(1, 3), (2, 2)]);
        emulator.execute_many(&[
            Instruction::SetDelayTimer(Reg(1)),
            Instruction::SetSoundTimer(Reg(2)),
        ]).unwrap();
        assert!(emulator.sound_active());
        emulator.tick_timers();
        emulator.tick_timers();
        assert!(!emulator.sound_active());
        emulator.execute_single(Instruction::GetDelayTimer(Reg(5))).unwrap();
        assert_eq!(emulator.register(5), 1);
    }

    #[test]
    fn key_skips_test_the_key_in_vx() {
        let mut emulator = Emulator::with_seed(FixedInput(KeyState(1 << 0xA)), 0);
        emulator.load(&[0xE1, 0x9E, 0x00, 0x00, 0xE1, 0xA1, 0xE2, 0xA1]).unwrap();
        emulator.set_reg(Reg(1), 0xA);
        emulator.set_reg(Reg(2), 0xB);
        emulator.step().unwrap(); // pressed, skip
        assert_eq!(emulator.program_counter(), 0x204);
        emulator.step().unwrap(); // pressed, don't skip
        assert_eq!(emulator.program_counter(), 0x206);
        emulator.step().unwrap(); // not pressed, skip
        assert_eq!(emulator.program_counter(), 0x20A);
    }

    #[test]
    fn wait_for_key_blocks_until_a_key_is_held() {
        let mut emulator = Emulator::with_seed(FixedInput::default(), 0);
        emulator.load(&[0xF3, 0x0A, 0x00, 0xE0]).unwrap();

        for _ in 0..3 {
            assert_eq!(emulator.step(), Ok(StepOutcome::WaitingForKey));
            assert!(emulator.is_waiting_for_key());
            assert_eq!(emulator.program_counter(), 0x200);
            assert_eq!(emulator.registers(), &[0; NUM_REGISTERS]);
        }

        emulator.input_mut().0 = KeyState(0b0100_1000_0000_0000);
        assert_eq!(
            emulator.step(),
            Ok(StepOutcome::Executed(Instruction::WaitForKey(Reg(3))))
        );
        assert_eq!(emulator.register(3), 0xB);
        assert_eq!(emulator.program_counter(), 0x202);
        assert!(!emulator.is_waiting_for_key());
    }

    #[test]
    fn wait_for_key_with_key_held_does_not_block() {
        let mut emulator = Emulator::with_seed(FixedInput(KeyState(1 << 4)), 0);
        emulator.load(&[0xF0, 0x0A]).unwrap();
        emulator.step().unwrap();
        assert_eq!(emulator.register(0), 4);
        assert_eq!(emulator.program_counter(), 0x202);
    }

    #[test]
    fn nothing_else_executes_during_a_key_wait() {
        let mut emulator = Emulator::with_seed(FixedInput::default(), 0);
        emulator.load(&[0xF0, 0x0A, 0x61, 0x01, 0x62, 0x02]).unwrap();
        assert_eq!(emulator.step(), Ok(StepOutcome::WaitingForKey));

        assert_eq!(
            emulator.execute_single(Instruction::SetRegToConst(Reg(5), Const(9))),
            Err(Error::WaitingForKey)
        );
        assert_eq!(emulator.program_counter(), 0x200);
        assert_eq!(emulator.register(5), 0);
        assert!(!emulator.is_halted());

        emulator.input_mut().0 = KeyState(1 << 3);
        emulator.step().unwrap(); // Key 3 into V0
        emulator.step().unwrap(); // V1 := 1
        assert_eq!(emulator.register(0), 3);
        assert_eq!(emulator.register(1), 1);
        assert_eq!(emulator.program_counter(), 0x204);
    }

    #[test]
    fn index_past_16_bits_is_out_of_range() {
        let mut emulator = with_registers(&[(0, 0x77), (1, 0xFF)]);
        emulator.execute_single(Instruction::SetIndex(Addr(0xFFF))).unwrap();
        for _ in 0..240 {
            emulator.execute_single(Instruction::AddRegToIndex(Reg(1))).unwrap();
        }
        assert_eq!(emulator.index(), 0xFF0F);
        assert_eq!(
            emulator.execute_single(Instruction::AddRegToIndex(Reg(1))),
            Err(Error::OutOfRangeAddress { addr: 0x1000E })
        );
        assert_eq!(emulator.index(), 0xFF0F);
        assert!(emulator.is_halted());
        assert_eq!(emulator.memory().slice(0, 80).unwrap(), Memory::new().slice(0, 80).unwrap());
    }

    #[test]
    fn store_at_index_past_memory_is_out_of_range() {
        let mut emulator = with_registers(&[(1, 0x10)]);
        emulator.execute_many(&[
            Instruction::SetIndex(Addr(0xFFF)),
            Instruction::AddRegToIndex(Reg(1)),
        ]).unwrap();
        assert_eq!(
            emulator.execute_single(Instruction::StoreRegisters(Reg(0))),
            Err(Error::OutOfRangeAddress { addr: 0x100F })
        );
    }

    #[test]
    fn jumps_into_the_interpreter_area_are_out_of_range() {
        let mut emulator = seeded();
        assert_eq!(
            emulator.execute_single(Instruction::Jump(Addr(0x1FE))),
            Err(Error::OutOfRangeAddress { addr: 0x1FE })
        );
        assert_eq!(emulator.program_counter(), 0x200);
        assert!(emulator.is_halted());

        let mut emulator = seeded();
        assert_eq!(
            emulator.execute_single(Instruction::Call(Addr(0x000))),
            Err(Error::OutOfRangeAddress { addr: 0 })
        );
        assert_eq!(emulator.stack_depth(), 0);
    }

    #[test]
    fn unknown_opcodes_are_counted_and_skipped() {
        let mut emulator = seeded();
        emulator.load(&[0xFF, 0xFF, 0x60, 0x01]).unwrap();
        assert_eq!(emulator.step(), Ok(StepOutcome::UnknownOpcode(0xFFFF)));
        assert_eq!(emulator.unknown_opcodes(), 1);
        assert!(!emulator.is_halted());
        emulator.step().unwrap();
        assert_eq!(emulator.register(0), 1);
    }

    #[test]
    fn fetch_past_memory_halts() {
        let mut emulator = seeded();
        emulator.execute_single(Instruction::Jump(Addr(0xFFF))).unwrap();
        assert_eq!(emulator.step(), Err(Error::OutOfRangeAddress { addr: MEM_SIZE }));
        assert!(emulator.is_halted());
    }

    #[test]
    fn load_too_large_keeps_font() {
        let mut emulator = seeded();
        let program = vec![0xFF; MEM_SIZE - PROGRAM_START + 1];
        assert!(matches!(emulator.load(&program), Err(Error::LoadTooLarge { .. })));
        assert_eq!(emulator.memory().as_slice(), Memory::new().as_slice());
    }

    #[test]
    fn reset_restores_program_and_clears_state() {
        let mut emulator = seeded();
        emulator.load(&[0x60, 0x07, 0xF0, 0x55]).unwrap();
        emulator.step().unwrap();
        emulator.step().unwrap(); // Overwrites memory at I = 0
        emulator.execute_single(Instruction::Return).unwrap_err();
        assert!(emulator.is_halted());

        emulator.reset();
        assert!(!emulator.is_halted());
        assert_eq!(emulator.program_counter(), 0x200);
        assert_eq!(emulator.register(0), 0);
        assert_eq!(emulator.memory().read(0).unwrap(), 0xF0);
        assert_eq!(emulator.memory().read_word(0x200).unwrap(), 0x6007);
    }

    proptest! {
        #[test]
        fn add_sets_carry_on_overflow(a in any::<u8>(), b in any::<u8>()) {
            let mut emulator = with_registers(&[(0, a), (1, b)]);
            emulator.execute_single(Instruction::AddRegToReg(Reg(0), Reg(1))).unwrap();
            prop_assert_eq!(emulator.register(0), ((a as u16 + b as u16) % 256) as u8);
            prop_assert_eq!(emulator.register(0xF), (a as u16 + b as u16 > 255) as u8);
        }

        #[test]
        fn sub_sets_flag_without_borrow(a in any::<u8>(), b in any::<u8>()) {
            let mut emulator = with_registers(&[(0, a), (1, b)]);
            emulator.execute_single(Instruction::SubRegFromReg(Reg(0), Reg(1))).unwrap();
            prop_assert_eq!(emulator.register(0), a.wrapping_sub(b));
            prop_assert_eq!(emulator.register(0xF), (a >= b) as u8);
        }

        #[test]
        fn subn_sets_flag_without_borrow(a in any::<u8>(), b in any::<u8>()) {
            let mut emulator = with_registers(&[(0, a), (1, b)]);
            emulator.execute_single(Instruction::SubRegFromRegReversed(Reg(0), Reg(1))).unwrap();
            prop_assert_eq!(emulator.register(0), b.wrapping_sub(a));
            prop_assert_eq!(emulator.register(0xF), (b >= a) as u8);
        }

        #[test]
        fn bcd_digits_rebuild_the_value(value in any::<u8>()) {
            let mut emulator = with_registers(&[(0, value)]);
            emulator.execute_many(&[Instruction::SetIndex(Addr(0x300)), Instruction::StoreBcd(Reg(0))]).unwrap();
            let digits = emulator.memory().slice(0x300, 3).unwrap();
            prop_assert!(digits.iter().all(|d| *d < 10));
            prop_assert_eq!(digits[0] as u16 * 100 + digits[1] as u16 * 10 + digits[2] as u16, value as u16);
        }
    }
}
