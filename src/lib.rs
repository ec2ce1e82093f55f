/*!

A CHIP-8 virtual machine as specified at https://en.wikipedia.org/wiki/CHIP-8.

# Crossterm Frontend

If you want to try the emulator on some programs, there is a ready-to-use implementation
you can run by using `cargo run --release --bin crossterm_frontend -- <program>`.
The hex keypad is mapped onto the left side of the keyboard:

```text
1 2 3 C        1 2 3 4
4 5 6 D   <-   q w e r
7 8 9 E        a s d f
A 0 B F        y/z x c v
```

Press `Esc` to quit. Logging is controlled with `RUST_LOG` as usual.

# Library

The emulator does not keep time by itself. Whoever drives it calls
`step` to run one instruction and `tick_timers` sixty times per second.

```rust
use chip8_core::emulator::{Emulator, StepOutcome};
use chip8_core::emulator::instruction::{Instruction, Reg, Const};

let mut emulator = Emulator::new();

// Load a program at address 0x200.
let program = [0x00, 0xE0, 0x6A, 0x23];
emulator.load(&program).unwrap();
emulator.step().unwrap(); // Will now clear the screen
assert_eq!(
    emulator.step(),
    Ok(StepOutcome::Executed(Instruction::SetRegToConst(Reg(0xA), Const(0x23))))
);
emulator.tick_timers();
```

Alternatively, you can experiment by executing instructions manually.

```rust
use chip8_core::emulator::Emulator;
use chip8_core::emulator::instruction::{Instruction, Reg, Const, Addr};

let mut emulator = Emulator::new();

// Execute instructions manually
emulator.execute_single(Instruction::ClearScreen).unwrap();

// Or many sequentially
emulator.execute_many(&[
    Instruction::Jump(Addr(0x250)),
    Instruction::SetRegToConst(Reg(0xA), Const(35)),
    Instruction::SetRegToReg(Reg(0xB), Reg(0xA))
]).unwrap();
assert_eq!(emulator.register(0xB), 35);
assert_eq!(emulator.program_counter(), 0x254);
```

## Custom input and output

To get keypresses, implement `EmulatorInput`, which reports the held keys as a 16-bit mask.
It is polled once per `step`. To show the screen, implement `EmulatorOutput` and
let a `Runner` hand it the framebuffer once per frame.

```ignore
use chip8_core::emulator::Emulator;
use chip8_core::runner::{Config, Runner};

let emulator = Emulator::with_input(MyInput::new());
let mut runner = Runner::new(emulator, MyOutput::new(), Config::default());
runner.run(|| false)?;
```

You can then implement the emulator using your own custom frontend, as done with crossterm in crossterm_frontend.
*/

pub mod emulator;
pub mod runner;
pub mod util;
