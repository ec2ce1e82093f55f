use std::path::PathBuf;

use structopt::StructOpt;

use chip8_core::emulator::input::DummyInput;
use chip8_core::emulator::{Emulator, StepOutcome};
use chip8_core::runner::Config;

/// Run a program without a screen or keyboard, then print what ended up on the screen.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// How many cycles to run before stopping
    #[structopt(short, long, default_value = "10000")]
    cycles: u64,

    /// Instructions per second, used to decide how often the timers tick
    #[structopt(short, long, default_value = "480")]
    speed: u32,

    /// Timer frequency in Hz
    #[structopt(long, default_value = "60")]
    timer_hz: u32,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?}", &opt.input);
    let program = std::fs::read(&opt.input)?;

    let config = Config {
        instructions_per_second: opt.speed,
        timer_hz: opt.timer_hz,
    };
    log::debug!("{:?}", config);

    // Load instructions into emulator memory
    let mut emulator = match opt.seed {
        Some(seed) => Emulator::with_seed(DummyInput, seed),
        None => Emulator::with_input(DummyInput),
    };
    emulator.load(&program)?;

    // Nobody will ever press a key, so a key wait ends the run
    let per_tick = u64::from(config.instructions_per_tick());
    for cycle in 1..=opt.cycles {
        if emulator.step()? == StepOutcome::WaitingForKey {
            log::info!("Waiting for a key after {} cycles, stopping", cycle);
            break;
        }
        if cycle % per_tick == 0 {
            emulator.tick_timers();
        }
    }

    if emulator.unknown_opcodes() > 0 {
        log::warn!("Skipped {} unknown opcodes", emulator.unknown_opcodes());
    }
    print!("{}", emulator.screen());
    Ok(())
}
