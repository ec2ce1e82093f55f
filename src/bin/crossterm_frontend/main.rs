use std::path::PathBuf;

use structopt::StructOpt;

use chip8_core::emulator::Emulator;
use chip8_core::runner::{Config, Runner};

mod crossterm_io;
mod key_buffer;
mod key_manager;
use crossterm_io::{CrosstermInput, CrosstermOutput};
use key_manager::KeyManager;

/// The program options.
#[derive(StructOpt)]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Instructions per second
    #[structopt(short, long, default_value = "480")]
    speed: u32,

    /// Timer and screen refresh frequency in Hz
    #[structopt(long, default_value = "60")]
    timer_hz: u32,

    /// Seed for the random number generator
    #[structopt(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Get configuration and read input file
    let opt = Opt::from_args();
    log::info!("Executing {:?}", &opt.input);
    let program = std::fs::read(&opt.input)?;

    let config = Config {
        instructions_per_second: opt.speed,
        timer_hz: opt.timer_hz,
    };

    let key_manager = KeyManager::new();
    let input = CrosstermInput::new(key_manager.key_buffer());

    // Load instructions into emulator memory
    let mut emulator = match opt.seed {
        Some(seed) => Emulator::with_seed(input, seed),
        None => Emulator::with_input(input),
    };
    emulator.load(&program)?;

    // Start execution, the terminal is restored when the runner is dropped
    let mut runner = Runner::new(emulator, CrosstermOutput::new()?, config);
    runner.run(|| key_manager.quit_requested())?;

    Ok(())
}
