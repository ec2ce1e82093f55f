//! Drives an [`Emulator`] in real time.
//!
//! The emulator only knows how to do one cycle and one timer tick.
//! A frame here is one timer tick worth of cycles, after which the screen is presented.

use std::thread;
use std::time::{Duration, Instant};

use crate::emulator::input::EmulatorInput;
use crate::emulator::output::EmulatorOutput;
use crate::emulator::{Emulator, Result, StepOutcome};

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 480;
pub const DEFAULT_TIMER_HZ: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub instructions_per_second: u32,
    pub timer_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: DEFAULT_INSTRUCTIONS_PER_SECOND,
            timer_hz: DEFAULT_TIMER_HZ,
        }
    }
}

impl Config {
    /// At least one, so a frame always makes progress.
    pub fn instructions_per_tick(&self) -> u32 {
        (self.instructions_per_second / self.timer_hz.max(1)).max(1)
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.timer_hz.max(1)))
    }
}

pub struct Runner<I: EmulatorInput, O: EmulatorOutput> {
    emulator: Emulator<I>,
    output: O,
    config: Config,
    frames: u64,
}

impl<I: EmulatorInput, O: EmulatorOutput> Runner<I, O> {
    pub fn new(emulator: Emulator<I>, output: O, config: Config) -> Self {
        log::info!(
            "{} instructions per tick at {} Hz",
            config.instructions_per_tick(),
            config.timer_hz
        );
        Runner {
            emulator,
            output,
            config,
            frames: 0,
        }
    }

    /// Run one timer period: the configured number of cycles, one timer tick,
    /// then hand the screen and sound state to the output.
    pub fn run_frame(&mut self) -> Result<()> {
        for _ in 0..self.config.instructions_per_tick() {
            // No point spinning on the same keys for the rest of the frame
            if self.emulator.step()? == StepOutcome::WaitingForKey {
                break;
            }
        }
        self.emulator.tick_timers();
        self.output.present(self.emulator.screen());
        self.output.set_sound(self.emulator.sound_active());
        self.frames += 1;
        Ok(())
    }

    /// Run frames at the timer rate until `stop` says so or the emulator halts.
    pub fn run<F: FnMut() -> bool>(&mut self, mut stop: F) -> Result<()> {
        let frame_duration = self.config.frame_duration();
        while !stop() {
            let frame_start = Instant::now();
            self.run_frame()?;
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }
        log::info!("Stopped after {} frames", self.frames);
        Ok(())
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn emulator(&self) -> &Emulator<I> {
        &self.emulator
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::input::{DummyInput, FixedInput};
    use crate::emulator::output::DummyOutput;
    use crate::emulator::Error;

    fn runner<I: EmulatorInput>(input: I, program: &[u8], config: Config) -> Runner<I, DummyOutput> {
        let mut emulator = Emulator::with_seed(input, 7);
        emulator.load(program).unwrap();
        Runner::new(emulator, DummyOutput::new(), config)
    }

    #[test]
    fn default_is_eight_instructions_per_tick() {
        assert_eq!(Config::default().instructions_per_tick(), 8);
    }

    #[test]
    fn slow_speeds_still_run_one_instruction() {
        let config = Config {
            instructions_per_second: 10,
            timer_hz: 60,
        };
        assert_eq!(config.instructions_per_tick(), 1);
    }

    #[test]
    fn frame_runs_a_tick_worth_of_instructions_then_presents() {
        // 0x200: V0 += 1, 0x202: jump 0x200
        let program = [0x70, 0x01, 0x12, 0x00];
        let mut runner = runner(DummyInput, &program, Config::default());
        runner.run_frame().unwrap();
        assert_eq!(runner.emulator().register(0), 4);
        assert_eq!(runner.output().frames, 1);
        assert!(runner.output().last_frame.is_some());
    }

    #[test]
    fn sound_follows_the_sound_timer() {
        // V0 := 2, ST := V0, then spin
        let program = [0x60, 0x02, 0xF0, 0x18, 0x12, 0x04];
        let config = Config {
            instructions_per_second: 180,
            timer_hz: 60,
        };
        let mut runner = runner(DummyInput, &program, config);
        runner.run_frame().unwrap();
        assert!(runner.output().sound);
        runner.run_frame().unwrap();
        assert!(!runner.output().sound);
    }

    #[test]
    fn key_wait_ends_the_frame_early() {
        let program = [0xF1, 0x0A, 0x70, 0x01];
        let mut runner = runner(FixedInput::default(), &program, Config::default());
        runner.run_frame().unwrap();
        assert!(runner.emulator().is_waiting_for_key());
        assert_eq!(runner.emulator().program_counter(), 0x200);
        assert_eq!(runner.output().frames, 1);
    }

    #[test]
    fn run_stops_when_asked() {
        let program = [0x12, 0x00];
        let mut runner = runner(DummyInput, &program, Config::default());
        let mut remaining = 3;
        runner
            .run(|| {
                remaining -= 1;
                remaining < 0
            })
            .unwrap();
        assert_eq!(runner.frames(), 3);
    }

    #[test]
    fn run_surfaces_fatal_errors() {
        let program = [0x00, 0xEE];
        let mut runner = runner(DummyInput, &program, Config::default());
        assert_eq!(runner.run(|| false), Err(Error::StackUnderflow));
        assert!(runner.emulator().is_halted());
    }
}
