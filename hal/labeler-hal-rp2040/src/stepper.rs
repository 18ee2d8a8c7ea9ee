//! PIO-based counted stepper driver
//!
//! Uses RP2040's Programmable I/O to emit an exact number of step pulses
//! per move. The CPU pushes `count - 1` into the TX FIFO; the state
//! machine pulses the step pin that many times plus one, then pushes a
//! completion word into the RX FIFO.
//!
//! The step rate is set by the clock divider. The PIO program spends
//! [`CYCLES_PER_STEP`] cycles per pulse, which keeps slow homing rates
//! within the 16-bit integer divider range.
//!
//! Progress inside a move is estimated from elapsed time; the completion
//! word makes the final count exact.

use embassy_rp::gpio::{Level, Output, Pin};
use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, Instance, PioPin, StateMachine,
};
use embassy_rp::Peri;
use embassy_time::Instant;
use fixed::types::U24F8;
use labeler_core::traits::AxisStepper;

/// System clock frequency (RP2040 default)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// PIO cycles per step pulse (16 high, 16 low including the loop jump)
pub const CYCLES_PER_STEP: u32 = 32;

/// Maximum step frequency in Hz
pub const MAX_STEP_FREQ_HZ: u32 = 200_000;

/// Stepper pin polarity
#[derive(Debug, Clone, Copy)]
pub struct StepperConfig {
    /// Enable pin is active low
    pub enable_inverted: bool,
    /// Direction pin level for negative (upward) moves
    pub up_level_high: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            enable_inverted: true,
            up_level_high: false,
        }
    }
}

/// Calculate the PIO clock divider for a step rate
///
/// freq = SYS_CLK / (divider * CYCLES_PER_STEP). Returns the 16.8
/// fixed-point divider as raw bits, clamped to the valid range.
pub fn calc_clock_divider(freq_hz: u32) -> u32 {
    let freq = freq_hz.clamp(1, MAX_STEP_FREQ_HZ);
    let cycles = u64::from(freq) * u64::from(CYCLES_PER_STEP);
    let divider_x256 = (u64::from(SYS_CLK_HZ) * 256) / cycles;
    divider_x256.clamp(256, 0xFFFF_FF) as u32
}

#[derive(Debug, Clone, Copy)]
struct Move {
    steps: u32,
    sign: i32,
    rate: u32,
    started: Instant,
}

impl Move {
    /// Steps emitted so far, never the last one before completion is seen
    fn estimated_done(&self) -> u32 {
        let elapsed_us = self.started.elapsed().as_micros();
        let done = elapsed_us * u64::from(self.rate) / 1_000_000;
        done.min(u64::from(self.steps.saturating_sub(1))) as u32
    }
}

/// Counted-move stepper on one PIO state machine
pub struct PioStepper<'d, PIO: Instance, const SM: usize> {
    sm: StateMachine<'d, PIO, SM>,
    cfg: Config<'d, PIO>,
    dir_pin: Output<'d>,
    enable_pin: Output<'d>,
    config: StepperConfig,
    rate: u32,
    position: i32,
    active: Option<Move>,
}

impl<'d, PIO: Instance, const SM: usize> PioStepper<'d, PIO, SM> {
    /// Create a new PIO stepper driver
    ///
    /// # Arguments
    /// * `common` - PIO common resources (for loading program)
    /// * `sm` - State machine to use
    /// * `step_pin` - GPIO pin for step pulses (must be PIO-capable)
    /// * `dir_pin` - GPIO pin for direction control
    /// * `enable_pin` - GPIO pin for enable control
    pub fn new<STEP: PioPin, DIR: Pin, EN: Pin>(
        common: &mut Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        step_pin: Peri<'d, STEP>,
        dir_pin: Peri<'d, DIR>,
        enable_pin: Peri<'d, EN>,
        config: StepperConfig,
    ) -> Self {
        let prg = pio::pio_asm!(
            ".wrap_target",
            "pull block",
            "mov x, osr",
            "step:",
            "set pins, 1 [15]",
            "set pins, 0 [14]",
            "jmp x-- step",
            "mov isr, null",
            "push block",
            ".wrap"
        );

        let installed = common.load_program(&prg.program);
        let step_pio_pin = common.make_pio_pin(step_pin);

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[&step_pio_pin]);
        cfg.set_set_pins(&[&step_pio_pin]);
        cfg.clock_divider = U24F8::from_bits(calc_clock_divider(1));

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[&step_pio_pin]);
        sm.set_pins(Level::Low, &[&step_pio_pin]);
        sm.set_enable(true);

        let dir_pin = Output::new(dir_pin, Level::Low);
        let enable_level = if config.enable_inverted {
            Level::High
        } else {
            Level::Low
        };
        let enable_pin = Output::new(enable_pin, enable_level);

        Self {
            sm,
            cfg,
            dir_pin,
            enable_pin,
            config,
            rate: 1,
            position: 0,
            active: None,
        }
    }

    /// Fold a finished move into the position
    fn poll_completion(&mut self) {
        if let Some(mv) = self.active {
            if self.sm.rx().try_pull().is_some() {
                self.position = self.position.wrapping_add(mv.sign * mv.steps as i32);
                self.active = None;
            }
        }
    }

    fn set_direction(&mut self, up: bool) {
        let high = up == self.config.up_level_high;
        self.dir_pin.set_level(if high { Level::High } else { Level::Low });
    }
}

impl<'d, PIO: Instance, const SM: usize> AxisStepper for PioStepper<'d, PIO, SM> {
    fn enable(&mut self, enabled: bool) {
        if enabled != self.config.enable_inverted {
            self.enable_pin.set_high();
        } else {
            self.enable_pin.set_low();
        }
    }

    fn set_speed(&mut self, steps_per_s: u32, _ramp: u16) {
        // Constant-rate pulses; the driver's interpolation smooths the start
        self.rate = steps_per_s.clamp(1, MAX_STEP_FREQ_HZ);
    }

    fn move_steps(&mut self, steps: i32) {
        self.stop();
        if steps == 0 {
            return;
        }

        self.set_direction(steps < 0);
        self.sm
            .set_clock_divider(U24F8::from_bits(calc_clock_divider(self.rate)));

        let count = steps.unsigned_abs();
        self.sm.tx().push(count - 1);
        self.active = Some(Move {
            steps: count,
            sign: steps.signum(),
            rate: self.rate,
            started: Instant::now(),
        });
    }

    fn steps_remaining(&mut self) -> u32 {
        self.poll_completion();
        match self.active {
            Some(mv) => mv.steps - mv.estimated_done(),
            None => 0,
        }
    }

    fn stop(&mut self) {
        self.poll_completion();
        let Some(mv) = self.active.take() else {
            return;
        };

        // Halt mid-move and put the program back at its entry point
        self.sm.set_enable(false);
        let done = mv.estimated_done();
        self.sm.clear_fifos();
        self.sm.restart();
        self.sm.set_config(&self.cfg);
        self.sm.set_enable(true);

        self.position = self.position.wrapping_add(mv.sign * done as i32);
    }

    fn position(&mut self) -> i32 {
        self.poll_completion();
        match self.active {
            Some(mv) => self
                .position
                .wrapping_add(mv.sign * mv.estimated_done() as i32),
            None => self.position,
        }
    }
}
