//! Swing actuator
//!
//! The arm is a DC gear motor running between two endstops. There is no
//! position feedback in between, so a move is simply "run until the
//! endstop triggers or the window runs out".

use crate::config::MachineConfig;
use crate::fault::Fault;
use crate::pneumatic::label_held;
use crate::poll::{poll_until, Check, PollOutcome};
use crate::traits::{Direction, MachineIo, Sensor, SwingMotor};

/// Arm end positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwingSide {
    /// Pickup side (label feeder)
    Left,
    /// Deposit side (over the target)
    Right,
}

impl SwingSide {
    /// Endstop marking this side
    pub fn endstop(self) -> Sensor {
        match self {
            SwingSide::Left => Sensor::SwingLeft,
            SwingSide::Right => Sensor::SwingRight,
        }
    }

    /// Motor direction toward this side
    pub fn direction(self) -> Direction {
        match self {
            SwingSide::Left => Direction::CounterClockwise,
            SwingSide::Right => Direction::Clockwise,
        }
    }
}

/// Swing the arm to `side`
///
/// With `check_vacuum` the move aborts as soon as one vacuum sample falls
/// below the threshold. The motor is stopped on every exit path.
pub fn rotate<IO, M>(
    io: &mut IO,
    motor: &mut M,
    config: &MachineConfig,
    side: SwingSide,
    check_vacuum: bool,
) -> Result<(), Fault>
where
    IO: MachineIo + ?Sized,
    M: SwingMotor + ?Sized,
{
    let endstop = side.endstop();
    motor.run(side.direction(), config.swing_speed);

    let outcome = poll_until(io, config.swing_timeout, |io| {
        if io.is_triggered(endstop) {
            Check::Satisfied
        } else if check_vacuum && !label_held(io, config) {
            Check::Abort
        } else {
            Check::Pending
        }
    });
    motor.stop();

    match outcome {
        PollOutcome::Satisfied => {
            io.delay_ms(config.swing_settle);
            Ok(())
        }
        PollOutcome::Aborted => {
            warn!("vacuum lost swinging to {}", side);
            Err(Fault::VacuumLost)
        }
        PollOutcome::TimedOut => {
            warn!("swing to {} blocked", side);
            Err(Fault::SwingBlocked)
        }
    }
}
