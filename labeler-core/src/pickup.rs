//! Vacuum pickup sequencer
//!
//! Picks one label off the feeder and carries it to the deposit side.
//! If the suction cup does not seal on the first try the axis bounces to
//! re-seat it, up to [`PICKUP_ATTEMPTS`] tries in total.

use crate::config::MachineConfig;
use crate::fault::Fault;
use crate::motion::Axis;
use crate::pneumatic::{confirm_vacuum, vacuum_off, vacuum_on};
use crate::swing::{rotate, SwingSide};
use crate::traits::{AxisStepper, MachineIo, SwingMotor};

/// Pickup tries, counting the initial vacuum-on check
pub const PICKUP_ATTEMPTS: u8 = 3;

/// Pick a label and bring it to the deposit side
///
/// Returns the attempt on which the label was confirmed. Vacuum is off on
/// return unless the swing back faulted, in which case the `Error` entry
/// actions release it.
pub fn pick_label<IO, M, S>(
    io: &mut IO,
    motor: &mut M,
    axis: &mut Axis<S>,
    config: &MachineConfig,
) -> Result<u8, Fault>
where
    IO: MachineIo + ?Sized,
    M: SwingMotor + ?Sized,
    S: AxisStepper,
{
    rotate(io, motor, config, SwingSide::Left, false)?;

    let mut attempt = 1;
    let mut held = vacuum_on(io, config);
    while !held {
        if attempt >= PICKUP_ATTEMPTS {
            warn!("no label after {} attempts", attempt);
            vacuum_off(io, config);
            return Err(Fault::FeederEmpty);
        }
        axis.bounce(io, config)?;
        attempt += 1;
        held = confirm_vacuum(io, config);
    }
    debug!("label held on attempt {}", attempt);

    rotate(io, motor, config, SwingSide::Right, true)?;
    io.delay_ms(config.transfer_settle);
    vacuum_off(io, config);
    Ok(attempt)
}
