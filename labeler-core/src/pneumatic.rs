//! Pneumatic controller
//!
//! Probe, clamp and vacuum valves. Every toggle is followed by its settle
//! delay; the vacuum valve is confirmed through the vacuum sensor. All
//! operations are idempotent and keep no state of their own.

use crate::config::MachineConfig;
use crate::poll::{poll_until, Check};
use crate::traits::{MachineIo, Valve};

/// Extend the datum probe
pub fn deploy_probe<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) {
    io.set_valve(Valve::Probe, true);
    io.delay_ms(config.probe_delay);
}

/// Retract the datum probe
pub fn retract_probe<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) {
    io.set_valve(Valve::Probe, false);
    io.delay_ms(config.probe_delay);
}

/// Close the clamp, small stage first
pub fn deploy_clamp<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) {
    io.set_valve(Valve::ClampSmall, true);
    io.delay_ms(config.clamp_delay);
    io.set_valve(Valve::ClampBig, true);
    io.delay_ms(config.clamp_delay);
}

/// Open the clamp, big stage first
pub fn retract_clamp<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) {
    io.set_valve(Valve::ClampBig, false);
    io.delay_ms(config.clamp_delay);
    io.set_valve(Valve::ClampSmall, false);
    io.delay_ms(config.clamp_delay);
}

/// Check a single vacuum sample against the threshold
pub fn label_held<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) -> bool {
    io.vacuum_level() >= config.vacuum_threshold
}

/// Wait one vacuum window for a held label
///
/// The valve is left as it is.
pub fn confirm_vacuum<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) -> bool {
    poll_until(io, config.vacuum_delay, |io| {
        if label_held(io, config) {
            Check::Satisfied
        } else {
            Check::Pending
        }
    })
    .is_satisfied()
}

/// Open the vacuum valve and wait for a held label
///
/// Returns `false` if no label was seen within the window. The valve stays
/// open either way.
pub fn vacuum_on<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) -> bool {
    io.set_valve(Valve::Vacuum, true);
    let held = confirm_vacuum(io, config);
    debug!("vacuum on: held={}", held);
    held
}

/// Close the vacuum valve and wait for the reading to drop
///
/// Gives up silently when the window expires.
pub fn vacuum_off<IO: MachineIo + ?Sized>(io: &mut IO, config: &MachineConfig) {
    io.set_valve(Valve::Vacuum, false);
    let released = poll_until(io, config.vacuum_delay, |io| {
        if label_held(io, config) {
            Check::Pending
        } else {
            Check::Satisfied
        }
    });
    if !released.is_satisfied() {
        warn!("vacuum still reads high after release");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Sim, SimEvent};

    #[test]
    fn test_clamp_ordering() {
        let sim = Sim::new();
        let mut io = sim.io();
        let config = MachineConfig::default();

        deploy_clamp(&mut io, &config);
        retract_clamp(&mut io, &config);

        assert_eq!(
            sim.valve_events(),
            vec![
                SimEvent::Valve(Valve::ClampSmall, true),
                SimEvent::Valve(Valve::ClampBig, true),
                SimEvent::Valve(Valve::ClampBig, false),
                SimEvent::Valve(Valve::ClampSmall, false),
            ]
        );
    }

    #[test]
    fn test_settle_delays() {
        let sim = Sim::new();
        let mut io = sim.io();
        let config = MachineConfig::default();

        let t0 = sim.now();
        deploy_probe(&mut io, &config);
        assert_eq!(sim.now() - t0, u64::from(config.probe_delay));

        let t1 = sim.now();
        deploy_clamp(&mut io, &config);
        assert_eq!(sim.now() - t1, 2 * u64::from(config.clamp_delay));
    }

    #[test]
    fn test_probe_and_clamp_idempotent() {
        let sim = Sim::new();
        let mut io = sim.io();
        let config = MachineConfig::default();

        retract_probe(&mut io, &config);
        retract_probe(&mut io, &config);
        assert!(!sim.valve(Valve::Probe));

        deploy_clamp(&mut io, &config);
        deploy_clamp(&mut io, &config);
        assert!(sim.valve(Valve::ClampSmall));
        assert!(sim.valve(Valve::ClampBig));
    }

    #[test]
    fn test_vacuum_on_with_label() {
        let sim = Sim::new();
        let mut io = sim.io();
        let config = MachineConfig::default();

        assert!(vacuum_on(&mut io, &config));
        assert!(sim.valve(Valve::Vacuum));
    }

    #[test]
    fn test_vacuum_on_empty_feeder_keeps_valve_open() {
        let sim = Sim::new();
        sim.world().feeder_empty();
        let mut io = sim.io();
        let config = MachineConfig::default();

        let t0 = sim.now();
        assert!(!vacuum_on(&mut io, &config));
        assert!(sim.valve(Valve::Vacuum));
        assert!(sim.now() - t0 >= u64::from(config.vacuum_delay));
    }

    #[test]
    fn test_vacuum_off_never_fails() {
        let sim = Sim::new();
        let mut io = sim.io();
        let config = MachineConfig::default();

        vacuum_on(&mut io, &config);
        vacuum_off(&mut io, &config);
        assert!(!sim.valve(Valve::Vacuum));
        assert!(!label_held(&mut io, &config));

        // Already off
        vacuum_off(&mut io, &config);
        assert!(!sim.valve(Valve::Vacuum));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut config = MachineConfig::default();

        vacuum_on(&mut io, &config);
        config.vacuum_threshold = sim.world().held_level;
        assert!(label_held(&mut io, &config));
        config.vacuum_threshold += 1;
        assert!(!label_held(&mut io, &config));
    }
}
