//! Bounded polling
//!
//! Every wait in the machine sequences is a loop over a sensor check with
//! a millisecond window. The check runs at least once, even for a zero
//! window, before the deadline is looked at.

use crate::traits::MachineIo;

/// Result of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Keep polling
    Pending,
    /// Condition met
    Satisfied,
    /// Give up immediately
    Abort,
}

/// How a poll ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    Satisfied,
    TimedOut,
    Aborted,
}

impl PollOutcome {
    pub fn is_satisfied(self) -> bool {
        self == PollOutcome::Satisfied
    }
}

/// Poll `check` until it settles or `window_ms` has elapsed
pub fn poll_until<IO, F>(io: &mut IO, window_ms: u32, mut check: F) -> PollOutcome
where
    IO: MachineIo + ?Sized,
    F: FnMut(&mut IO) -> Check,
{
    let start = io.now_ms();
    loop {
        match check(io) {
            Check::Satisfied => return PollOutcome::Satisfied,
            Check::Abort => return PollOutcome::Aborted,
            Check::Pending => {}
        }
        if io.now_ms().saturating_sub(start) >= u64::from(window_ms) {
            return PollOutcome::TimedOut;
        }
    }
}

/// Time bound for a move of `steps` at `rate` steps/s
///
/// Twice the nominal duration plus a second, so ramping and a slow poll
/// loop never trip it on a healthy axis.
pub fn move_window_ms(steps: u32, rate: u32) -> u32 {
    let nominal = u64::from(steps) * 1000 / u64::from(rate.max(1));
    (nominal * 2 + 1000).min(u64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Sim;

    #[test]
    fn test_satisfied_immediately() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut calls = 0;
        let outcome = poll_until(&mut io, 100, |_| {
            calls += 1;
            Check::Satisfied
        });
        assert_eq!(outcome, PollOutcome::Satisfied);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_window_checks_once() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut calls = 0;
        let outcome = poll_until(&mut io, 0, |_| {
            calls += 1;
            Check::Pending
        });
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_times_out_after_window() {
        let sim = Sim::new();
        let mut io = sim.io();
        let start = sim.now();
        let outcome = poll_until(&mut io, 50, |_| Check::Pending);
        assert_eq!(outcome, PollOutcome::TimedOut);
        let elapsed = sim.now() - start;
        assert!(elapsed >= 50 && elapsed < 60, "elapsed {}", elapsed);
    }

    #[test]
    fn test_abort_wins() {
        let sim = Sim::new();
        let mut io = sim.io();
        let mut n = 0;
        let outcome = poll_until(&mut io, 1000, |_| {
            n += 1;
            if n == 3 {
                Check::Abort
            } else {
                Check::Pending
            }
        });
        assert_eq!(outcome, PollOutcome::Aborted);
        assert_eq!(n, 3);
    }

    #[test]
    fn test_move_window() {
        assert_eq!(move_window_ms(480, 480), 3000);
        assert_eq!(move_window_ms(0, 480), 1000);
        // Zero rate does not divide by zero
        assert!(move_window_ms(100, 0) > 0);
    }
}
