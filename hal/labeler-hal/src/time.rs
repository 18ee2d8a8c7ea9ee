//! Millisecond time base
//!
//! The machine sequences are built from bounded waits, so everything they
//! need from the platform is a monotonic clock and a blocking delay.

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch (typically boot)
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `since`
    fn elapsed_ms(&self, since: u64) -> u64 {
        self.now_ms().saturating_sub(since)
    }
}

/// Blocking delay provider
pub trait Delay {
    /// Block the caller for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}
