//! UART adapters
//!
//! The stepper driver bus must not hang when the driver is missing, so
//! reads carry a timeout.

use embassy_futures::block_on;
use embassy_time::{with_timeout, Duration};
use labeler_hal::uart::{UartRx, UartTx};

/// Receive errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    /// No byte arrived within the timeout
    Timeout,
    /// Framing, parity, overrun or break
    Uart,
}

/// Blocking transmitter over any `embedded_io::Write`
pub struct BlockingTx<W>(pub W);

impl<W: embedded_io::Write> UartTx for BlockingTx<W> {
    type Error = W::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

/// Receiver that gives up after `timeout`
pub struct TimedRx<R> {
    rx: R,
    timeout: Duration,
}

impl<R: embedded_io_async::Read> TimedRx<R> {
    pub fn new(rx: R, timeout: Duration) -> Self {
        Self { rx, timeout }
    }
}

impl<R: embedded_io_async::Read> UartRx for TimedRx<R> {
    type Error = RxError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, RxError> {
        match block_on(with_timeout(self.timeout, self.rx.read(buf))) {
            Ok(Ok(n)) => Ok(n),
            Ok(Err(_)) => Err(RxError::Uart),
            Err(_) => Err(RxError::Timeout),
        }
    }
}
