//! Operator console on UART0
//!
//! The controller waits for commands synchronously, so reads and writes
//! block on the buffered UART. Its ring buffers are filled and drained
//! from the UART interrupt, which keeps running while we spin.

use defmt::*;
use embassy_futures::block_on;
use embedded_io_async::{Read, Write};

use labeler_core::traits::Console;
use labeler_protocol::{Line, LineError, LineParser};

/// Bytes pulled from the UART per read
const RX_CHUNK: usize = 32;

/// Line terminator sent after every status line
const EOL: &[u8] = b"\r\n";

/// Line-oriented console over an async byte stream
pub struct SerialConsole<R, W> {
    rx: R,
    tx: W,
    parser: LineParser,
    chunk: [u8; RX_CHUNK],
    start: usize,
    end: usize,
}

impl<R: Read, W: Write> SerialConsole<R, W> {
    pub fn new(rx: R, tx: W) -> Self {
        Self {
            rx,
            tx,
            parser: LineParser::new(),
            chunk: [0; RX_CHUNK],
            start: 0,
            end: 0,
        }
    }

    /// Feed buffered bytes until a line completes or the chunk runs out
    fn drain(&mut self) -> Option<Result<Line, LineError>> {
        while self.start < self.end {
            let (used, result) = self.parser.feed_bytes(&self.chunk[self.start..self.end]);
            self.start += used;
            match result {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => {}
                Err(e) => {
                    warn!("console line rejected: {}", e);
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl<R: Read, W: Write> Console for SerialConsole<R, W> {
    fn read_line(&mut self) -> Option<Result<Line, LineError>> {
        loop {
            if let Some(result) = self.drain() {
                if let Ok(line) = &result {
                    debug!("console <- {}", line.as_str());
                }
                return Some(result);
            }

            match block_on(self.rx.read(&mut self.chunk)) {
                Ok(0) => return None,
                Ok(n) => {
                    self.start = 0;
                    self.end = n;
                }
                Err(_) => {
                    warn!("console receive error, partial line discarded");
                    self.parser.reset();
                    return None;
                }
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        let tx = &mut self.tx;
        let result = block_on(async {
            tx.write_all(line.as_bytes()).await?;
            tx.write_all(EOL).await?;
            tx.flush().await
        });
        if result.is_err() {
            warn!("console write failed");
        }
    }
}
