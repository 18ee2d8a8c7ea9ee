//! TMC2209 stepper driver (UART mode)
//!
//! The axis driver is configured once at startup over its single-wire
//! UART; stepping itself goes through the STEP/DIR pins.
//!
//! # UART Protocol
//!
//! 115200 baud 8N1, LSB-first CRC8 (polynomial 0x07):
//! - Write: sync 0x05, slave address, register | 0x80, 4 data bytes (big-endian), CRC
//! - Read request: sync, slave address, register, CRC
//! - Read reply: sync, 0xFF, register, 4 data bytes, CRC
//!
//! On a single-wire bus every byte sent is echoed back on RX before the
//! reply arrives.
//!
//! # Link check
//!
//! IFCNT counts successfully received write datagrams. Reading it before
//! and after the setup writes proves that the driver is powered, listening
//! on the expected address and accepting our CRCs.

use labeler_hal::time::Delay;
use labeler_hal::uart::{UartRx, UartTx};

/// TMC2209 Register addresses
pub mod reg {
    /// General configuration
    pub const GCONF: u8 = 0x00;
    /// Global status flags
    pub const GSTAT: u8 = 0x01;
    /// Interface transmission counter
    pub const IFCNT: u8 = 0x02;
    /// Hold/run current settings
    pub const IHOLD_IRUN: u8 = 0x10;
    /// Power down delay
    pub const TPOWERDOWN: u8 = 0x11;
    /// CoolStep configuration
    pub const COOLCONF: u8 = 0x42;
    /// Chopper configuration
    pub const CHOPCONF: u8 = 0x6C;
}

/// UART sync byte for TMC2209
const SYNC_BYTE: u8 = 0x05;
/// Master address in read replies
const MASTER_ADDRESS: u8 = 0xFF;
/// Write flag in the register byte
const WRITE_BIT: u8 = 0x80;
/// Chopper off time when the driver is enabled
const TOFF_ENABLED: u32 = 3;
/// Delay before dropping to hold current, in 2^18 clock units
const IHOLD_DELAY: u32 = 6;

/// Pause between bring-up attempts (ms)
pub const RETRY_DELAY_MS: u32 = 100;

/// TMC2209 communication errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tmc2209Error {
    /// UART reported an error or returned no data
    Uart,
    /// Invalid sync byte in response
    InvalidSync,
    /// CRC mismatch
    CrcMismatch,
    /// Reply was for a different register
    WrongRegister,
    /// IFCNT did not advance by the number of writes sent
    NotCommunicating,
}

/// Driver settings written at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tmc2209Config {
    /// UART address (0-3, set by MS1/MS2 pins)
    pub uart_address: u8,
    /// Microsteps per full step (power of two up to 256)
    pub microsteps: u16,
    /// Run current in percent of full scale
    pub run_current: u8,
    /// Standstill current in percent of full scale
    pub hold_current: u8,
    /// Load-dependent current reduction
    pub coolstep: bool,
    /// TX bytes come back on RX (single-wire wiring)
    pub echo: bool,
}

impl Default for Tmc2209Config {
    fn default() -> Self {
        Self {
            uart_address: 0,
            microsteps: 16,
            run_current: 100,
            hold_current: 10,
            coolstep: true,
            echo: true,
        }
    }
}

impl Tmc2209Config {
    /// Convert microsteps to MRES register value
    pub fn mres(&self) -> u8 {
        match self.microsteps {
            256 => 0,
            128 => 1,
            64 => 2,
            32 => 3,
            16 => 4,
            8 => 5,
            4 => 6,
            2 => 7,
            1 => 8,
            _ => 4,
        }
    }

    /// Convert a percentage into the 5-bit current scale (0-31)
    pub fn current_scale(percent: u8) -> u8 {
        (u16::from(percent.min(100)) * 31 / 100) as u8
    }

    fn gconf(&self) -> u32 {
        // pdn_disable, mstep_reg_select, multistep_filt; StealthChop stays on
        (1 << 6) | (1 << 7) | (1 << 8)
    }

    fn chopconf(&self, enabled: bool) -> u32 {
        let toff = if enabled { TOFF_ENABLED } else { 0 };
        // HSTRT = 5, TBL = 2, intpol
        toff | (5 << 4) | (2 << 15) | (u32::from(self.mres()) << 24) | (1 << 28)
    }

    fn ihold_irun(&self) -> u32 {
        let ihold = u32::from(Self::current_scale(self.hold_current));
        let irun = u32::from(Self::current_scale(self.run_current));
        (IHOLD_DELAY << 16) | (irun << 8) | ihold
    }

    fn coolconf(&self) -> u32 {
        // SEMIN = 1, SEMAX = 0
        if self.coolstep {
            1
        } else {
            0
        }
    }
}

/// CRC8 over a datagram, bits taken LSB first
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut current = byte;
        for _ in 0..8 {
            if ((crc >> 7) ^ (current & 0x01)) != 0 {
                crc = (crc << 1) ^ 0x07;
            } else {
                crc <<= 1;
            }
            current >>= 1;
        }
    }
    crc
}

/// Build a write datagram
pub fn build_write_datagram(addr: u8, reg: u8, data: u32) -> [u8; 8] {
    let mut datagram = [0u8; 8];
    datagram[0] = SYNC_BYTE;
    datagram[1] = addr;
    datagram[2] = reg | WRITE_BIT;
    datagram[3..7].copy_from_slice(&data.to_be_bytes());
    datagram[7] = crc8(&datagram[..7]);
    datagram
}

/// Build a read request datagram
pub fn build_read_request(addr: u8, reg: u8) -> [u8; 4] {
    let mut datagram = [SYNC_BYTE, addr, reg, 0];
    datagram[3] = crc8(&datagram[..3]);
    datagram
}

/// Parse a read reply for `reg`
pub fn parse_read_response(response: &[u8; 8], reg: u8) -> Result<u32, Tmc2209Error> {
    if response[0] != SYNC_BYTE || response[1] != MASTER_ADDRESS {
        return Err(Tmc2209Error::InvalidSync);
    }
    if response[7] != crc8(&response[..7]) {
        return Err(Tmc2209Error::CrcMismatch);
    }
    if response[2] != reg {
        return Err(Tmc2209Error::WrongRegister);
    }
    Ok(u32::from_be_bytes([response[3], response[4], response[5], response[6]]))
}

/// TMC2209 on a UART bus
pub struct Tmc2209<TX, RX> {
    tx: TX,
    rx: RX,
    config: Tmc2209Config,
}

impl<TX: UartTx, RX: UartRx> Tmc2209<TX, RX> {
    pub fn new(tx: TX, rx: RX, config: Tmc2209Config) -> Self {
        Self { tx, rx, config }
    }

    pub fn config(&self) -> &Tmc2209Config {
        &self.config
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), Tmc2209Error> {
        self.tx.write_blocking(bytes).map_err(|_| Tmc2209Error::Uart)?;
        self.tx.flush().map_err(|_| Tmc2209Error::Uart)?;
        if self.config.echo {
            let mut echo = [0u8; 8];
            self.receive(&mut echo[..bytes.len()])?;
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<(), Tmc2209Error> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .rx
                .read_blocking(&mut buf[filled..])
                .map_err(|_| Tmc2209Error::Uart)?;
            if n == 0 {
                return Err(Tmc2209Error::Uart);
            }
            filled += n;
        }
        Ok(())
    }

    /// Write one register
    pub fn write_register(&mut self, reg: u8, value: u32) -> Result<(), Tmc2209Error> {
        let datagram = build_write_datagram(self.config.uart_address, reg, value);
        self.send(&datagram)
    }

    /// Read one register
    pub fn read_register(&mut self, reg: u8) -> Result<u32, Tmc2209Error> {
        let request = build_read_request(self.config.uart_address, reg);
        self.send(&request)?;
        let mut response = [0u8; 8];
        self.receive(&mut response)?;
        parse_read_response(&response, reg)
    }

    fn write_counter(&mut self) -> Result<u8, Tmc2209Error> {
        Ok(self.read_register(reg::IFCNT)? as u8)
    }

    /// Write the full configuration and verify the link
    ///
    /// Leaves the chopper enabled; the hardware enable pin still gates
    /// the outputs.
    pub fn setup(&mut self) -> Result<(), Tmc2209Error> {
        let before = self.write_counter()?;

        let writes = [
            (reg::GCONF, self.config.gconf()),
            (reg::CHOPCONF, self.config.chopconf(true)),
            (reg::IHOLD_IRUN, self.config.ihold_irun()),
            (reg::TPOWERDOWN, 20),
            (reg::COOLCONF, self.config.coolconf()),
        ];
        for (reg, value) in writes {
            self.write_register(reg, value)?;
        }

        let after = self.write_counter()?;
        if after != before.wrapping_add(writes.len() as u8) {
            return Err(Tmc2209Error::NotCommunicating);
        }
        // Clear the reset flag so a later driver reset shows up in GSTAT
        self.write_register(reg::GSTAT, 0x07)
    }

    /// Run [`setup`](Self::setup) up to `attempts` times
    ///
    /// Stale bytes from a half-finished exchange are discarded before each
    /// retry. Returns the last error when every attempt failed.
    pub fn bring_up<D: Delay>(&mut self, attempts: u8, delay: &mut D) -> Result<(), Tmc2209Error> {
        let mut last = Tmc2209Error::NotCommunicating;
        for attempt in 1..=attempts {
            match self.setup() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last = e;
                    if attempt < attempts {
                        delay.delay_ms(RETRY_DELAY_MS);
                        self.discard_input();
                    }
                }
            }
        }
        Err(last)
    }

    fn discard_input(&mut self) {
        let mut scratch = [0u8; 8];
        for _ in 0..8 {
            match self.rx.read_blocking(&mut scratch) {
                Ok(n) if n > 0 => {}
                _ => break,
            }
        }
    }

    /// Check that the driver still accepts writes
    pub fn is_communicating(&mut self) -> bool {
        let check = |drv: &mut Self| -> Result<bool, Tmc2209Error> {
            let before = drv.write_counter()?;
            drv.write_register(reg::GCONF, drv.config.gconf())?;
            Ok(drv.write_counter()? == before.wrapping_add(1))
        };
        check(self).unwrap_or(false)
    }

    /// Enable or disable the chopper
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), Tmc2209Error> {
        let value = self.config.chopconf(enabled);
        self.write_register(reg::CHOPCONF, value)
    }

    /// Change run and hold current (percent)
    pub fn set_current(&mut self, run: u8, hold: u8) -> Result<(), Tmc2209Error> {
        self.config.run_current = run;
        self.config.hold_current = hold;
        let value = self.config.ihold_irun();
        self.write_register(reg::IHOLD_IRUN, value)
    }
}
