//! Labeler - Label Applicator Firmware
//!
//! Main firmware binary for RP2040-based label applicators. A swing arm
//! picks labels off the feeder under vacuum, a stepper axis with a
//! pneumatic probe finds the datum, and pneumatic clamps press the label
//! onto the target. The machine is driven from a line-oriented serial
//! console.
//!
//! The controller runs its sequences synchronously; the executor only
//! hosts startup and the flash writes that follow a configuration change.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::{PIO0, UART0, UART1};
use embassy_rp::pio::Pio;
use embassy_rp::pwm::{self, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Duration;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use labeler_core::config::{MachineConfig, SensorLevels};
use labeler_core::pins::{PinBank, SensorPins, ValvePins};
use labeler_core::{Controller, Fault, StepOutcome};
use labeler_drivers::motor::{L293d, L293dConfig};
use labeler_drivers::stepper::{Tmc2209, Tmc2209Config};
use labeler_hal::gpio::ActiveLevel;
use labeler_hal_rp2040::adc::RpAnalog;
use labeler_hal_rp2040::flash::Rp2040FlashStorage;
use labeler_hal_rp2040::gpio::{RpInput, RpOutput};
use labeler_hal_rp2040::pwm::RpPwm;
use labeler_hal_rp2040::stepper::{PioStepper, StepperConfig};
use labeler_hal_rp2040::time::EmbassyTime;
use labeler_hal_rp2040::uart::{BlockingTx, TimedRx};

use crate::console::SerialConsole;
use crate::store::ConfigStore;

mod console;
mod store;

// DEFAULT_CONFIG and DEFAULT_LEVELS, generated from machine.toml
include!(concat!(env!("OUT_DIR"), "/defaults.rs"));

/// Driver setup attempts before giving up and reporting ERROR<06>
const DRIVER_ATTEMPTS: u8 = 3;

/// Per-read timeout on the driver bus
const DRIVER_RX_TIMEOUT: Duration = Duration::from_millis(20);

/// Swing motor PWM period at 125 MHz (20 kHz)
const SWING_PWM_TOP: u16 = 6249;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

// UART ring buffers (must live forever)
static CONSOLE_TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static CONSOLE_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static DRIVER_TX_BUF: StaticCell<[u8; 32]> = StaticCell::new();
static DRIVER_RX_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Labeler firmware starting...");

    let p = embassy_rp::init(Default::default());

    // Configuration from flash, or the machine.toml defaults
    let mut store = ConfigStore::new(Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0));
    let config = store.load_or(DEFAULT_CONFIG).await;
    log_config(&config);

    // Operator console on UART0 (GPIO0 TX, GPIO1 RX), 115200 baud
    let console_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default())
        .into_buffered(
            Irqs,
            CONSOLE_TX_BUF.init([0; 256]),
            CONSOLE_RX_BUF.init([0; 256]),
        );
    let (console_tx, console_rx) = console_uart.split();
    let console = SerialConsole::new(console_rx, console_tx);

    // Stepper driver bus on UART1 (GPIO8 TX, GPIO9 RX)
    let driver_uart = Uart::new_blocking(p.UART1, p.PIN_8, p.PIN_9, UartConfig::default())
        .into_buffered(
            Irqs,
            DRIVER_TX_BUF.init([0; 32]),
            DRIVER_RX_BUF.init([0; 64]),
        );
    let (driver_tx, driver_rx) = driver_uart.split();
    let mut driver = Tmc2209::new(
        BlockingTx(driver_tx),
        TimedRx::new(driver_rx, DRIVER_RX_TIMEOUT),
        Tmc2209Config {
            run_current: config.run_current,
            hold_current: config.hold_current,
            ..Default::default()
        },
    );
    let driver_linked = match driver.bring_up(DRIVER_ATTEMPTS, &mut EmbassyTime) {
        Ok(()) => {
            info!("TMC2209 configured");
            true
        }
        Err(e) => {
            error!("TMC2209 not responding after {} attempts: {}", DRIVER_ATTEMPTS, e);
            false
        }
    };

    // Axis stepper on PIO0 (STEP=GPIO11, DIR=GPIO10, ENABLE=GPIO12)
    let Pio { mut common, sm0, .. } = Pio::new(p.PIO0, Irqs);
    let stepper = PioStepper::new(
        &mut common,
        sm0,
        p.PIN_11,
        p.PIN_10,
        p.PIN_12,
        StepperConfig::default(),
    );

    // Swing motor on an L293D (IN1=GPIO13, IN2=GPIO14, EN=GPIO15 PWM7B)
    let mut pwm_config = pwm::Config::default();
    pwm_config.top = SWING_PWM_TOP;
    let swing_pwm = Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, pwm_config);
    let (_, swing_enable) = swing_pwm.split();
    let motor = L293d::new(
        RpOutput(Output::new(p.PIN_13, Level::Low)),
        RpOutput(Output::new(p.PIN_14, Level::Low)),
        RpPwm::new(unwrap!(swing_enable)),
        L293dConfig::default(),
    );

    // Valves on the heater/fan MOSFETs, sensors on the endstop inputs,
    // vacuum sensor on TH0 (GPIO27, ADC1)
    let valves = ValvePins {
        vacuum: RpOutput(Output::new(p.PIN_21, Level::Low)),
        probe: RpOutput(Output::new(p.PIN_23, Level::Low)),
        clamp_small: RpOutput(Output::new(p.PIN_17, Level::Low)),
        clamp_big: RpOutput(Output::new(p.PIN_18, Level::Low)),
    };
    let sensors = SensorPins {
        swing_right: RpInput(Input::new(p.PIN_25, Pull::Up)),
        swing_left: RpInput(Input::new(p.PIN_16, Pull::Up)),
        axis_upper: RpInput(Input::new(p.PIN_4, Pull::Up)),
        axis_lower: RpInput(Input::new(p.PIN_3, Pull::Up)),
        probe: RpInput(Input::new(p.PIN_22, Pull::Up)),
    };
    let vacuum = RpAnalog::new(
        Adc::new_blocking(p.ADC, adc::Config::default()),
        Channel::new_pin(p.PIN_27, Pull::None),
    );
    let io = PinBank::new(valves, sensors, DEFAULT_LEVELS, vacuum, EmbassyTime);

    let mut controller = Controller::new(io, stepper, motor, console, config);
    if !driver_linked {
        // Degraded mode: the machine is already in Error and stays usable
        controller.report(Fault::DriverLink);
    }

    info!("Hardware initialized, entering control loop");

    loop {
        if controller.step() == StepOutcome::ConfigReplaced {
            let config = *controller.config();
            if let Err(e) = store.save(&config).await {
                error!("failed to save configuration: {}", e);
            }
            if driver_linked {
                if let Err(e) = driver.set_current(config.run_current, config.hold_current) {
                    warn!("failed to update driver current: {}", e);
                }
            }
            log_config(&config);
        }
    }
}

fn log_config(config: &MachineConfig) {
    debug!(
        "axis: {} steps/mm, travel {} mm, speed {}/{} mm/s",
        config.steps_per_mm, config.max_travel, config.max_speed, config.homing_speed
    );
    debug!(
        "vacuum: threshold {}, window {} ms; swing: {}% for {} ms",
        config.vacuum_threshold, config.vacuum_delay, config.swing_speed, config.swing_timeout
    );
}
