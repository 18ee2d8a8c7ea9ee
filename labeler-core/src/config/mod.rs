//! Configuration
//!
//! Machine parameters, sensor polarity, and the console exchange used to
//! replace the parameters at runtime.

pub mod exchange;
pub mod hardware;
pub mod machine;

pub use hardware::SensorLevels;
pub use machine::{
    ConfigError, MachineConfig, Param, CONFIG_VERSION, MAX_ENCODED_LEN, PARAM_NAMES,
};
