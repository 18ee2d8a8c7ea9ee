//! Machine parameters
//!
//! A flat set of named numeric parameters. The controller reads them at the
//! start of every operation and only swaps the whole set between cycles,
//! after [`MachineConfig::validate`] has accepted the replacement.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest step rate the step generator is asked for (steps/s)
pub const MAX_STEP_RATE: u32 = 100_000;

/// Highest raw reading of the 12-bit vacuum ADC
pub const MAX_VACUUM_READING: u16 = 4095;

/// Layout version of the persisted configuration
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on the encoded size of a configuration
pub const MAX_ENCODED_LEN: usize = 96;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Name does not match any parameter
    UnknownParameter,
    /// Value does not fit the parameter's storage
    ValueTooLarge(Param),
    /// Value is outside the parameter's accepted range
    Invalid(Param),
    /// Exchange line could not be parsed
    Malformed,
    /// Binary encoding or decoding failed
    Encoding,
    /// Stored layout is from another firmware version
    VersionMismatch,
}

/// Parameter identifiers, in listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Param {
    StepsPerMm,
    MaxTravel,
    MaxSpeed,
    HomingSpeed,
    Acceleration,
    ProbeDelay,
    ClampDelay,
    VacuumDelay,
    VacuumThreshold,
    RunCurrent,
    HoldCurrent,
    Backoff,
    HomingSettle,
    Hop,
    SwingSpeed,
    SwingTimeout,
    SwingSettle,
    TransferSettle,
}

impl Param {
    /// Number of parameters
    pub const COUNT: usize = 18;

    /// Every parameter in listing order
    pub const ALL: [Param; Self::COUNT] = [
        Param::StepsPerMm,
        Param::MaxTravel,
        Param::MaxSpeed,
        Param::HomingSpeed,
        Param::Acceleration,
        Param::ProbeDelay,
        Param::ClampDelay,
        Param::VacuumDelay,
        Param::VacuumThreshold,
        Param::RunCurrent,
        Param::HoldCurrent,
        Param::Backoff,
        Param::HomingSettle,
        Param::Hop,
        Param::SwingSpeed,
        Param::SwingTimeout,
        Param::SwingSettle,
        Param::TransferSettle,
    ];

    /// Name used on the console and in `machine.toml`
    pub const fn name(self) -> &'static str {
        match self {
            Param::StepsPerMm => "steps_per_mm",
            Param::MaxTravel => "max_travel",
            Param::MaxSpeed => "max_speed",
            Param::HomingSpeed => "homing_speed",
            Param::Acceleration => "acceleration",
            Param::ProbeDelay => "probe_delay",
            Param::ClampDelay => "clamp_delay",
            Param::VacuumDelay => "vacuum_delay",
            Param::VacuumThreshold => "vacuum_threshold",
            Param::RunCurrent => "run_current",
            Param::HoldCurrent => "hold_current",
            Param::Backoff => "backoff",
            Param::HomingSettle => "homing_settle",
            Param::Hop => "hop",
            Param::SwingSpeed => "swing_speed",
            Param::SwingTimeout => "swing_timeout",
            Param::SwingSettle => "swing_settle",
            Param::TransferSettle => "transfer_settle",
        }
    }

    /// Look a parameter up by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Parameter names in listing order
pub const PARAM_NAMES: [&str; Param::COUNT] = {
    let mut names = [""; Param::COUNT];
    let mut i = 0;
    while i < Param::COUNT {
        names[i] = Param::ALL[i].name();
        i += 1;
    }
    names
};

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MachineConfig {
    /// Axis steps per millimetre (microsteps included)
    pub steps_per_mm: u16,
    /// Software travel limit in mm
    pub max_travel: u16,
    /// Speed of ordinary axis moves in mm/s
    pub max_speed: u16,
    /// Speed while seeking a homing target in mm/s
    pub homing_speed: u16,
    /// Step generator ramp length
    pub acceleration: u16,
    /// Settle time after each probe valve toggle (ms)
    pub probe_delay: u32,
    /// Settle time after each clamp valve toggle (ms)
    pub clamp_delay: u32,
    /// Vacuum confirmation window (ms)
    pub vacuum_delay: u32,
    /// Raw vacuum reading at or above which a label is held
    pub vacuum_threshold: u16,
    /// Driver run current (% of full scale)
    pub run_current: u8,
    /// Driver hold current (% of full scale)
    pub hold_current: u8,
    /// Back-off distance after homing contact in mm
    pub backoff: u16,
    /// Settle time after homing and after each bounce leg (ms)
    pub homing_settle: u32,
    /// Pickup bounce height in mm
    pub hop: u16,
    /// Swing motor duty (%)
    pub swing_speed: u8,
    /// Swing move window (ms)
    pub swing_timeout: u32,
    /// Settle time once the arm reaches an endstop (ms)
    pub swing_settle: u32,
    /// Settle time at the deposit side before vacuum release (ms)
    pub transfer_settle: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            steps_per_mm: 160,
            max_travel: 120,
            max_speed: 80,
            homing_speed: 3,
            acceleration: 10,
            probe_delay: 500,
            clamp_delay: 200,
            vacuum_delay: 500,
            vacuum_threshold: 250,
            run_current: 100,
            hold_current: 10,
            backoff: 1,
            homing_settle: 200,
            hop: 2,
            swing_speed: 50,
            swing_timeout: 2000,
            swing_settle: 100,
            transfer_settle: 300,
        }
    }
}

impl MachineConfig {
    /// Read a parameter
    pub fn get(&self, param: Param) -> u32 {
        match param {
            Param::StepsPerMm => self.steps_per_mm.into(),
            Param::MaxTravel => self.max_travel.into(),
            Param::MaxSpeed => self.max_speed.into(),
            Param::HomingSpeed => self.homing_speed.into(),
            Param::Acceleration => self.acceleration.into(),
            Param::ProbeDelay => self.probe_delay,
            Param::ClampDelay => self.clamp_delay,
            Param::VacuumDelay => self.vacuum_delay,
            Param::VacuumThreshold => self.vacuum_threshold.into(),
            Param::RunCurrent => self.run_current.into(),
            Param::HoldCurrent => self.hold_current.into(),
            Param::Backoff => self.backoff.into(),
            Param::HomingSettle => self.homing_settle,
            Param::Hop => self.hop.into(),
            Param::SwingSpeed => self.swing_speed.into(),
            Param::SwingTimeout => self.swing_timeout,
            Param::SwingSettle => self.swing_settle,
            Param::TransferSettle => self.transfer_settle,
        }
    }

    /// Write a parameter
    ///
    /// Only checks that the value fits; cross-parameter rules are left to
    /// [`validate`](Self::validate).
    pub fn set(&mut self, param: Param, value: u32) -> Result<(), ConfigError> {
        let narrow16 = |v: u32| u16::try_from(v).map_err(|_| ConfigError::ValueTooLarge(param));
        let narrow8 = |v: u32| u8::try_from(v).map_err(|_| ConfigError::ValueTooLarge(param));
        match param {
            Param::StepsPerMm => self.steps_per_mm = narrow16(value)?,
            Param::MaxTravel => self.max_travel = narrow16(value)?,
            Param::MaxSpeed => self.max_speed = narrow16(value)?,
            Param::HomingSpeed => self.homing_speed = narrow16(value)?,
            Param::Acceleration => self.acceleration = narrow16(value)?,
            Param::ProbeDelay => self.probe_delay = value,
            Param::ClampDelay => self.clamp_delay = value,
            Param::VacuumDelay => self.vacuum_delay = value,
            Param::VacuumThreshold => self.vacuum_threshold = narrow16(value)?,
            Param::RunCurrent => self.run_current = narrow8(value)?,
            Param::HoldCurrent => self.hold_current = narrow8(value)?,
            Param::Backoff => self.backoff = narrow16(value)?,
            Param::HomingSettle => self.homing_settle = value,
            Param::Hop => self.hop = narrow16(value)?,
            Param::SwingSpeed => self.swing_speed = narrow8(value)?,
            Param::SwingTimeout => self.swing_timeout = value,
            Param::SwingSettle => self.swing_settle = value,
            Param::TransferSettle => self.transfer_settle = value,
        }
        Ok(())
    }

    /// Write a parameter by name
    pub fn set_by_name(&mut self, name: &str, value: u32) -> Result<(), ConfigError> {
        let param = Param::from_name(name).ok_or(ConfigError::UnknownParameter)?;
        self.set(param, value)
    }

    /// Read a parameter by name
    pub fn get_by_name(&self, name: &str) -> Option<u32> {
        Param::from_name(name).map(|p| self.get(p))
    }

    /// Check every rule a configuration must satisfy before use
    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::Invalid;

        if self.steps_per_mm == 0 {
            return Err(Invalid(Param::StepsPerMm));
        }
        if self.max_travel == 0 || self.travel_steps_u32() > i32::MAX as u32 {
            return Err(Invalid(Param::MaxTravel));
        }
        if self.max_speed == 0 || self.move_rate() > MAX_STEP_RATE {
            return Err(Invalid(Param::MaxSpeed));
        }
        if self.homing_speed == 0 || self.homing_speed > self.max_speed {
            return Err(Invalid(Param::HomingSpeed));
        }
        if self.vacuum_threshold == 0 || self.vacuum_threshold > MAX_VACUUM_READING {
            return Err(Invalid(Param::VacuumThreshold));
        }
        if self.run_current == 0 || self.run_current > 100 {
            return Err(Invalid(Param::RunCurrent));
        }
        if self.hold_current > self.run_current {
            return Err(Invalid(Param::HoldCurrent));
        }
        if self.backoff >= self.max_travel {
            return Err(Invalid(Param::Backoff));
        }
        if self.hop >= self.max_travel {
            return Err(Invalid(Param::Hop));
        }
        if self.swing_speed == 0 || self.swing_speed > 100 {
            return Err(Invalid(Param::SwingSpeed));
        }
        if self.swing_timeout == 0 {
            return Err(Invalid(Param::SwingTimeout));
        }
        Ok(())
    }

    fn travel_steps_u32(&self) -> u32 {
        u32::from(self.steps_per_mm) * u32::from(self.max_travel)
    }

    /// Longest homing move in steps
    pub fn travel_steps(&self) -> i32 {
        // Bounded by validate()
        self.travel_steps_u32().min(i32::MAX as u32) as i32
    }

    /// Convert a distance in mm into steps
    pub fn mm_to_steps(&self, mm: u16) -> i32 {
        (u32::from(self.steps_per_mm) * u32::from(mm)).min(i32::MAX as u32) as i32
    }

    /// Seeking step rate (steps/s)
    pub fn homing_rate(&self) -> u32 {
        u32::from(self.homing_speed) * u32::from(self.steps_per_mm)
    }

    /// Ordinary move step rate (steps/s)
    pub fn move_rate(&self) -> u32 {
        u32::from(self.max_speed) * u32::from(self.steps_per_mm)
    }

    /// Encode for persistent storage
    ///
    /// The layout version travels with the data so a firmware update that
    /// changes the struct falls back to defaults instead of misreading it.
    #[cfg(feature = "serde")]
    pub fn to_bytes<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(&(CONFIG_VERSION, self), buf).map_err(|_| ConfigError::Encoding)
    }

    /// Decode and validate a stored configuration
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let (version, config): (u8, MachineConfig) =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Encoding)?;
        if version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MachineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.travel_steps(), 160 * 120);
        assert_eq!(config.homing_rate(), 480);
        assert_eq!(config.move_rate(), 12_800);
    }

    #[test]
    fn test_names_match_params() {
        assert_eq!(PARAM_NAMES.len(), Param::COUNT);
        for (i, param) in Param::ALL.iter().enumerate() {
            assert_eq!(PARAM_NAMES[i], param.name());
            assert_eq!(Param::from_name(param.name()), Some(*param));
        }
        assert_eq!(Param::from_name("nope"), None);
    }

    #[test]
    fn test_get_set_every_param() {
        let mut config = MachineConfig::default();
        for (i, param) in Param::ALL.iter().enumerate() {
            let value = 7 + i as u32;
            config.set(*param, value).unwrap();
            assert_eq!(config.get(*param), value);
        }
    }

    #[test]
    fn test_set_by_name() {
        let mut config = MachineConfig::default();
        config.set_by_name("hop", 3).unwrap();
        assert_eq!(config.hop, 3);
        assert_eq!(config.get_by_name("hop"), Some(3));
        assert_eq!(config.set_by_name("hopp", 3), Err(ConfigError::UnknownParameter));
        assert_eq!(config.get_by_name("hopp"), None);
    }

    #[test]
    fn test_set_rejects_oversized_values() {
        let mut config = MachineConfig::default();
        assert_eq!(
            config.set(Param::RunCurrent, 256),
            Err(ConfigError::ValueTooLarge(Param::RunCurrent))
        );
        assert_eq!(
            config.set(Param::StepsPerMm, 70_000),
            Err(ConfigError::ValueTooLarge(Param::StepsPerMm))
        );
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn test_validate_rules() {
        let check = |param: Param, value: u32| {
            let mut config = MachineConfig::default();
            config.set(param, value).unwrap();
            config.validate()
        };

        assert_eq!(check(Param::StepsPerMm, 0), Err(ConfigError::Invalid(Param::StepsPerMm)));
        assert_eq!(check(Param::MaxTravel, 0), Err(ConfigError::Invalid(Param::MaxTravel)));
        assert_eq!(check(Param::MaxSpeed, 0), Err(ConfigError::Invalid(Param::MaxSpeed)));
        assert_eq!(check(Param::MaxSpeed, 1000), Err(ConfigError::Invalid(Param::MaxSpeed)));
        assert_eq!(check(Param::HomingSpeed, 81), Err(ConfigError::Invalid(Param::HomingSpeed)));
        assert_eq!(
            check(Param::VacuumThreshold, 5000),
            Err(ConfigError::Invalid(Param::VacuumThreshold))
        );
        assert_eq!(check(Param::RunCurrent, 101), Err(ConfigError::Invalid(Param::RunCurrent)));
        assert_eq!(check(Param::HoldCurrent, 101), Err(ConfigError::Invalid(Param::HoldCurrent)));
        assert_eq!(check(Param::Backoff, 120), Err(ConfigError::Invalid(Param::Backoff)));
        assert_eq!(check(Param::Hop, 200), Err(ConfigError::Invalid(Param::Hop)));
        assert_eq!(check(Param::SwingSpeed, 0), Err(ConfigError::Invalid(Param::SwingSpeed)));
        assert_eq!(check(Param::SwingTimeout, 0), Err(ConfigError::Invalid(Param::SwingTimeout)));

        // Zero settle times and a zero vacuum window are allowed
        assert_eq!(check(Param::VacuumDelay, 0), Ok(()));
        assert_eq!(check(Param::TransferSettle, 0), Ok(()));
    }

    #[test]
    fn test_travel_overflow_is_invalid() {
        let mut config = MachineConfig::default();
        config.steps_per_mm = u16::MAX;
        config.max_travel = u16::MAX;
        config.max_speed = 1;
        config.homing_speed = 1;
        assert_eq!(config.validate(), Err(ConfigError::Invalid(Param::MaxTravel)));
    }

    #[test]
    fn test_mm_to_steps() {
        let config = MachineConfig::default();
        assert_eq!(config.mm_to_steps(1), 160);
        assert_eq!(config.mm_to_steps(2), 320);
        assert_eq!(config.mm_to_steps(0), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_persisted_roundtrip_and_version() {
        let mut config = MachineConfig::default();
        config.hop = 4;
        let mut buf = [0u8; MAX_ENCODED_LEN];
        let encoded = config.to_bytes(&mut buf).unwrap();
        assert_eq!(MachineConfig::from_bytes(encoded), Ok(config));

        encoded[0] = CONFIG_VERSION + 1;
        assert_eq!(MachineConfig::from_bytes(encoded), Err(ConfigError::VersionMismatch));
        assert_eq!(MachineConfig::from_bytes(&[]), Err(ConfigError::Encoding));
    }
}
