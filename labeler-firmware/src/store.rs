//! Configuration persistence
//!
//! Loads the machine configuration from flash and stores accepted
//! replacements. Falls back to the machine.toml defaults if flash is
//! empty, unreadable, or from another layout version.

use defmt::*;

use labeler_core::config::{ConfigError, MachineConfig, MAX_ENCODED_LEN};
use labeler_hal::flash::{FlashError, FlashStorage, StorageKey};

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Flash operation failed
    Flash(FlashError),
    /// Stored bytes did not decode into a valid configuration
    Config(ConfigError),
}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        StoreError::Flash(e)
    }
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        StoreError::Config(e)
    }
}

/// Configuration persistence manager
pub struct ConfigStore<F> {
    storage: F,
}

impl<F: FlashStorage> ConfigStore<F> {
    pub fn new(storage: F) -> Self {
        Self { storage }
    }

    /// Load the stored configuration
    pub async fn load(&mut self) -> Result<MachineConfig, StoreError> {
        let mut buffer = [0u8; MAX_ENCODED_LEN];
        let len = self
            .storage
            .read(StorageKey::MachineConfig, &mut buffer)
            .await?;
        debug!("read {} bytes of configuration from flash", len);
        Ok(MachineConfig::from_bytes(&buffer[..len])?)
    }

    /// Load the stored configuration, or `defaults` when there is none
    pub async fn load_or(&mut self, defaults: MachineConfig) -> MachineConfig {
        match self.load().await {
            Ok(config) => {
                info!("loaded configuration from flash");
                config
            }
            Err(StoreError::Flash(FlashError::NotFound)) => {
                info!("no configuration in flash, using machine.toml defaults");
                defaults
            }
            Err(e) => {
                warn!("stored configuration unusable ({}), using machine.toml defaults", e);
                defaults
            }
        }
    }

    /// Store an accepted configuration
    pub async fn save(&mut self, config: &MachineConfig) -> Result<(), StoreError> {
        let mut buffer = [0u8; MAX_ENCODED_LEN];
        let bytes = config.to_bytes(&mut buffer)?;
        self.storage.write(StorageKey::MachineConfig, bytes).await?;
        info!("configuration saved ({} bytes)", bytes.len());
        Ok(())
    }
}
