//! Hardware collection configuration.

use serde::Deserialize;

use crate::error::RpiError;

/// BCM lines driven as outputs; output `i` drives `pins[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub pins: Vec<u8>,
    /// Drive the line low to switch on, as most relay boards expect.
    pub active_low: bool,
}

/// A PiFace Digital board on an SPI chip-select.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PiFaceConfig {
    /// SPI device node, `/dev/spidev<bus>.<cs>`.
    pub device: String,
    /// Board address set by the on-board jumpers (0-3).
    pub hardware_address: u8,
    /// Output channels exposed, in index order.
    pub channels: Vec<u8>,
}

impl Default for PiFaceConfig {
    fn default() -> Self {
        Self {
            device: "/dev/spidev0.0".to_string(),
            hardware_address: 0,
            channels: (0..8).collect(),
        }
    }
}

impl PiFaceConfig {
    /// Check the address and channel ranges.
    ///
    /// # Errors
    ///
    /// Returns [`RpiError::InvalidAddress`] or [`RpiError::InvalidChannel`].
    pub fn validate(&self) -> Result<(), RpiError> {
        if self.hardware_address > 3 {
            return Err(RpiError::InvalidAddress(self.hardware_address));
        }
        if let Some(&channel) = self.channels.iter().find(|&&c| c > 7) {
            return Err(RpiError::InvalidChannel(channel));
        }
        Ok(())
    }
}
