//! Raspberry Pi adapter error types.

use switchhub_domain::error::{DriverError, SwitchHubError};

/// Errors specific to the Raspberry Pi adapter.
#[derive(Debug, thiserror::Error)]
pub enum RpiError {
    /// The GPIO peripheral or a line could not be accessed.
    #[error("GPIO error")]
    Gpio(#[source] rppal::gpio::Error),

    /// The SPI bus could not be opened or a transfer failed.
    #[error("SPI error")]
    Spi(#[source] rppal::spi::Error),

    #[error("device `{0}` does not exist")]
    MissingDevice(String),

    #[error("invalid SPI device `{0}`, expected `/dev/spidev<bus>.<cs>`")]
    InvalidSpiDevice(String),

    #[error("hardware address {0} out of range 0-3")]
    InvalidAddress(u8),

    #[error("channel {0} out of range 0-7")]
    InvalidChannel(u8),
}

impl RpiError {
    /// Convert into a [`DriverError`] raised while initialising `device`.
    pub fn into_init(self, device: &str) -> SwitchHubError {
        DriverError::init(device, self).into()
    }

    /// Convert into a [`DriverError`] raised while `device` was running.
    pub fn into_io(self, device: &str) -> SwitchHubError {
        DriverError::io(device, self).into()
    }
}

impl From<rppal::gpio::Error> for RpiError {
    fn from(err: rppal::gpio::Error) -> Self {
        Self::Gpio(err)
    }
}

impl From<rppal::spi::Error> for RpiError {
    fn from(err: rppal::spi::Error) -> Self {
        Self::Spi(err)
    }
}
