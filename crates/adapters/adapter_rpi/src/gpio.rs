use std::sync::{Mutex, PoisonError};

use rppal::gpio::{Gpio, OutputPin};
use switchhub_app::ports::SwitchCollection;
use switchhub_domain::collection::CollectionKind;
use switchhub_domain::error::{DriverError, IndexOutOfRange, SwitchHubError};

use crate::config::GpioConfig;
use crate::error::RpiError;

/// Outputs on BCM GPIO lines. Lines are claimed at `init` and released at
/// `close`.
pub struct GpioCollection {
    name: String,
    config: GpioConfig,
    lines: Mutex<Option<Vec<OutputPin>>>,
}

impl GpioCollection {
    #[must_use]
    pub fn new(name: impl Into<String>, config: GpioConfig) -> Self {
        Self {
            name: name.into(),
            config,
            lines: Mutex::new(None),
        }
    }

    /// Electrical level that represents `on`.
    fn level_for(&self, on: bool) -> bool {
        on != self.config.active_low
    }

    fn claim(&self) -> Result<Vec<OutputPin>, RpiError> {
        let gpio = Gpio::new()?;
        let off_high = self.level_for(false);
        self.config
            .pins
            .iter()
            .map(|&bcm| {
                let pin = gpio.get(bcm)?;
                Ok::<_, RpiError>(if off_high {
                    pin.into_output_high()
                } else {
                    pin.into_output_low()
                })
            })
            .collect()
    }

    fn with_line<T>(
        &self,
        index: usize,
        f: impl FnOnce(&mut OutputPin) -> T,
    ) -> Result<T, SwitchHubError> {
        let len = self.len();
        if index >= len {
            return Err(IndexOutOfRange { index, len }.into());
        }
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        let lines = lines.as_mut().ok_or_else(|| DriverError::NotInitialized {
            device: self.name.clone(),
        })?;
        Ok(f(&mut lines[index]))
    }
}

impl SwitchCollection for GpioCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Gpio
    }

    fn init(&self) -> Result<(), SwitchHubError> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.is_some() {
            return Ok(());
        }
        let claimed = self.claim().map_err(|err| err.into_init(&self.name))?;
        tracing::info!(
            collection = %self.name,
            pins = ?self.config.pins,
            active_low = self.config.active_low,
            "gpio outputs claimed"
        );
        *lines = Some(claimed);
        Ok(())
    }

    fn len(&self) -> usize {
        self.config.pins.len()
    }

    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError> {
        self.with_line(index, |line| line.is_set_high() == self.level_for(true))
    }

    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError> {
        let high = self.level_for(on);
        self.with_line(index, |line| {
            if high {
                line.set_high();
            } else {
                line.set_low();
            }
        })?;
        tracing::debug!(collection = %self.name, index, on, "gpio output set");
        Ok(())
    }

    fn close(&self) -> Result<(), SwitchHubError> {
        let released = self
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            tracing::info!(collection = %self.name, "gpio outputs released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay_board() -> GpioCollection {
        GpioCollection::new(
            "relay",
            GpioConfig {
                pins: vec![17, 27, 22, 23],
                active_low: true,
            },
        )
    }

    #[test]
    fn should_size_collection_from_pin_list() {
        let relay = relay_board();
        assert_eq!(relay.len(), 4);
        assert_eq!(relay.kind(), CollectionKind::Gpio);
    }

    #[test]
    fn should_invert_levels_for_active_low_boards() {
        let relay = relay_board();
        assert!(!relay.level_for(true));
        assert!(relay.level_for(false));

        let plain = GpioCollection::new("plain", GpioConfig::default());
        assert!(plain.level_for(true));
    }

    #[test]
    fn should_fail_before_init() {
        let relay = relay_board();
        assert!(matches!(
            relay.set_state(0, true),
            Err(SwitchHubError::Driver(DriverError::NotInitialized { .. }))
        ));
        assert!(relay.get_state(0).is_err());
    }

    #[test]
    fn should_check_index_before_touching_lines() {
        let relay = relay_board();
        assert!(matches!(
            relay.get_state(4),
            Err(SwitchHubError::IndexOutOfRange(IndexOutOfRange { index: 4, len: 4 }))
        ));
    }

    #[test]
    fn should_close_without_init() {
        let relay = relay_board();
        assert!(relay.close().is_ok());
        assert!(relay.close().is_ok());
    }
}
