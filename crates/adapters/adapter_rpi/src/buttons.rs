use std::collections::HashMap;

use rppal::gpio::{Gpio, InputPin};
use switchhub_app::ports::ButtonInput;
use switchhub_domain::button::{ButtonSpec, PinId, Pull};
use switchhub_domain::error::{DriverError, SwitchHubError};

use crate::error::RpiError;

const DEVICE: &str = "gpio";

/// Button lines on BCM GPIO inputs, biased as each spec requests.
#[derive(Default)]
pub struct GpioButtons {
    lines: HashMap<PinId, InputPin>,
}

impl GpioButtons {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_all(&mut self, buttons: &[ButtonSpec]) -> Result<(), RpiError> {
        let gpio = Gpio::new()?;
        for button in buttons {
            let pin = gpio.get(button.pin.line())?;
            let line = match button.pull {
                Pull::Up => pin.into_input_pullup(),
                Pull::Down => pin.into_input_pulldown(),
                Pull::None => pin.into_input(),
            };
            self.lines.insert(button.pin, line);
        }
        Ok(())
    }
}

impl ButtonInput for GpioButtons {
    fn claim(&mut self, buttons: &[ButtonSpec]) -> Result<(), SwitchHubError> {
        if let Err(err) = self.claim_all(buttons) {
            self.release();
            return Err(err.into_init(DEVICE));
        }
        tracing::info!(lines = self.lines.len(), "gpio button lines claimed");
        Ok(())
    }

    fn read_level(&mut self, pin: PinId) -> Result<bool, SwitchHubError> {
        self.lines
            .get(&pin)
            .map(InputPin::is_high)
            .ok_or_else(|| {
                DriverError::NotInitialized {
                    device: pin.to_string(),
                }
                .into()
            })
    }

    fn release(&mut self) {
        if !self.lines.is_empty() {
            tracing::debug!(lines = self.lines.len(), "gpio button lines released");
        }
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_refuse_to_read_unclaimed_line() {
        let mut buttons = GpioButtons::new();
        assert!(matches!(
            buttons.read_level(PinId::new(16)),
            Err(SwitchHubError::Driver(DriverError::NotInitialized { .. }))
        ));
    }

    #[test]
    fn should_leave_no_lines_claimed_after_release() {
        let mut buttons = GpioButtons::new();
        if buttons.claim(&[]).is_err() {
            // no GPIO peripheral on this host; the failure must leave nothing claimed
            assert!(buttons.lines.is_empty());
        }
        buttons.release();
        assert!(buttons.lines.is_empty());
    }
}
