use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use switchhub_app::ports::ButtonInput;
use switchhub_domain::button::{ButtonSpec, PinId, Pull};
use switchhub_domain::error::{DriverError, SwitchHubError};

type Lines = Arc<Mutex<HashMap<PinId, bool>>>;

/// Simulated input lines. Claimed lines idle at the level their pull
/// resistor implies; floating lines read low.
#[derive(Debug, Default)]
pub struct SimulatedButtons {
    lines: Lines,
}

/// Handle for driving the simulated lines from outside the driver.
#[derive(Debug, Clone)]
pub struct ButtonPanel {
    lines: Lines,
}

impl SimulatedButtons {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn panel(&self) -> ButtonPanel {
        ButtonPanel {
            lines: Arc::clone(&self.lines),
        }
    }
}

impl ButtonPanel {
    /// Set the electrical level of a claimed line. Returns `false` if the
    /// line is not claimed.
    pub fn set_level(&self, pin: PinId, high: bool) -> bool {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        match lines.get_mut(&pin) {
            Some(level) => {
                *level = high;
                true
            }
            None => false,
        }
    }
}

impl ButtonInput for SimulatedButtons {
    fn claim(&mut self, buttons: &[ButtonSpec]) -> Result<(), SwitchHubError> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        for button in buttons {
            lines.insert(button.pin, button.pull == Pull::Up);
        }
        tracing::debug!(lines = lines.len(), "simulated button lines claimed");
        Ok(())
    }

    fn read_level(&mut self, pin: PinId) -> Result<bool, SwitchHubError> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pin)
            .copied()
            .ok_or_else(|| {
                DriverError::NotInitialized {
                    device: pin.to_string(),
                }
                .into()
            })
    }

    fn release(&mut self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
