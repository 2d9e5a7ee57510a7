//! Button input port — raw level access to the lines buttons are wired to.

use switchhub_domain::button::{ButtonSpec, PinId};
use switchhub_domain::error::SwitchHubError;

/// Digital input lines sampled by the button driver.
///
/// The driver owns the input while it runs and hands it back on stop, so
/// methods take `&mut self`.
pub trait ButtonInput: Send + 'static {
    /// Claim one input line per button and apply its pull resistor.
    ///
    /// # Errors
    ///
    /// Returns a driver error when a line cannot be acquired. Lines claimed
    /// before the failure are released.
    fn claim(&mut self, buttons: &[ButtonSpec]) -> Result<(), SwitchHubError>;

    /// Electrical level of a claimed line, `true` meaning high.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the line is not claimed or cannot be read.
    fn read_level(&mut self, pin: PinId) -> Result<bool, SwitchHubError>;

    /// Release every claimed line.
    fn release(&mut self);
}
