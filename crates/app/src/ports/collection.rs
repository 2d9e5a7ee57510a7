//! Switch collection port — one backend's ordered set of on/off outputs.

use switchhub_domain::collection::CollectionKind;
use switchhub_domain::error::SwitchHubError;

/// An ordered, fixed-size set of binary outputs driven by one backend.
///
/// Indices run from `0` to `len() - 1`. Hardware writes are short and
/// blocking, so the methods are synchronous; implementations serialise
/// access to their device internally.
pub trait SwitchCollection: Send + Sync {
    /// Configured name of this collection.
    fn name(&self) -> &str;

    /// Backend driving the outputs.
    fn kind(&self) -> CollectionKind;

    /// Acquire the hardware and drive every output to a known (off) state.
    ///
    /// # Errors
    ///
    /// Returns a driver error when the device cannot be opened.
    fn init(&self) -> Result<(), SwitchHubError>;

    /// Number of outputs. Fixed for the lifetime of the collection.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read back the level of output `index`.
    ///
    /// # Errors
    ///
    /// Returns an index error past the end, or a driver error.
    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError>;

    /// Drive output `index` on or off.
    ///
    /// # Errors
    ///
    /// Returns an index error past the end, or a driver error.
    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError>;

    /// Level of every output, in index order.
    ///
    /// # Errors
    ///
    /// Propagates the first failing read.
    fn detailed_state(&self) -> Result<Vec<bool>, SwitchHubError> {
        (0..self.len()).map(|index| self.get_state(index)).collect()
    }

    /// Release the hardware. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a driver error when the device refuses to be released.
    fn close(&self) -> Result<(), SwitchHubError>;
}

impl<T: SwitchCollection + ?Sized> SwitchCollection for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> CollectionKind {
        (**self).kind()
    }

    fn init(&self) -> Result<(), SwitchHubError> {
        (**self).init()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError> {
        (**self).get_state(index)
    }

    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError> {
        (**self).set_state(index, on)
    }

    fn detailed_state(&self) -> Result<Vec<bool>, SwitchHubError> {
        (**self).detailed_state()
    }

    fn close(&self) -> Result<(), SwitchHubError> {
        (**self).close()
    }
}
