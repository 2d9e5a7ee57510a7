use std::sync::{Mutex, PoisonError};

use switchhub_app::ports::SwitchCollection;
use switchhub_domain::collection::CollectionKind;
use switchhub_domain::error::{IndexOutOfRange, SwitchHubError};

/// In-memory collection of `len` outputs. Zero outputs is allowed.
#[derive(Debug)]
pub struct DummyCollection {
    name: String,
    levels: Mutex<Vec<bool>>,
}

impl DummyCollection {
    #[must_use]
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            levels: Mutex::new(vec![false; len]),
        }
    }

    fn with_levels<T>(&self, f: impl FnOnce(&mut Vec<bool>) -> T) -> T {
        let mut levels = self.levels.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut levels)
    }

    fn checked(&self, index: usize) -> Result<usize, IndexOutOfRange> {
        let len = self.len();
        if index < len {
            Ok(index)
        } else {
            Err(IndexOutOfRange { index, len })
        }
    }
}

impl SwitchCollection for DummyCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CollectionKind {
        CollectionKind::Dummy
    }

    fn init(&self) -> Result<(), SwitchHubError> {
        self.with_levels(|levels| levels.fill(false));
        tracing::debug!(collection = %self.name, "dummy collection initialised");
        Ok(())
    }

    fn len(&self) -> usize {
        self.with_levels(|levels| levels.len())
    }

    fn get_state(&self, index: usize) -> Result<bool, SwitchHubError> {
        let index = self.checked(index)?;
        Ok(self.with_levels(|levels| levels[index]))
    }

    fn set_state(&self, index: usize, on: bool) -> Result<(), SwitchHubError> {
        let index = self.checked(index)?;
        self.with_levels(|levels| levels[index] = on);
        tracing::trace!(collection = %self.name, index, on, "dummy output set");
        Ok(())
    }

    fn detailed_state(&self) -> Result<Vec<bool>, SwitchHubError> {
        Ok(self.with_levels(|levels| levels.clone()))
    }

    fn close(&self) -> Result<(), SwitchHubError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_with_every_output_off() {
        let relay = DummyCollection::new("relay", 4);
        relay.init().unwrap();
        assert_eq!(relay.detailed_state().unwrap(), vec![false; 4]);
    }

    #[test]
    fn should_remember_output_levels() {
        let relay = DummyCollection::new("relay", 4);
        relay.set_state(3, true).unwrap();
        assert!(relay.get_state(3).unwrap());
        assert!(!relay.get_state(0).unwrap());
    }

    #[test]
    fn should_reject_index_past_the_end() {
        let relay = DummyCollection::new("relay", 4);
        assert!(matches!(
            relay.set_state(4, true),
            Err(SwitchHubError::IndexOutOfRange(IndexOutOfRange { index: 4, len: 4 }))
        ));
        assert!(relay.get_state(7).is_err());
    }

    #[test]
    fn should_allow_empty_collection() {
        let empty = DummyCollection::new("none", 0);
        empty.init().unwrap();
        assert!(empty.is_empty());
        assert!(empty.detailed_state().unwrap().is_empty());
        assert!(empty.get_state(0).is_err());
    }

    #[test]
    fn should_clear_outputs_on_init() {
        let relay = DummyCollection::new("relay", 2);
        relay.set_state(1, true).unwrap();
        relay.init().unwrap();
        assert!(!relay.get_state(1).unwrap());
    }

    #[test]
    fn should_close_more_than_once() {
        let relay = DummyCollection::new("relay", 2);
        assert!(relay.close().is_ok());
        assert!(relay.close().is_ok());
        assert_eq!(relay.kind(), CollectionKind::Dummy);
    }
}
