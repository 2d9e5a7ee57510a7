//! Switch — one output of a collection, bound by name.

use std::sync::Arc;

use switchhub_domain::error::{IndexOutOfRange, SwitchHubError};

use crate::ports::SwitchCollection;

/// Handle on output `index` of a shared collection.
///
/// The index is checked once, at bind time; collections never change size.
#[derive(Debug)]
pub struct Output<C> {
    collection: Arc<C>,
    index: usize,
}

impl<C> Clone for Output<C> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            index: self.index,
        }
    }
}

impl<C: SwitchCollection> Output<C> {
    /// Bind to output `index` of `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`] if `index >= collection.len()`.
    pub fn bind(collection: &Arc<C>, index: usize) -> Result<Self, IndexOutOfRange> {
        let len = collection.len();
        if index >= len {
            return Err(IndexOutOfRange { index, len });
        }
        Ok(Self {
            collection: Arc::clone(collection),
            index,
        })
    }

    #[must_use]
    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// # Errors
    ///
    /// Propagates the collection's driver error.
    pub fn set(&self, on: bool) -> Result<(), SwitchHubError> {
        self.collection.set_state(self.index, on)
    }

    /// # Errors
    ///
    /// Propagates the collection's driver error.
    pub fn turn_on(&self) -> Result<(), SwitchHubError> {
        self.set(true)
    }

    /// # Errors
    ///
    /// Propagates the collection's driver error.
    pub fn turn_off(&self) -> Result<(), SwitchHubError> {
        self.set(false)
    }

    /// Current level of the output.
    ///
    /// # Errors
    ///
    /// Propagates the collection's driver error.
    pub fn state(&self) -> Result<bool, SwitchHubError> {
        self.collection.get_state(self.index)
    }
}

/// A named switch resolved from its `"<collection>.<index>"` spec.
#[derive(Debug)]
pub struct ResolvedSwitch<C> {
    pub name: String,
    pub output: Output<C>,
}

impl<C: SwitchCollection> ResolvedSwitch<C> {
    /// Collection name and index, as `"<collection>.<index>"`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.output.collection().name(), self.output.index())
    }
}
