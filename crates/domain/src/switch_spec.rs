//! Switch spec — the `"<collection>.<index>"` address of a logical switch.

use crate::error::{ConfigError, InvalidIndexReason};

/// A syntactically valid switch spec, not yet checked against collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchSpec<'a> {
    switch: &'a str,
    collection: &'a str,
    index: &'a str,
}

impl<'a> SwitchSpec<'a> {
    /// Split `spec` on its single `.` separator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedSpec`] unless `spec` has exactly two
    /// non-empty components.
    pub fn parse(switch: &'a str, spec: &'a str) -> Result<Self, ConfigError> {
        let mut parts = spec.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(collection), Some(index), None) if !collection.is_empty() && !index.is_empty() => {
                Ok(Self {
                    switch,
                    collection,
                    index,
                })
            }
            _ => Err(ConfigError::MalformedSpec {
                switch: switch.to_string(),
                spec: spec.to_string(),
            }),
        }
    }

    /// Name of the collection this spec refers to.
    #[must_use]
    pub fn collection(&self) -> &'a str {
        self.collection
    }

    /// Validate the index against a collection of `len` switches.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidIndex`] if the index is not a
    /// non-negative decimal integer or is `>= len`.
    pub fn index_within(&self, len: usize) -> Result<usize, ConfigError> {
        let invalid = |reason| ConfigError::InvalidIndex {
            switch: self.switch.to_string(),
            collection: self.collection.to_string(),
            index: self.index.to_string(),
            reason,
        };

        if !self.index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(InvalidIndexReason::NotANumber));
        }
        let index: usize = self
            .index
            .parse()
            .map_err(|_| invalid(InvalidIndexReason::NotANumber))?;
        if index >= len {
            return Err(invalid(InvalidIndexReason::OutOfRange { len }));
        }
        Ok(index)
    }
}
