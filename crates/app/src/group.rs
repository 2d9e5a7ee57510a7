//! Switch group — an ordered, named set of switches driven together.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use switchhub_domain::error::{IndexOutOfRange, PartialGroupError, SwitchHubError};

use crate::ports::SwitchCollection;
use crate::switch::ResolvedSwitch;

/// What a bulk operation does after a member fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BulkPolicy {
    /// Keep setting the remaining members, then report the first failure.
    #[default]
    ContinueOnError,
    /// Stop at the first failure.
    AbortOnError,
}

/// A named, ordered group of resolved switches.
///
/// Members are fixed at construction. Bulk operations on the same group are
/// serialised; no rollback is attempted when a member fails.
#[derive(Debug)]
pub struct SwitchGroup<C> {
    name: String,
    members: Vec<Arc<ResolvedSwitch<C>>>,
    policy: BulkPolicy,
    bulk: Mutex<()>,
}

impl<C: SwitchCollection> SwitchGroup<C> {
    #[must_use]
    pub fn new(name: &str, members: Vec<Arc<ResolvedSwitch<C>>>, policy: BulkPolicy) -> Self {
        Self {
            name: name.to_string(),
            members,
            policy,
            bulk: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn policy(&self) -> BulkPolicy {
        self.policy
    }

    /// Members own no resources; nothing to acquire.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn init(&self) -> Result<(), SwitchHubError> {
        Ok(())
    }

    /// Members own no resources; nothing to release.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub fn close(&self) -> Result<(), SwitchHubError> {
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`PartialGroupError`] naming the first member that failed.
    pub fn turn_on(&self) -> Result<(), SwitchHubError> {
        self.set_all(true)
    }

    /// # Errors
    ///
    /// Returns [`PartialGroupError`] naming the first member that failed.
    pub fn turn_off(&self) -> Result<(), SwitchHubError> {
        self.set_all(false)
    }

    /// Set every member, in member order.
    ///
    /// # Errors
    ///
    /// Returns [`PartialGroupError`] naming the first member that failed.
    pub fn set_all(&self, on: bool) -> Result<(), SwitchHubError> {
        let _guard = self.bulk.lock().unwrap_or_else(PoisonError::into_inner);

        let mut changed = 0;
        let mut first_failure: Option<(String, SwitchHubError)> = None;
        for member in &self.members {
            match member.output.set(on) {
                Ok(()) => changed += 1,
                Err(err) => {
                    tracing::warn!(group = %self.name, switch = %member.name, error = %err, "group member failed");
                    if first_failure.is_none() {
                        first_failure = Some((member.name.clone(), err));
                    }
                    if self.policy == BulkPolicy::AbortOnError {
                        break;
                    }
                }
            }
        }

        match first_failure {
            None => Ok(()),
            Some((switch, source)) => Err(PartialGroupError {
                group: self.name.clone(),
                switch,
                changed,
                total: self.members.len(),
                source: Box::new(source),
            }
            .into()),
        }
    }

    /// True iff every member reads on. An empty group reads on.
    ///
    /// # Errors
    ///
    /// Propagates the first member read failure.
    pub fn state(&self) -> Result<bool, SwitchHubError> {
        for member in &self.members {
            if !member.output.state()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Level of every member, in member order.
    ///
    /// # Errors
    ///
    /// Propagates the first member read failure.
    pub fn detailed_state(&self) -> Result<Vec<bool>, SwitchHubError> {
        self.members.iter().map(|m| m.output.state()).collect()
    }

    /// Member at position `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexOutOfRange`] past the last member.
    pub fn get_switch(&self, pos: usize) -> Result<&Arc<ResolvedSwitch<C>>, IndexOutOfRange> {
        self.members.get(pos).ok_or(IndexOutOfRange {
            index: pos,
            len: self.members.len(),
        })
    }

    #[must_use]
    pub fn count_switches(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn list_switches(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }

    #[must_use]
    pub fn switches(&self) -> &[Arc<ResolvedSwitch<C>>] {
        &self.members
    }
}
