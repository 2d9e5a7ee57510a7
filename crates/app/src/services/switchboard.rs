//! Switchboard service — the single entry point for switching.
//!
//! Owns the collections, the resolved switch table, the groups and the timer
//! registry. Any direct set of a switch or group cancels the timer pending
//! for it, so a stale auto-off cannot undo a later command.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use switchhub_domain::error::{NotFoundError, SwitchHubError};

use crate::group::{BulkPolicy, SwitchGroup};
use crate::ports::SwitchCollection;
use crate::resolver::{self, GroupTable, SwitchTable};
use crate::switch::ResolvedSwitch;
use crate::timer::{self, PendingTimer, TimerAction, TimerKey, TimerRegistry};

/// Collections, switches, groups and their timers.
pub struct Switchboard<C> {
    collections: BTreeMap<String, Arc<C>>,
    switches: SwitchTable<C>,
    groups: GroupTable<C>,
    timers: TimerRegistry,
}

impl<C: SwitchCollection + 'static> Switchboard<C> {
    /// Resolve the configuration, then initialise every collection.
    ///
    /// Nothing is initialised when resolution fails. If a collection fails
    /// to initialise, the ones already initialised are closed again.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from resolution, or the driver error of
    /// the first collection that failed to initialise.
    pub fn build<'a>(
        collections: BTreeMap<String, Arc<C>>,
        switches: impl IntoIterator<Item = (&'a str, &'a str)>,
        groups: impl IntoIterator<Item = (&'a str, &'a [String])>,
        policy: BulkPolicy,
    ) -> Result<Self, SwitchHubError> {
        let switches = resolver::resolve(switches, &collections)?;
        let groups = resolver::build_groups(groups, &switches, policy)?;

        let mut ready: Vec<&Arc<C>> = Vec::with_capacity(collections.len());
        for collection in collections.values() {
            if let Err(err) = collection.init() {
                tracing::error!(collection = collection.name(), error = %err, "collection init failed");
                for done in ready {
                    if let Err(close_err) = done.close() {
                        tracing::warn!(collection = done.name(), error = %close_err, "close after failed init");
                    }
                }
                return Err(err);
            }
            tracing::info!(
                collection = collection.name(),
                kind = %collection.kind(),
                switches = collection.len(),
                "collection ready"
            );
            ready.push(collection);
        }

        Ok(Self {
            collections,
            switches,
            groups,
            timers: TimerRegistry::new(),
        })
    }

    pub fn collections(&self) -> impl Iterator<Item = &Arc<C>> {
        self.collections.values()
    }

    pub fn switches(&self) -> impl Iterator<Item = &Arc<ResolvedSwitch<C>>> {
        self.switches.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Arc<SwitchGroup<C>>> {
        self.groups.values()
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn switch(&self, name: &str) -> Result<&Arc<ResolvedSwitch<C>>, SwitchHubError> {
        self.switches.get(name).ok_or_else(|| {
            NotFoundError {
                entity: "switch",
                id: name.to_string(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn group(&self, name: &str) -> Result<&Arc<SwitchGroup<C>>, SwitchHubError> {
        self.groups.get(name).ok_or_else(|| {
            NotFoundError {
                entity: "group",
                id: name.to_string(),
            }
            .into()
        })
    }

    /// Drive a switch. With `hold`, the opposite state is applied once the
    /// duration elapses.
    ///
    /// Runs under the switch's timer gate, so a hold timer firing at the
    /// same moment completes either before the set or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name,
    /// [`InvalidHold`](switchhub_domain::error::InvalidHold) for a hold past
    /// [`MAX_HOLD`](crate::timer::MAX_HOLD) (nothing is changed), or the
    /// driver error. No timer is armed when the set fails.
    pub fn set_switch(
        &self,
        name: &str,
        on: bool,
        hold: Option<Duration>,
    ) -> Result<Option<PendingTimer>, SwitchHubError> {
        let switch = Arc::clone(self.switch(name)?);
        if let Some(delay) = hold {
            timer::check_hold(delay)?;
        }
        let key = TimerKey::Switch(name.to_string());

        self.timers.exclusive(&key, || {
            self.timers.cancel(&key);
            switch.output.set(on)?;
            tracing::info!(switch = name, on, ?hold, "switch set");

            hold.map(|delay| {
                self.timers.arm(key.clone(), delay, TimerAction::to_state(!on), move || {
                    switch.output.set(!on)
                })
            })
            .transpose()
        })
    }

    /// Drive every member of a group. With `hold`, the opposite state is
    /// applied to the whole group once the duration elapses.
    ///
    /// Serialised against the group's hold timer like
    /// [`set_switch`](Self::set_switch).
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name,
    /// [`InvalidHold`](switchhub_domain::error::InvalidHold) for a hold that is
    /// too long, or the partial group failure. No timer is
    /// armed when the set fails.
    pub fn set_group(
        &self,
        name: &str,
        on: bool,
        hold: Option<Duration>,
    ) -> Result<Option<PendingTimer>, SwitchHubError> {
        let group = Arc::clone(self.group(name)?);
        if let Some(delay) = hold {
            timer::check_hold(delay)?;
        }
        let key = TimerKey::Group(name.to_string());

        self.timers.exclusive(&key, || {
            self.timers.cancel(&key);
            group.set_all(on)?;
            tracing::info!(group = name, on, ?hold, "group set");

            hold.map(|delay| {
                self.timers.arm(key.clone(), delay, TimerAction::to_state(!on), move || {
                    group.set_all(!on)
                })
            })
            .transpose()
        })
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn switch_timer(&self, name: &str) -> Result<Option<PendingTimer>, SwitchHubError> {
        self.switch(name)?;
        Ok(self.timers.pending(&TimerKey::Switch(name.to_string())))
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn group_timer(&self, name: &str) -> Result<Option<PendingTimer>, SwitchHubError> {
        self.group(name)?;
        Ok(self.timers.pending(&TimerKey::Group(name.to_string())))
    }

    /// Returns whether a timer was pending.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn cancel_switch_timer(&self, name: &str) -> Result<bool, SwitchHubError> {
        self.switch(name)?;
        Ok(self.timers.cancel(&TimerKey::Switch(name.to_string())))
    }

    /// Returns whether a timer was pending.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] for an unknown name.
    pub fn cancel_group_timer(&self, name: &str) -> Result<bool, SwitchHubError> {
        self.group(name)?;
        Ok(self.timers.cancel(&TimerKey::Group(name.to_string())))
    }

    /// Cancel every timer and close every collection.
    ///
    /// All collections are closed even when one fails.
    ///
    /// # Errors
    ///
    /// Returns the first close failure.
    pub fn close(&self) -> Result<(), SwitchHubError> {
        self.timers.cancel_all();

        let mut first = None;
        for collection in self.collections.values() {
            if let Err(err) = collection.close() {
                tracing::error!(collection = collection.name(), error = %err, "collection close failed");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
