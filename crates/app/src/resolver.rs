//! Binds named `"<collection>.<index>"` specs to outputs, and switch names
//! to groups.
//!
//! Resolution is all-or-nothing: the first bad entry aborts and nothing is
//! returned.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use switchhub_domain::error::{ConfigError, InvalidIndexReason};
use switchhub_domain::switch_spec::SwitchSpec;

use crate::group::{BulkPolicy, SwitchGroup};
use crate::ports::SwitchCollection;
use crate::switch::{Output, ResolvedSwitch};

/// Resolved switches keyed by name.
pub type SwitchTable<C> = BTreeMap<String, Arc<ResolvedSwitch<C>>>;

/// Groups keyed by name.
pub type GroupTable<C> = BTreeMap<String, Arc<SwitchGroup<C>>>;

/// Resolve `(name, spec)` pairs against the named collections.
///
/// Several names may address the same output.
///
/// # Errors
///
/// Returns, for the first offending entry, [`ConfigError::MalformedSpec`],
/// [`ConfigError::UnknownCollection`], [`ConfigError::InvalidIndex`] or
/// [`ConfigError::Duplicate`] when a name repeats.
pub fn resolve<'a, C: SwitchCollection>(
    specs: impl IntoIterator<Item = (&'a str, &'a str)>,
    collections: &BTreeMap<String, Arc<C>>,
) -> Result<SwitchTable<C>, ConfigError> {
    let mut table = SwitchTable::new();

    for (name, raw) in specs {
        let spec = SwitchSpec::parse(name, raw)?;
        let collection = collections.get(spec.collection()).ok_or_else(|| {
            ConfigError::UnknownCollection {
                switch: name.to_string(),
                collection: spec.collection().to_string(),
            }
        })?;
        let index = spec.index_within(collection.len())?;
        let output = Output::bind(collection, index).map_err(|err| ConfigError::InvalidIndex {
            switch: name.to_string(),
            collection: spec.collection().to_string(),
            index: err.index.to_string(),
            reason: InvalidIndexReason::OutOfRange { len: err.len },
        })?;

        match table.entry(name.to_string()) {
            Entry::Occupied(_) => {
                return Err(ConfigError::Duplicate {
                    entity: "switch",
                    name: name.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                tracing::debug!(switch = name, spec = raw, "resolved switch");
                slot.insert(Arc::new(ResolvedSwitch {
                    name: name.to_string(),
                    output,
                }));
            }
        }
    }

    Ok(table)
}

/// Build groups from `(name, member names)` pairs.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownGroupMember`] when a member is not in
/// `switches`, and [`ConfigError::Duplicate`] when a member is listed twice
/// in the same group.
pub fn build_groups<'a, C: SwitchCollection>(
    groups: impl IntoIterator<Item = (&'a str, &'a [String])>,
    switches: &SwitchTable<C>,
    policy: BulkPolicy,
) -> Result<GroupTable<C>, ConfigError> {
    let mut table = GroupTable::new();

    for (name, members) in groups {
        let mut resolved: Vec<Arc<ResolvedSwitch<C>>> = Vec::with_capacity(members.len());
        for member in members {
            let switch = switches
                .get(member)
                .ok_or_else(|| ConfigError::UnknownGroupMember {
                    group: name.to_string(),
                    switch: member.clone(),
                })?;
            if resolved.iter().any(|s| s.name == *member) {
                return Err(ConfigError::Duplicate {
                    entity: "group member",
                    name: format!("{name}/{member}"),
                });
            }
            resolved.push(Arc::clone(switch));
        }
        if table.contains_key(name) {
            return Err(ConfigError::Duplicate {
                entity: "group",
                name: name.to_string(),
            });
        }
        table.insert(
            name.to_string(),
            Arc::new(SwitchGroup::new(name, resolved, policy)),
        );
    }

    Ok(table)
}
