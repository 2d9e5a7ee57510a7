//! Button event — an immutable record of a debounced press or release.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC timestamp carried by events.
pub type Timestamp = DateTime<Utc>;

/// Kind of a committed button transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonEventKind {
    Press,
    Release,
}

impl std::fmt::Display for ButtonEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Press => f.write_str("press"),
            Self::Release => f.write_str("release"),
        }
    }
}

/// A normalized button event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub id: uuid::Uuid,
    pub timestamp: Timestamp,
    /// Configured button name.
    pub source: String,
    /// Physical identifier of the input line.
    pub device: String,
    pub kind: ButtonEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ButtonEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(source: impl Into<String>, device: impl Into<String>, kind: ButtonEventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            device: device.into(),
            kind,
            metadata: None,
        }
    }

    /// Attach one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}
