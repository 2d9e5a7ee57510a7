//! Common error types used across the workspace.
//!
//! Each layer reports a typed error and converts into [`SwitchHubError`] via
//! `#[from]`. Adapters keep their own error enums and expose an
//! `into_domain()` conversion for crossing port boundaries.

use std::fmt;

/// Boxed error used to preserve the underlying cause of a driver failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error for every switchhub operation.
#[derive(Debug, thiserror::Error)]
pub enum SwitchHubError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("index out of range")]
    IndexOutOfRange(#[from] IndexOutOfRange),

    #[error("invalid hold duration")]
    InvalidHold(#[from] InvalidHold),

    #[error("driver error")]
    Driver(#[from] DriverError),

    #[error("group operation partially applied")]
    PartialGroup(#[from] PartialGroupError),

    #[error("usage error")]
    Usage(#[from] UsageError),
}

/// Why an index in a switch spec was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidIndexReason {
    /// Not a non-negative decimal integer.
    NotANumber,
    /// Past the end of the collection.
    OutOfRange { len: usize },
}

impl fmt::Display for InvalidIndexReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => f.write_str("not a non-negative integer"),
            Self::OutOfRange { len } => write!(f, "out of range, collection has {len} switches"),
        }
    }
}

/// Startup configuration failures. Fatal: no partial engine is brought up.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("switch `{switch}`: malformed spec `{spec}`, expected `<collection>.<index>`")]
    MalformedSpec { switch: String, spec: String },

    #[error("switch `{switch}`: unknown collection `{collection}`")]
    UnknownCollection { switch: String, collection: String },

    #[error("switch `{switch}`: invalid index `{index}` for collection `{collection}`: {reason}")]
    InvalidIndex {
        switch: String,
        collection: String,
        index: String,
        reason: InvalidIndexReason,
    },

    #[error("group `{group}`: unknown switch `{switch}`")]
    UnknownGroupMember { group: String, switch: String },

    #[error("duplicate {entity} `{name}`")]
    Duplicate { entity: &'static str, name: String },

    #[error("button spec `{spec}`: {reason}")]
    InvalidButtonSpec { spec: String, reason: String },

    #[error("duplicate button {field} `{value}`")]
    DuplicateButton { field: &'static str, value: String },

    #[error("`{field}` must be greater than zero")]
    ZeroSetting { field: &'static str },
}

/// A named switch, group or collection does not exist.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Positional lookup past the end of a collection or group.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("index {index} out of range for size {len}")]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// A hold timer longer than the registry accepts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("hold of {requested_secs}s exceeds the maximum of {max_secs}s")]
pub struct InvalidHold {
    pub requested_secs: u64,
    pub max_secs: u64,
}

/// Hardware or simulated backend failures. The cause is kept as `source`.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("`{device}`: driver initialisation failed")]
    Init {
        device: String,
        #[source]
        source: BoxError,
    },

    #[error("`{device}`: driver is not initialised")]
    NotInitialized { device: String },

    #[error("`{device}`: I/O failure")]
    Io {
        device: String,
        #[source]
        source: BoxError,
    },
}

impl DriverError {
    /// Wrap an initialisation failure of `device`.
    pub fn init(device: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Init {
            device: device.into(),
            source: source.into(),
        }
    }

    /// Wrap a runtime I/O failure of `device`.
    pub fn io(device: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Io {
            device: device.into(),
            source: source.into(),
        }
    }
}

/// A bulk group operation failed part-way. Switches already changed stay
/// changed; callers should re-read the detailed state to reconcile.
#[derive(Debug, thiserror::Error)]
#[error("group `{group}`: switch `{switch}` failed, {changed} of {total} switch(es) changed")]
pub struct PartialGroupError {
    pub group: String,
    /// First member that failed.
    pub switch: String,
    /// Members successfully set.
    pub changed: usize,
    pub total: usize,
    #[source]
    pub source: Box<SwitchHubError>,
}

/// Programming errors in the button driver lifecycle.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("button driver is already running, stop it first")]
    DriverNotReady,

    #[error("button driver is not running")]
    NotRunning,
}
