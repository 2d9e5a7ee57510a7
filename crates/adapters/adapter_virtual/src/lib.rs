//! # switchhub-adapter-virtual
//!
//! Simulated hardware for testing and demonstration.
//!
//! ## Provided backends
//!
//! | Type | Port | Behaviour |
//! |------|------|-----------|
//! | [`DummyCollection`] | `SwitchCollection` | `n` in-memory outputs, all off after `init` |
//! | [`SimulatedButtons`] | `ButtonInput` | Line levels set from a [`ButtonPanel`] handle |
//!
//! ## Dependency rule
//!
//! Depends on `switchhub-app` (port traits) and `switchhub-domain` only.

mod buttons;
mod dummy;

pub use buttons::{ButtonPanel, SimulatedButtons};
pub use dummy::DummyCollection;
