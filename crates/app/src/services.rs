//! Application services — use-case implementations.
//!
//! Services accept port trait implementations via generic parameters,
//! keeping this layer decoupled from concrete adapters.

pub mod switchboard;
