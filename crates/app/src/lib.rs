//! # switchhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `SwitchCollection` — one backend's set of on/off outputs
//!   - `ButtonInput` — raw level access to button input lines
//!   - `EventPublisher` — fan-out of button events
//! - Bind `"<collection>.<index>"` specs to outputs (`resolver`)
//! - Aggregate switches into groups with fan-out on/off (`group`)
//! - Schedule at most one delayed action per switch or group (`timer`)
//! - Front all of the above behind the `Switchboard` service
//! - Run the debounced button monitoring task (`button_driver`)
//!
//! ## Dependency rule
//! Depends on `switchhub-domain` only (plus `tokio` for tasks, channels and
//! timers). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod button_driver;
pub mod event_bus;
pub mod group;
pub mod ports;
pub mod resolver;
pub mod services;
pub mod switch;
pub mod timer;

#[cfg(test)]
mod testing;
