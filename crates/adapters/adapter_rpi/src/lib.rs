//! # switchhub-adapter-rpi
//!
//! Raspberry Pi hardware backends, built on [`rppal`].
//!
//! | Type | Port | Hardware |
//! |------|------|----------|
//! | [`GpioCollection`] | `SwitchCollection` | BCM GPIO lines driven as outputs |
//! | [`PiFaceCollection`] | `SwitchCollection` | PiFace Digital relays/outputs (MCP23S17 over SPI) |
//! | [`GpioButtons`] | `ButtonInput` | BCM GPIO lines read as inputs |
//!
//! Hardware is only touched in `init` / `claim`; constructing the types
//! never fails, so configuration can be validated on any host.
//!
//! ## Dependency rule
//!
//! Depends on `switchhub-app` (port traits) and `switchhub-domain` only.

pub mod config;
pub mod error;
mod buttons;
mod gpio;
mod piface;

pub use buttons::GpioButtons;
pub use config::{GpioConfig, PiFaceConfig};
pub use error::RpiError;
pub use gpio::GpioCollection;
pub use piface::PiFaceCollection;
