//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod button_input;
pub mod collection;
pub mod event_bus;

pub use button_input::ButtonInput;
pub use collection::SwitchCollection;
pub use event_bus::EventPublisher;
