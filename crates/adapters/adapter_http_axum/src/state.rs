//! Shared application state for axum handlers.

use std::sync::Arc;

use switchhub_app::event_bus::InProcessEventBus;
use switchhub_app::ports::SwitchCollection;
use switchhub_app::services::switchboard::Switchboard;

/// Application state shared across all axum handlers.
///
/// Generic over the collection type to avoid dynamic dispatch. `Clone` is
/// implemented manually so the collection itself does not need to be
/// `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<C> {
    /// Switches, groups and their timers.
    pub switchboard: Arc<Switchboard<C>>,
    /// Button events fanned out to SSE subscribers.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            switchboard: Arc::clone(&self.switchboard),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<C: SwitchCollection + 'static> AppState<C> {
    pub fn new(switchboard: Arc<Switchboard<C>>, event_bus: Arc<InProcessEventBus>) -> Self {
        Self {
            switchboard,
            event_bus,
        }
    }
}
