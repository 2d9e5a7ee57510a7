//! Event bus port — publish/subscribe for button events.

use std::future::Future;

use switchhub_domain::error::SwitchHubError;
use switchhub_domain::event::ButtonEvent;

/// Publishes button events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: ButtonEvent) -> impl Future<Output = Result<(), SwitchHubError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: ButtonEvent) -> impl Future<Output = Result<(), SwitchHubError>> + Send {
        (**self).publish(event)
    }
}
