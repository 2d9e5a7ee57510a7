//! # switchd — switchhub daemon
//!
//! Composition root that wires all adapters together. The binary in
//! `main.rs` adds process concerns (logging, signals, the TCP listener);
//! everything here is also driven by the end-to-end tests.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

pub mod config;
pub mod drivers;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use switchhub_app::button_driver::{ButtonDriver, ButtonEvents};
use switchhub_app::event_bus::InProcessEventBus;
use switchhub_app::ports::EventPublisher;
use switchhub_app::services::switchboard::Switchboard;
use switchhub_domain::error::SwitchHubError;

use crate::config::Config;
use crate::drivers::{ButtonLines, Collection};

/// Build and initialise the switchboard described by `config`.
///
/// # Errors
///
/// Returns a configuration error for bad switch specs or group members, or
/// the driver error of the first collection that failed to initialise.
pub fn build_switchboard(config: &Config) -> Result<Switchboard<Collection>, SwitchHubError> {
    let collections: BTreeMap<String, Arc<Collection>> = config
        .collections
        .iter()
        .map(|(name, collection)| {
            (
                name.clone(),
                Arc::new(Collection::from_config(name, collection)),
            )
        })
        .collect();

    Switchboard::build(
        collections,
        config.switch_specs(),
        config.group_members(),
        config.group_policy,
    )
}

/// Build the button driver described by `config`, without starting it.
///
/// # Errors
///
/// Returns a configuration error for an invalid spec list.
pub fn build_button_driver(
    config: &Config,
    input: ButtonLines,
) -> Result<ButtonDriver<ButtonLines>, SwitchHubError> {
    let mut driver = ButtonDriver::new(input, config.buttons.driver_config());
    driver.add_buttons_from_spec(&config.buttons.specs)?;
    Ok(driver)
}

/// Republish every event of a driver run on the shared bus. The task ends
/// when the driver stops.
pub fn forward_events(mut events: ButtonEvents, bus: Arc<InProcessEventBus>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!(button = %event.source, device = %event.device, kind = %event.kind, "button event");
            if let Err(err) = bus.publish(event).await {
                tracing::warn!(error = %err, "failed to publish button event");
            }
        }
    })
}
