//! # switchd — switchhub daemon
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise logging
//! - Build the switchboard (collections, switches, groups)
//! - Start the button driver and forward its events to the event bus
//! - Build the axum router and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT): stop buttons, cancel
//!   timers, close collections

use std::sync::Arc;

use switchhub_adapter_http_axum::state::AppState;
use switchhub_app::event_bus::InProcessEventBus;
use tracing_subscriber::EnvFilter;

use switchd::config::Config;
use switchd::drivers::ButtonLines;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Switches
    let switchboard = Arc::new(switchd::build_switchboard(&config)?);
    tracing::info!(
        collections = switchboard.collections().count(),
        switches = switchboard.switches().count(),
        groups = switchboard.groups().count(),
        "switchboard ready"
    );

    // Buttons
    let event_bus = Arc::new(InProcessEventBus::new(config.buttons.channel_capacity));
    let mut buttons = if config.buttons.enabled {
        let mut driver =
            switchd::build_button_driver(&config, ButtonLines::from_kind(config.buttons.input))?;
        driver.start()?;
        switchd::forward_events(driver.events()?, Arc::clone(&event_bus));
        Some(driver)
    } else {
        None
    };

    // HTTP
    let state = AppState::new(Arc::clone(&switchboard), Arc::clone(&event_bus));
    let app = switchhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "switchd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    if let Some(driver) = buttons.as_mut() {
        if let Err(err) = driver.stop().await {
            tracing::error!(error = %err, "failed to stop button driver");
        }
    }
    switchboard.close()?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
