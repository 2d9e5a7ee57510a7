//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod buttons;
#[allow(clippy::missing_errors_doc)]
pub mod groups;
#[allow(clippy::missing_errors_doc)]
pub mod switches;

use std::time::Duration;

use axum::Router;
use axum::routing::{get, put};
use serde::{Deserialize, Serialize};

use switchhub_app::ports::SwitchCollection;
use switchhub_app::timer::{self, PendingTimer, TimerAction};
use switchhub_domain::error::SwitchHubError;

use crate::state::AppState;

/// Request body for `PUT …/state`.
#[derive(Debug, Deserialize)]
pub struct SetStateRequest {
    pub on: bool,
    /// Apply the opposite state after this many seconds.
    #[serde(default)]
    pub hold_secs: Option<u64>,
}

impl SetStateRequest {
    /// The requested hold, rejected up front when it is too long.
    fn hold(&self) -> Result<Option<Duration>, SwitchHubError> {
        let Some(secs) = self.hold_secs else {
            return Ok(None);
        };
        let hold = Duration::from_secs(secs);
        timer::check_hold(hold)?;
        Ok(Some(hold))
    }
}

/// A pending hold timer.
#[derive(Debug, Serialize)]
pub struct TimerView {
    pub action: TimerAction,
    pub remaining_ms: u64,
}

impl From<PendingTimer> for TimerView {
    fn from(timer: PendingTimer) -> Self {
        Self {
            action: timer.action,
            remaining_ms: u64::try_from(timer.remaining().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Response body for `DELETE …/timer`.
#[derive(Debug, Serialize)]
pub struct CancelView {
    pub cancelled: bool,
}

/// Build the `/api` sub-router.
pub fn routes<C>() -> Router<AppState<C>>
where
    C: SwitchCollection + 'static,
{
    Router::new()
        // Switches
        .route("/switches", get(switches::list::<C>))
        .route("/switches/{name}", get(switches::get::<C>))
        .route("/switches/{name}/state", put(switches::set_state::<C>))
        .route(
            "/switches/{name}/timer",
            get(switches::get_timer::<C>).delete(switches::cancel_timer::<C>),
        )
        // Groups
        .route("/groups", get(groups::list::<C>))
        .route("/groups/{name}", get(groups::get::<C>))
        .route("/groups/{name}/state", put(groups::set_state::<C>))
        .route(
            "/groups/{name}/timer",
            get(groups::get_timer::<C>).delete(groups::cancel_timer::<C>),
        )
        // Buttons
        .route("/buttons/events", get(buttons::stream::<C>))
}
