//! JSON REST handlers for switches.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use switchhub_app::ports::SwitchCollection;
use switchhub_app::services::switchboard::Switchboard;
use switchhub_app::switch::ResolvedSwitch;
use switchhub_domain::error::SwitchHubError;

use super::{CancelView, SetStateRequest, TimerView};
use crate::error::ApiError;
use crate::state::AppState;

/// A switch and its current level.
#[derive(Debug, Serialize)]
pub struct SwitchView {
    pub name: String,
    pub collection: String,
    pub index: usize,
    pub on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl SwitchView {
    fn read<C: SwitchCollection + 'static>(
        board: &Switchboard<C>,
        switch: &ResolvedSwitch<C>,
    ) -> Result<Self, SwitchHubError> {
        Ok(Self {
            name: switch.name.clone(),
            collection: switch.output.collection().name().to_string(),
            index: switch.output.index(),
            on: switch.output.state()?,
            timer: board.switch_timer(&switch.name)?.map(TimerView::from),
        })
    }
}

/// Possible responses from the timer endpoint.
pub enum TimerResponse {
    Pending(Json<TimerView>),
    NoContent,
}

impl IntoResponse for TimerResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Pending(json) => json.into_response(),
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/switches`
pub async fn list<C>(State(state): State<AppState<C>>) -> Result<Json<Vec<SwitchView>>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let board = &state.switchboard;
    let views = board
        .switches()
        .map(|switch| SwitchView::read(board, switch))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

/// `GET /api/switches/{name}`
pub async fn get<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<Json<SwitchView>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let board = &state.switchboard;
    let switch = board.switch(&name)?;
    Ok(Json(SwitchView::read(board, switch)?))
}

/// `PUT /api/switches/{name}/state`
pub async fn set_state<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Json(req): Json<SetStateRequest>,
) -> Result<Json<SwitchView>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let board = &state.switchboard;
    board.set_switch(&name, req.on, req.hold()?)?;
    let switch = board.switch(&name)?;
    Ok(Json(SwitchView::read(board, switch)?))
}

/// `GET /api/switches/{name}/timer`
pub async fn get_timer<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<TimerResponse, ApiError>
where
    C: SwitchCollection + 'static,
{
    Ok(match state.switchboard.switch_timer(&name)? {
        Some(timer) => TimerResponse::Pending(Json(timer.into())),
        None => TimerResponse::NoContent,
    })
}

/// `DELETE /api/switches/{name}/timer`
pub async fn cancel_timer<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<Json<CancelView>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let cancelled = state.switchboard.cancel_switch_timer(&name)?;
    Ok(Json(CancelView { cancelled }))
}
