//! JSON REST handlers for switch groups.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use switchhub_app::group::{BulkPolicy, SwitchGroup};
use switchhub_app::ports::SwitchCollection;
use switchhub_app::services::switchboard::Switchboard;
use switchhub_domain::error::SwitchHubError;

use super::switches::TimerResponse;
use super::{CancelView, SetStateRequest, TimerView};
use crate::error::ApiError;
use crate::state::AppState;

/// A group with its aggregate and per-member levels.
#[derive(Debug, Serialize)]
pub struct GroupView {
    pub name: String,
    pub switches: Vec<String>,
    /// True iff every member is on.
    pub on: bool,
    /// Member levels, in member order.
    pub states: Vec<bool>,
    /// How `on`/`off` treat a failing member.
    pub policy: BulkPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl GroupView {
    fn read<C: SwitchCollection + 'static>(
        board: &Switchboard<C>,
        group: &SwitchGroup<C>,
    ) -> Result<Self, SwitchHubError> {
        let states = group.detailed_state()?;
        Ok(Self {
            name: group.name().to_string(),
            switches: group.list_switches().into_iter().map(str::to_string).collect(),
            on: states.iter().all(|&on| on),
            states,
            policy: group.policy(),
            timer: board.group_timer(group.name())?.map(TimerView::from),
        })
    }
}

/// `GET /api/groups`
pub async fn list<C>(State(state): State<AppState<C>>) -> Result<Json<Vec<GroupView>>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let board = &state.switchboard;
    let views = board
        .groups()
        .map(|group| GroupView::read(board, group))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

/// `GET /api/groups/{name}`
pub async fn get<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<Json<GroupView>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let board = &state.switchboard;
    let group = board.group(&name)?;
    Ok(Json(GroupView::read(board, group)?))
}

/// `PUT /api/groups/{name}/state`
pub async fn set_state<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
    Json(req): Json<SetStateRequest>,
) -> Result<Json<GroupView>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let board = &state.switchboard;
    board.set_group(&name, req.on, req.hold()?)?;
    let group = board.group(&name)?;
    Ok(Json(GroupView::read(board, group)?))
}

/// `GET /api/groups/{name}/timer`
pub async fn get_timer<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<TimerResponse, ApiError>
where
    C: SwitchCollection + 'static,
{
    Ok(match state.switchboard.group_timer(&name)? {
        Some(timer) => TimerResponse::Pending(Json(timer.into())),
        None => TimerResponse::NoContent,
    })
}

/// `DELETE /api/groups/{name}/timer`
pub async fn cancel_timer<C>(
    State(state): State<AppState<C>>,
    Path(name): Path<String>,
) -> Result<Json<CancelView>, ApiError>
where
    C: SwitchCollection + 'static,
{
    let cancelled = state.switchboard.cancel_group_timer(&name)?;
    Ok(Json(CancelView { cancelled }))
}
