use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::battle::{AdvancePhaseRequest, BattleListFilter, BattleOverview, CreateBattleRequest, VisibilityRequest},
    models::Battle,
    services::battles,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/battles",
    params(BattleListFilter),
    responses(
        (status = 200, description = "List battles, featured first", body = Vec<Battle>)
    ),
    tag = "battles"
)]
pub async fn list_battles(
    State(state): State<AppState>,
    Query(filter): Query<BattleListFilter>,
) -> Result<Json<Vec<Battle>>, WebError> {
    let battles = battles::list_battles(state.store(), &filter).await?;

    Ok(Json(battles))
}

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    responses(
        (status = 200, description = "Battle found", body = Battle),
        (status = 404, description = "Battle not found")
    ),
    tag = "battles"
)]
pub async fn get_battle(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<Battle>, WebError> {
    let battle = battles::get_battle(state.store(), battle_id).await?;

    Ok(Json(battle))
}

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}/overview",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    responses(
        (status = 200, description = "Battle with candidates, participants, judges and result", body = BattleOverview),
        (status = 404, description = "Battle not found")
    ),
    tag = "battles"
)]
pub async fn get_battle_overview(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<BattleOverview>, WebError> {
    let overview = battles::battle_overview(state.store(), battle_id).await?;

    Ok(Json(overview))
}

#[utoipa::path(
    post,
    path = "/api/battles",
    request_body = CreateBattleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Battle created in inscription", body = Battle),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "battles"
)]
pub async fn create_battle(
    State(state): State<AppState>,
    Json(req): Json<CreateBattleRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let battle = battles::create_battle(state.store(), &req).await?;

    Ok((StatusCode::CREATED, Json(battle)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/phase",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = AdvancePhaseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Phase advanced", body = Battle),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Battle not found"),
        (status = 409, description = "Target is not the next phase")
    ),
    tag = "battles"
)]
pub async fn advance_phase(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<AdvancePhaseRequest>,
) -> Result<Json<Battle>, WebError> {
    let battle = battles::advance_phase(state.store(), battle_id, req.target).await?;

    Ok(Json(battle))
}

#[utoipa::path(
    put,
    path = "/api/battles/{battle_id}/visibility",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = VisibilityRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Flags updated", body = Battle),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Battle not found")
    ),
    tag = "battles"
)]
pub async fn set_visibility(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<Battle>, WebError> {
    let battle = battles::set_visibility(state.store(), battle_id, &req).await?;

    Ok(Json(battle))
}

#[utoipa::path(
    delete,
    path = "/api/battles/{battle_id}",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Battle deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Battle not found"),
        (status = 409, description = "Battle has participants")
    ),
    tag = "battles"
)]
pub async fn delete_battle(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Response, WebError> {
    battles::delete_battle(state.store(), battle_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
