use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::result::{DeclareResultRequest, RewardOutcome, Standings},
    models::{BattleResult, CreditTransaction},
    services::{rewards, scoring},
};
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}/standings",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    responses(
        (status = 200, description = "Live aggregated totals, nothing is declared", body = Standings),
        (status = 404, description = "Battle not found")
    ),
    tag = "results"
)]
pub async fn get_standings(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<Standings>, WebError> {
    let standings = scoring::standings(state.store(), battle_id).await?;

    Ok(Json(standings))
}

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}/result",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    responses(
        (status = 200, description = "Declared result", body = BattleResult),
        (status = 404, description = "No result declared")
    ),
    tag = "results"
)]
pub async fn get_result(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<BattleResult>, WebError> {
    let result = scoring::get_result(state.store(), battle_id).await?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/result",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = DeclareResultRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Result declared; a tie has no winner", body = BattleResult),
        (status = 400, description = "Manual result inconsistent"),
        (status = 404, description = "Battle not found"),
        (status = 409, description = "Voting not reached, or result already declared")
    ),
    tag = "results"
)]
pub async fn declare_result(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<DeclareResultRequest>,
) -> Result<Response, WebError> {
    let result = scoring::declare_result(state.store(), battle_id, &req).await?;

    Ok((StatusCode::CREATED, Json(result)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/rewards",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Reward paid, or already paid earlier", body = RewardOutcome),
        (status = 404, description = "No result declared"),
        (status = 409, description = "The battle ended in a tie")
    ),
    tag = "results"
)]
pub async fn distribute_rewards(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<RewardOutcome>, WebError> {
    let outcome = rewards::distribute_rewards(state.store(), battle_id).await?;

    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{user_id}/transactions",
    params(
        ("user_id" = Uuid, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Credit ledger of the user, newest first", body = Vec<CreditTransaction>),
        (status = 404, description = "Profile not found")
    ),
    tag = "results"
)]
pub async fn list_credit_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<CreditTransaction>>, WebError> {
    let transactions = rewards::list_credit_transactions(state.store(), user_id).await?;

    Ok(Json(transactions))
}
