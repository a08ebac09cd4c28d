use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::vote::{CastCommentRequest, CastVoteRequest, CreateCriteriaRequest},
    models::{Criteria, CriteriaScore, VoteComment},
    services::{criteria, votes},
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}/votes",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    responses(
        (status = 200, description = "Every recorded criteria score of the battle", body = Vec<CriteriaScore>),
        (status = 404, description = "Battle not found")
    ),
    tag = "votes"
)]
pub async fn list_votes(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<Vec<CriteriaScore>>, WebError> {
    let votes = votes::list_votes(state.store(), battle_id).await?;

    Ok(Json(votes))
}

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}/votes/judges/{judge_id}",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id"),
        ("judge_id" = Uuid, Path, description = "Judge id")
    ),
    responses(
        (status = 200, description = "Scores given by one judge", body = Vec<CriteriaScore>),
        (status = 404, description = "Battle or judge not found")
    ),
    tag = "votes"
)]
pub async fn list_votes_by_judge(
    State(state): State<AppState>,
    Path((battle_id, judge_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<CriteriaScore>>, WebError> {
    let votes = votes::list_votes_by_judge(state.store(), battle_id, judge_id).await?;

    Ok(Json(votes))
}

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/votes",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = CastVoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Score stored, replacing any previous one for the same key", body = CriteriaScore),
        (status = 400, description = "Score outside the scale"),
        (status = 403, description = "Judge not validated"),
        (status = 404, description = "Battle, judge, participant or criteria not found"),
        (status = 409, description = "Voting closed")
    ),
    tag = "votes"
)]
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<CriteriaScore>, WebError> {
    req.validate()?;

    let vote = votes::cast_vote(state.store(), battle_id, &req).await?;

    Ok(Json(vote))
}

#[utoipa::path(
    get,
    path = "/api/battles/{battle_id}/comments",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    responses(
        (status = 200, description = "Judge comments of the battle", body = Vec<VoteComment>),
        (status = 404, description = "Battle not found")
    ),
    tag = "votes"
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
) -> Result<Json<Vec<VoteComment>>, WebError> {
    let comments = votes::list_comments(state.store(), battle_id).await?;

    Ok(Json(comments))
}

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/comments",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = CastCommentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Comment stored, replacing any previous one", body = VoteComment),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Judge not validated"),
        (status = 409, description = "Voting closed")
    ),
    tag = "votes"
)]
pub async fn cast_comment(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<CastCommentRequest>,
) -> Result<Json<VoteComment>, WebError> {
    req.validate()?;

    let comment = votes::cast_comment(state.store(), battle_id, &req).await?;

    Ok(Json(comment))
}

#[utoipa::path(
    get,
    path = "/api/criteria",
    responses(
        (status = 200, description = "Judging criteria", body = Vec<Criteria>)
    ),
    tag = "votes"
)]
pub async fn list_criteria(State(state): State<AppState>) -> Result<Json<Vec<Criteria>>, WebError> {
    let criteria = criteria::list_criteria(state.store()).await?;

    Ok(Json(criteria))
}

#[utoipa::path(
    post,
    path = "/api/criteria",
    request_body = CreateCriteriaRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Criteria created", body = Criteria),
        (status = 400, description = "Validation error or name taken")
    ),
    tag = "votes"
)]
pub async fn create_criteria(
    State(state): State<AppState>,
    Json(req): Json<CreateCriteriaRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let criteria = criteria::create_criteria(state.store(), &req).await?;

    Ok((StatusCode::CREATED, Json(criteria)).into_response())
}
