use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::roster::{JudgeApplicationRequest, JudgeLogisticsRequest, SubmitCandidacyRequest},
    models::{Candidate, Judge, Participant},
    services::roster,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/candidates",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = SubmitCandidacyRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Candidacy recorded", body = Candidate),
        (status = 400, description = "Validation error"),
        (status = 403, description = "User not eligible"),
        (status = 404, description = "Battle, user or jam not found"),
        (status = 409, description = "Already applied, or inscriptions closed")
    ),
    tag = "roster"
)]
pub async fn submit_candidacy(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<SubmitCandidacyRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let candidate = roster::submit_candidacy(state.store(), battle_id, &req).await?;

    Ok((StatusCode::CREATED, Json(candidate)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/candidates/{candidate_id}/select",
    params(
        ("candidate_id" = Uuid, Path, description = "Candidate id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Participant for the candidate, created on first selection", body = Participant),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Selection closed or roster full")
    ),
    tag = "roster"
)]
pub async fn select_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<Participant>, WebError> {
    let participant = roster::select_candidate(state.store(), candidate_id).await?;

    Ok(Json(participant))
}

#[utoipa::path(
    delete,
    path = "/api/candidates/{candidate_id}",
    params(
        ("candidate_id" = Uuid, Path, description = "Candidate id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Candidate removed"),
        (status = 404, description = "Candidate not found"),
        (status = 409, description = "Voting has started")
    ),
    tag = "roster"
)]
pub async fn remove_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Response, WebError> {
    roster::remove_candidate(state.store(), candidate_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    delete,
    path = "/api/participants/{participant_id}",
    params(
        ("participant_id" = Uuid, Path, description = "Participant id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 404, description = "Participant not found"),
        (status = 409, description = "Voting has started")
    ),
    tag = "roster"
)]
pub async fn remove_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Response, WebError> {
    roster::remove_participant(state.store(), participant_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/battles/{battle_id}/judges",
    params(
        ("battle_id" = Uuid, Path, description = "Battle id")
    ),
    request_body = JudgeApplicationRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Judge application recorded", body = Judge),
        (status = 403, description = "User not eligible"),
        (status = 409, description = "Already a judge, or roster closed")
    ),
    tag = "roster"
)]
pub async fn apply_as_judge(
    State(state): State<AppState>,
    Path(battle_id): Path<Uuid>,
    Json(req): Json<JudgeApplicationRequest>,
) -> Result<Response, WebError> {
    let judge = roster::apply_as_judge(state.store(), battle_id, req.user_id).await?;

    Ok((StatusCode::CREATED, Json(judge)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/judges/{judge_id}/validate",
    params(
        ("judge_id" = Uuid, Path, description = "Judge id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Judge validated", body = Judge),
        (status = 404, description = "Judge not found")
    ),
    tag = "roster"
)]
pub async fn validate_judge(
    State(state): State<AppState>,
    Path(judge_id): Path<Uuid>,
) -> Result<Json<Judge>, WebError> {
    let judge = roster::validate_judge(state.store(), judge_id).await?;

    Ok(Json(judge))
}

#[utoipa::path(
    put,
    path = "/api/judges/{judge_id}/logistics",
    params(
        ("judge_id" = Uuid, Path, description = "Judge id")
    ),
    request_body = JudgeLogisticsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sample exchange flag updated", body = Judge),
        (status = 404, description = "Judge not found")
    ),
    tag = "roster"
)]
pub async fn update_judge_logistics(
    State(state): State<AppState>,
    Path(judge_id): Path<Uuid>,
    Json(req): Json<JudgeLogisticsRequest>,
) -> Result<Json<Judge>, WebError> {
    let judge = roster::update_judge_logistics(state.store(), judge_id, req.field, req.value).await?;

    Ok(Json(judge))
}

#[utoipa::path(
    delete,
    path = "/api/judges/{judge_id}",
    params(
        ("judge_id" = Uuid, Path, description = "Judge id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Judge removed"),
        (status = 404, description = "Judge not found"),
        (status = 409, description = "Voting has started")
    ),
    tag = "roster"
)]
pub async fn remove_judge(
    State(state): State<AppState>,
    Path(judge_id): Path<Uuid>,
) -> Result<Response, WebError> {
    roster::remove_judge(state.store(), judge_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
