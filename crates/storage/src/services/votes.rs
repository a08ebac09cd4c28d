use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::battles::load_battle;
use crate::dto::vote::{CastCommentRequest, CastVoteRequest};
use crate::error::{BattleError, EngineResult, Entity};
use crate::models::{BattlePhase, CriteriaScore, VoteComment};
use crate::repository::{PhaseGuarded, Store};

const VOTING_OPEN: [BattlePhase; 1] = [BattlePhase::Vote];

/// Checks shared by votes and comments: the battle is voting, the judge is
/// validated for it and the participant competes in it.
async fn authorize_ballot<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    judge_id: Uuid,
    participant_id: Uuid,
) -> EngineResult<()> {
    let battle = load_battle(store, battle_id).await?;
    if battle.status != BattlePhase::Vote {
        return Err(BattleError::InvalidState(format!(
            "battle {} is in phase '{}': voting is closed",
            battle_id, battle.status
        )));
    }

    let judge = store
        .find_judge(judge_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Judge, judge_id))?;
    if judge.battle_id != battle_id {
        return Err(BattleError::Validation(format!(
            "judge {} does not judge battle {}",
            judge_id, battle_id
        )));
    }
    if !judge.is_validated {
        return Err(BattleError::NotEligible {
            user_id: judge.user_id,
            reason: format!("judge {} is not validated", judge_id),
        });
    }

    let participant = store
        .find_participant(participant_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Participant, participant_id))?;
    if participant.battle_id != battle_id {
        return Err(BattleError::Validation(format!(
            "participant {} does not compete in battle {}",
            participant_id, battle_id
        )));
    }

    Ok(())
}

fn voting_closed<T>(outcome: PhaseGuarded<T>, battle_id: Uuid) -> EngineResult<T> {
    match outcome {
        PhaseGuarded::Applied(value) => Ok(value),
        PhaseGuarded::Closed(phase) => Err(BattleError::InvalidState(format!(
            "battle {} is in phase '{}': voting is closed",
            battle_id, phase
        ))),
        PhaseGuarded::Missing => Err(BattleError::not_found(Entity::Battle, battle_id)),
    }
}

/// Record a judge's score; a second call for the same (judge, participant,
/// criteria) replaces the first.
pub async fn cast_vote<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    request: &CastVoteRequest,
) -> EngineResult<CriteriaScore> {
    request
        .validate()
        .map_err(|e| BattleError::Validation(e.to_string()))?;

    authorize_ballot(store, battle_id, request.judge_id, request.participant_id).await?;

    store
        .find_criteria(request.criteria_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Criteria, request.criteria_id))?;

    let vote = CriteriaScore {
        id: Uuid::new_v4(),
        judge_id: request.judge_id,
        battle_id,
        participant_id: request.participant_id,
        criteria_id: request.criteria_id,
        score: request.score,
        updated_at: Utc::now(),
    };

    let stored = voting_closed(store.upsert_vote(&vote, &VOTING_OPEN).await?, battle_id)?;

    tracing::info!(
        battle_id = %battle_id,
        judge_id = %stored.judge_id,
        participant_id = %stored.participant_id,
        criteria_id = %stored.criteria_id,
        score = stored.score,
        "Vote recorded"
    );

    Ok(stored)
}

/// One comment per (judge, participant); resubmitting replaces the text.
pub async fn cast_comment<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    request: &CastCommentRequest,
) -> EngineResult<VoteComment> {
    request
        .validate()
        .map_err(|e| BattleError::Validation(e.to_string()))?;

    authorize_ballot(store, battle_id, request.judge_id, request.participant_id).await?;

    let comment = VoteComment {
        id: Uuid::new_v4(),
        judge_id: request.judge_id,
        battle_id,
        participant_id: request.participant_id,
        comment: request.comment.trim().to_string(),
        updated_at: Utc::now(),
    };

    let stored = voting_closed(store.upsert_comment(&comment, &VOTING_OPEN).await?, battle_id)?;

    tracing::info!(
        battle_id = %battle_id,
        judge_id = %stored.judge_id,
        participant_id = %stored.participant_id,
        "Vote comment recorded"
    );

    Ok(stored)
}

pub async fn list_votes<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<Vec<CriteriaScore>> {
    load_battle(store, battle_id).await?;
    Ok(store.list_votes(battle_id).await?)
}

pub async fn list_votes_by_judge<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    judge_id: Uuid,
) -> EngineResult<Vec<CriteriaScore>> {
    load_battle(store, battle_id).await?;

    let judge = store
        .find_judge(judge_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Judge, judge_id))?;
    if judge.battle_id != battle_id {
        return Err(BattleError::not_found(Entity::Judge, judge_id));
    }

    Ok(store.list_votes_by_judge(battle_id, judge_id).await?)
}

pub async fn list_comments<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<Vec<VoteComment>> {
    load_battle(store, battle_id).await?;
    Ok(store.list_comments(battle_id).await?)
}
