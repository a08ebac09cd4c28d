use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::battles::load_battle;
use super::eligibility::{self, Ineligibility};
use crate::dto::roster::SubmitCandidacyRequest;
use crate::error::{BattleError, EngineResult, Entity, StorageError};
use crate::models::{BattlePhase, Candidate, Judge, JudgeLogistics, Participant};
use crate::repository::{Enrollment, PhaseGuarded, SelectionOutcome, Store};

/// A battle opposes exactly two jam-makers.
pub const MAX_PARTICIPANTS: usize = 2;

const CANDIDACY_OPEN: [BattlePhase; 1] = [BattlePhase::Inscription];
const SELECTION_OPEN: [BattlePhase; 2] = [BattlePhase::Inscription, BattlePhase::Selection];

fn closed(battle_id: Uuid, phase: BattlePhase, action: &str) -> BattleError {
    BattleError::InvalidState(format!(
        "battle {} is in phase '{}': cannot {}",
        battle_id, phase, action
    ))
}

/// Turn a guarded write outcome into the engine result.
fn applied<T>(
    outcome: PhaseGuarded<T>,
    battle_id: Uuid,
    missing: (Entity, Uuid),
    action: &str,
) -> EngineResult<T> {
    match outcome {
        PhaseGuarded::Applied(value) => Ok(value),
        PhaseGuarded::Closed(phase) => Err(closed(battle_id, phase, action)),
        PhaseGuarded::Missing => Err(BattleError::not_found(missing.0, missing.1)),
    }
}

/// A profile deleted after the eligibility read surfaces as a foreign key
/// violation on insert.
fn profile_gone(user_id: Uuid) -> impl FnOnce(StorageError) -> BattleError {
    move |err| {
        if err.is_foreign_key_violation() {
            BattleError::not_found(Entity::Profile, user_id)
        } else {
            err.into()
        }
    }
}

async fn load_candidate<S: Store + ?Sized>(store: &S, candidate_id: Uuid) -> EngineResult<Candidate> {
    store
        .find_candidate(candidate_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Candidate, candidate_id))
}

async fn load_judge<S: Store + ?Sized>(store: &S, judge_id: Uuid) -> EngineResult<Judge> {
    store
        .find_judge(judge_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Judge, judge_id))
}

pub async fn submit_candidacy<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    request: &SubmitCandidacyRequest,
) -> EngineResult<Candidate> {
    request
        .validate()
        .map_err(|e| BattleError::Validation(e.to_string()))?;

    let battle = load_battle(store, battle_id).await?;
    if !CANDIDACY_OPEN.contains(&battle.status) {
        return Err(closed(battle_id, battle.status, "apply as candidate"));
    }

    let user_id = request.user_id;
    if let Some(reason) = eligibility::check_candidate(store, user_id, battle_id).await? {
        return Err(BattleError::NotEligible {
            user_id,
            reason: reason.to_string(),
        });
    }

    if let Some(jam_id) = request.reference_jam_id {
        let owner = store
            .find_jam_owner(jam_id)
            .await?
            .ok_or(BattleError::not_found(Entity::Jam, jam_id))?;
        if owner != user_id {
            return Err(BattleError::Validation(format!(
                "reference jam {} does not belong to user {}",
                jam_id, user_id
            )));
        }
    }

    let candidate = Candidate {
        id: Uuid::new_v4(),
        battle_id,
        user_id,
        motivation: request.motivation.trim().to_string(),
        reference_jam_id: request.reference_jam_id,
        is_selected: false,
        created_at: Utc::now(),
    };

    let outcome = store
        .insert_candidate(&candidate, &CANDIDACY_OPEN)
        .await
        .map_err(profile_gone(user_id))?;
    let candidate = match applied(outcome, battle_id, (Entity::Battle, battle_id), "apply as candidate")? {
        Enrollment::Enrolled(candidate) => candidate,
        Enrollment::Duplicate => return Err(BattleError::DuplicateCandidacy { battle_id, user_id }),
        Enrollment::Conflict(role) => {
            return Err(BattleError::NotEligible {
                user_id,
                reason: Ineligibility::from(role).to_string(),
            });
        }
    };

    tracing::info!(battle_id = %battle_id, user_id = %user_id, candidate_id = %candidate.id, "Candidacy submitted");

    Ok(candidate)
}

/// Promote a candidate to participant. Selecting twice returns the same
/// participant.
pub async fn select_candidate<S: Store + ?Sized>(
    store: &S,
    candidate_id: Uuid,
) -> EngineResult<Participant> {
    let candidate = load_candidate(store, candidate_id).await?;
    let battle_id = candidate.battle_id;

    match store
        .select_candidate(&candidate, &SELECTION_OPEN, MAX_PARTICIPANTS)
        .await?
    {
        SelectionOutcome::Selected(participant) => {
            tracing::info!(
                battle_id = %battle_id,
                user_id = %participant.user_id,
                participant_id = %participant.id,
                "Candidate selected"
            );
            Ok(participant)
        }
        SelectionOutcome::AlreadySelected(participant) => {
            tracing::debug!(candidate_id = %candidate_id, "Candidate already selected");
            Ok(participant)
        }
        SelectionOutcome::RosterFull => Err(BattleError::InvalidState(format!(
            "battle {} already has {} participants",
            battle_id, MAX_PARTICIPANTS
        ))),
        SelectionOutcome::Closed(phase) => Err(closed(battle_id, phase, "select candidates")),
        SelectionOutcome::Missing => Err(BattleError::not_found(Entity::Candidate, candidate_id)),
    }
}

pub async fn remove_candidate<S: Store + ?Sized>(store: &S, candidate_id: Uuid) -> EngineResult<()> {
    let candidate = load_candidate(store, candidate_id).await?;

    let outcome = store
        .delete_candidate(&candidate, &BattlePhase::ROSTER_OPEN)
        .await?;
    applied(
        outcome,
        candidate.battle_id,
        (Entity::Candidate, candidate_id),
        "remove candidates",
    )?;

    tracing::info!(battle_id = %candidate.battle_id, candidate_id = %candidate_id, "Candidate removed");

    Ok(())
}

/// Votes reference participants, so removal closes when voting opens.
pub async fn remove_participant<S: Store + ?Sized>(
    store: &S,
    participant_id: Uuid,
) -> EngineResult<()> {
    let participant = store
        .find_participant(participant_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Participant, participant_id))?;

    let outcome = store
        .delete_participant(&participant, &BattlePhase::ROSTER_OPEN)
        .await?;
    applied(
        outcome,
        participant.battle_id,
        (Entity::Participant, participant_id),
        "remove participants",
    )?;

    tracing::info!(
        battle_id = %participant.battle_id,
        participant_id = %participant_id,
        "Participant removed"
    );

    Ok(())
}

pub async fn apply_as_judge<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    user_id: Uuid,
) -> EngineResult<Judge> {
    let battle = load_battle(store, battle_id).await?;
    if !battle.status.roster_open() {
        return Err(closed(battle_id, battle.status, "apply as judge"));
    }

    if let Some(reason) = eligibility::check_judge(store, user_id, battle_id).await? {
        return Err(BattleError::NotEligible {
            user_id,
            reason: reason.to_string(),
        });
    }

    let judge = Judge {
        id: Uuid::new_v4(),
        battle_id,
        user_id,
        is_validated: false,
        has_ordered: false,
        has_received: false,
        created_at: Utc::now(),
    };

    let outcome = store
        .insert_judge(&judge, &BattlePhase::ROSTER_OPEN)
        .await
        .map_err(profile_gone(user_id))?;
    let judge = match applied(outcome, battle_id, (Entity::Battle, battle_id), "apply as judge")? {
        Enrollment::Enrolled(judge) => judge,
        Enrollment::Duplicate => return Err(BattleError::DuplicateJudge { battle_id, user_id }),
        Enrollment::Conflict(role) => {
            return Err(BattleError::NotEligible {
                user_id,
                reason: Ineligibility::from(role).to_string(),
            });
        }
    };

    tracing::info!(battle_id = %battle_id, user_id = %user_id, judge_id = %judge.id, "Judge application received");

    Ok(judge)
}

pub async fn validate_judge<S: Store + ?Sized>(store: &S, judge_id: Uuid) -> EngineResult<Judge> {
    let judge = load_judge(store, judge_id).await?;
    if judge.is_validated {
        return Ok(judge);
    }

    let outcome = store.validate_judge(&judge, &BattlePhase::LIVE).await?;
    let judge = applied(outcome, judge.battle_id, (Entity::Judge, judge_id), "validate judges")?;

    tracing::info!(battle_id = %judge.battle_id, judge_id = %judge_id, "Judge validated");

    Ok(judge)
}

/// Sample-exchange flags; no validation required.
pub async fn update_judge_logistics<S: Store + ?Sized>(
    store: &S,
    judge_id: Uuid,
    field: JudgeLogistics,
    value: bool,
) -> EngineResult<Judge> {
    let judge = load_judge(store, judge_id).await?;

    let outcome = store
        .set_judge_logistics(&judge, field, value, &BattlePhase::LIVE)
        .await?;

    applied(
        outcome,
        judge.battle_id,
        (Entity::Judge, judge_id),
        "update judge logistics",
    )
}

pub async fn remove_judge<S: Store + ?Sized>(store: &S, judge_id: Uuid) -> EngineResult<()> {
    let judge = load_judge(store, judge_id).await?;

    let outcome = store.delete_judge(&judge, &BattlePhase::ROSTER_OPEN).await?;
    applied(outcome, judge.battle_id, (Entity::Judge, judge_id), "remove judges")?;

    tracing::info!(battle_id = %judge.battle_id, judge_id = %judge_id, "Judge removed");

    Ok(())
}
