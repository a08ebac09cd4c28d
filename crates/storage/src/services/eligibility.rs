use uuid::Uuid;

use crate::error::{BattleError, EngineResult, Entity};
use crate::repository::{BattleRole, Store};

/// Why a user may not join a battle. `None` from the checks means eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    NotEnoughJams { approved: i64, required: i32 },
    AlreadyCandidate,
    AlreadyParticipant,
    AlreadyJudge,
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotEnoughJams { approved, required } => write!(
                f,
                "{} approved jam(s), {} required",
                approved, required
            ),
            Self::AlreadyCandidate => write!(f, "already a candidate of this battle"),
            Self::AlreadyParticipant => write!(f, "already a participant of this battle"),
            Self::AlreadyJudge => write!(f, "already a judge of this battle"),
        }
    }
}

impl From<BattleRole> for Ineligibility {
    fn from(role: BattleRole) -> Self {
        match role {
            BattleRole::Candidate => Self::AlreadyCandidate,
            BattleRole::Participant => Self::AlreadyParticipant,
            BattleRole::Judge => Self::AlreadyJudge,
        }
    }
}

/// A user may compete once they own at least `min_jams_required` approved,
/// listed jams. Does not look at the battle phase.
pub async fn check_candidate<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    battle_id: Uuid,
) -> EngineResult<Option<Ineligibility>> {
    let battle = store
        .find_battle(battle_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Battle, battle_id))?;
    store
        .find_profile(user_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Profile, user_id))?;

    let approved = store.count_approved_jams(user_id).await?;
    if approved < i64::from(battle.min_jams_required) {
        return Ok(Some(Ineligibility::NotEnoughJams {
            approved,
            required: battle.min_jams_required,
        }));
    }

    Ok(None)
}

pub async fn is_eligible_candidate<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    battle_id: Uuid,
) -> EngineResult<bool> {
    Ok(check_candidate(store, user_id, battle_id).await?.is_none())
}

/// Judging needs only a profile and no stake in the battle.
///
/// A read-only answer; `apply_as_judge` repeats the role checks inside the
/// guarded insert.
pub async fn check_judge<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    battle_id: Uuid,
) -> EngineResult<Option<Ineligibility>> {
    store
        .find_battle(battle_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Battle, battle_id))?;
    store
        .find_profile(user_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Profile, user_id))?;

    if store
        .list_participants(battle_id)
        .await?
        .iter()
        .any(|participant| participant.user_id == user_id)
    {
        return Ok(Some(Ineligibility::AlreadyParticipant));
    }

    if store
        .list_candidates(battle_id)
        .await?
        .iter()
        .any(|candidate| candidate.user_id == user_id)
    {
        return Ok(Some(Ineligibility::AlreadyCandidate));
    }

    Ok(None)
}

pub async fn is_eligible_judge<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    battle_id: Uuid,
) -> EngineResult<bool> {
    Ok(check_judge(store, user_id, battle_id).await?.is_none())
}
