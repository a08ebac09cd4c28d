use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::battle::{BattleListFilter, BattleOverview, CreateBattleRequest, VisibilityRequest};
use crate::error::{BattleError, EngineResult, Entity};
use crate::models::{Battle, BattlePhase};
use crate::repository::Store;

pub(crate) async fn load_battle<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<Battle> {
    store
        .find_battle(battle_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Battle, battle_id))
}

/// Create a battle in `inscription`
pub async fn create_battle<S: Store + ?Sized>(
    store: &S,
    request: &CreateBattleRequest,
) -> EngineResult<Battle> {
    request
        .validate()
        .map_err(|e| BattleError::Validation(e.to_string()))?;
    request
        .validate_dates()
        .map_err(|e| BattleError::Validation(e.to_string()))?;

    let battle = Battle {
        id: Uuid::new_v4(),
        theme: request.theme.trim().to_string(),
        constraints: request.constraints.clone(),
        registration_end: request.registration_end,
        production_end: request.production_end,
        voting_end: request.voting_end,
        status: BattlePhase::Inscription,
        reward_credits: request.reward_credits,
        min_jams_required: request.min_jams_required,
        is_featured: false,
        is_active: true,
        created_at: Utc::now(),
    };

    let battle = store.insert_battle(&battle).await?;
    tracing::info!(battle_id = %battle.id, theme = %battle.theme, "Battle created");

    Ok(battle)
}

pub async fn get_battle<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<Battle> {
    load_battle(store, battle_id).await
}

pub async fn list_battles<S: Store + ?Sized>(
    store: &S,
    filter: &BattleListFilter,
) -> EngineResult<Vec<Battle>> {
    Ok(store.list_battles(filter).await?)
}

/// Move a battle to the phase right after its current one.
///
/// The write is conditional on the phase read here, so two organizers
/// racing on the same step produce one success and one `InvalidTransition`.
pub async fn advance_phase<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    target: BattlePhase,
) -> EngineResult<Battle> {
    let battle = load_battle(store, battle_id).await?;

    if !battle.status.can_advance_to(target) {
        return Err(BattleError::InvalidTransition {
            battle_id,
            from: battle.status,
            to: target,
        });
    }

    if !store.transition_phase(battle_id, battle.status, target).await? {
        let current = load_battle(store, battle_id).await?;
        tracing::warn!(
            battle_id = %battle_id,
            expected = %battle.status,
            found = %current.status,
            "Phase changed concurrently"
        );
        return Err(BattleError::InvalidTransition {
            battle_id,
            from: current.status,
            to: target,
        });
    }

    tracing::info!(battle_id = %battle_id, from = %battle.status, to = %target, "Battle phase advanced");

    load_battle(store, battle_id).await
}

pub async fn set_visibility<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    visibility: &VisibilityRequest,
) -> EngineResult<Battle> {
    let battle = store
        .update_visibility(battle_id, visibility)
        .await?
        .ok_or(BattleError::not_found(Entity::Battle, battle_id))?;

    tracing::debug!(
        battle_id = %battle_id,
        is_featured = battle.is_featured,
        is_active = battle.is_active,
        "Battle visibility updated"
    );

    Ok(battle)
}

pub async fn set_featured<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    is_featured: bool,
) -> EngineResult<Battle> {
    let visibility = VisibilityRequest {
        is_featured: Some(is_featured),
        is_active: None,
    };
    set_visibility(store, battle_id, &visibility).await
}

/// `false` is the soft delete.
pub async fn set_active<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    is_active: bool,
) -> EngineResult<Battle> {
    let visibility = VisibilityRequest {
        is_featured: None,
        is_active: Some(is_active),
    };
    set_visibility(store, battle_id, &visibility).await
}

/// Hard delete; only a battle nobody was selected into can go.
pub async fn delete_battle<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<()> {
    load_battle(store, battle_id).await?;

    if !store.delete_battle_without_participants(battle_id).await? {
        load_battle(store, battle_id).await?;
        return Err(BattleError::InvalidState(format!(
            "battle {} has participants; deactivate it instead",
            battle_id
        )));
    }

    tracing::info!(battle_id = %battle_id, "Battle deleted");

    Ok(())
}

pub async fn battle_overview<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
) -> EngineResult<BattleOverview> {
    let battle = load_battle(store, battle_id).await?;

    Ok(BattleOverview {
        candidates: store.list_candidates(battle_id).await?,
        participants: store.list_participants(battle_id).await?,
        judges: store.list_judges(battle_id).await?,
        result: store.find_result(battle_id).await?,
        battle,
    })
}
