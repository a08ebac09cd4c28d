use uuid::Uuid;

use super::battles::load_battle;
use crate::dto::result::RewardOutcome;
use crate::error::{BattleError, EngineResult, Entity};
use crate::models::CreditTransaction;
use crate::repository::{RewardPayout, Settlement, Store};

pub fn reward_description(theme: &str) -> String {
    format!("Battle reward: {}", theme)
}

/// Pay the declared winner the battle's reward, exactly once.
///
/// Repeated or concurrent calls are safe: the first one credits the
/// balance, writes the ledger row and closes the battle; every other call
/// returns [`RewardOutcome::AlreadyDistributed`] without touching anything.
pub async fn distribute_rewards<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
) -> EngineResult<RewardOutcome> {
    let result = store
        .find_result(battle_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Result, battle_id))?;

    let Some(winner_id) = result.winner_id else {
        return Err(BattleError::NoWinner(battle_id));
    };

    if result.reward_distributed {
        tracing::debug!(battle_id = %battle_id, "Reward already distributed");
        return Ok(RewardOutcome::AlreadyDistributed { result });
    }

    let battle = load_battle(store, battle_id).await?;
    let winner = store
        .find_participant(winner_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Participant, winner_id))?;

    let payout = RewardPayout {
        battle_id,
        user_id: winner.user_id,
        amount: battle.reward_credits,
        description: reward_description(&battle.theme),
    };

    match store.settle_reward(&payout).await? {
        Settlement::Paid { result, transaction } => {
            tracing::info!(
                battle_id = %battle_id,
                user_id = %payout.user_id,
                amount = payout.amount,
                transaction_id = %transaction.id,
                "Battle reward distributed"
            );
            Ok(RewardOutcome::Distributed { result, transaction })
        }
        Settlement::AlreadyDistributed(result) => {
            tracing::debug!(battle_id = %battle_id, "Reward distributed by a concurrent call");
            Ok(RewardOutcome::AlreadyDistributed { result })
        }
        Settlement::NothingToPay => Err(BattleError::NoWinner(battle_id)),
        Settlement::MissingProfile => {
            tracing::error!(battle_id = %battle_id, user_id = %payout.user_id, "Winner profile missing");
            Err(BattleError::not_found(Entity::Profile, payout.user_id))
        }
    }
}

pub async fn list_credit_transactions<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
) -> EngineResult<Vec<CreditTransaction>> {
    store
        .find_profile(user_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Profile, user_id))?;

    Ok(store.list_credit_transactions(user_id).await?)
}
