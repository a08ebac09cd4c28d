use async_trait::async_trait;
use uuid::Uuid;

use super::{RewardPayout, Settlement};
use crate::Database;
use crate::error::Result;
use crate::models::{BattleResult, CreditTransaction};

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Returns `None` when the battle already has a result.
    async fn insert_result(&self, result: &BattleResult) -> Result<Option<BattleResult>>;

    async fn find_result(&self, battle_id: Uuid) -> Result<Option<BattleResult>>;

    /// Flips `reward_distributed`, credits the winner, appends the ledger
    /// row and closes a battle still in `vote`, all or nothing.
    ///
    /// The flag flip is a conditional update, so concurrent callers for the
    /// same battle see exactly one `Paid`.
    async fn settle_reward(&self, payout: &RewardPayout) -> Result<Settlement>;
}

#[async_trait]
impl ResultRepository for Database {
    async fn insert_result(&self, result: &BattleResult) -> Result<Option<BattleResult>> {
        let inserted = sqlx::query_as::<_, BattleResult>(
            r#"
            INSERT INTO battle_results (
                id, battle_id, winner_id, participant_a_id, participant_b_id,
                participant_a_score, participant_b_score, reward_distributed,
                declared_at, distributed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (battle_id) DO NOTHING
            RETURNING id, battle_id, winner_id, participant_a_id, participant_b_id,
                      participant_a_score, participant_b_score, reward_distributed,
                      declared_at, distributed_at
            "#,
        )
        .bind(result.id)
        .bind(result.battle_id)
        .bind(result.winner_id)
        .bind(result.participant_a_id)
        .bind(result.participant_b_id)
        .bind(result.participant_a_score)
        .bind(result.participant_b_score)
        .bind(result.reward_distributed)
        .bind(result.declared_at)
        .bind(result.distributed_at)
        .fetch_optional(self.pool())
        .await?;

        Ok(inserted)
    }

    async fn find_result(&self, battle_id: Uuid) -> Result<Option<BattleResult>> {
        let result = sqlx::query_as::<_, BattleResult>(
            r#"
            SELECT id, battle_id, winner_id, participant_a_id, participant_b_id,
                   participant_a_score, participant_b_score, reward_distributed,
                   declared_at, distributed_at
            FROM battle_results
            WHERE battle_id = $1
            "#,
        )
        .bind(battle_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(result)
    }

    async fn settle_reward(&self, payout: &RewardPayout) -> Result<Settlement> {
        let mut tx = self.pool().begin().await?;

        // Row lock plus re-check: a concurrent caller blocks here and then
        // sees reward_distributed = true.
        let claimed = sqlx::query_as::<_, BattleResult>(
            r#"
            UPDATE battle_results
            SET reward_distributed = true,
                distributed_at = NOW()
            WHERE battle_id = $1
              AND reward_distributed = false
              AND winner_id IS NOT NULL
            RETURNING id, battle_id, winner_id, participant_a_id, participant_b_id,
                      participant_a_score, participant_b_score, reward_distributed,
                      declared_at, distributed_at
            "#,
        )
        .bind(payout.battle_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(result) = claimed else {
            tx.rollback().await?;
            return Ok(match self.find_result(payout.battle_id).await? {
                Some(current) if current.reward_distributed => Settlement::AlreadyDistributed(current),
                _ => Settlement::NothingToPay,
            });
        };

        let credited = sqlx::query(
            r#"
            UPDATE profiles
            SET credits = credits + $2
            WHERE id = $1
            "#,
        )
        .bind(payout.user_id)
        .bind(payout.amount)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Settlement::MissingProfile);
        }

        let transaction = sqlx::query_as::<_, CreditTransaction>(
            r#"
            INSERT INTO credit_transactions (id, user_id, amount, description, related_order_id, battle_id, created_at)
            VALUES ($1, $2, $3, $4, NULL, $5, NOW())
            RETURNING id, user_id, amount, description, related_order_id, battle_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payout.user_id)
        .bind(payout.amount)
        .bind(&payout.description)
        .bind(payout.battle_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE battles
            SET status = 'termine'
            WHERE id = $1 AND status = 'vote'
            "#,
        )
        .bind(payout.battle_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Settlement::Paid { result, transaction })
    }
}
