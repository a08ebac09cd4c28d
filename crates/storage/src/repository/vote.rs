use async_trait::async_trait;
use uuid::Uuid;

use super::{PhaseGuarded, lock_battle_phase};
use crate::Database;
use crate::error::{Result, StorageError};
use crate::models::{BattlePhase, Criteria, CriteriaScore, VoteComment};

/// Judge scores and comments.
///
/// Both are keyed upserts: a resubmission replaces the previous value.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Keyed by (judge, participant, criteria).
    async fn upsert_vote(&self, vote: &CriteriaScore, open: &[BattlePhase]) -> Result<PhaseGuarded<CriteriaScore>>;

    /// Keyed by (judge, participant).
    async fn upsert_comment(
        &self,
        comment: &VoteComment,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<VoteComment>>;

    async fn list_votes(&self, battle_id: Uuid) -> Result<Vec<CriteriaScore>>;

    async fn list_votes_by_judge(&self, battle_id: Uuid, judge_id: Uuid) -> Result<Vec<CriteriaScore>>;

    async fn list_comments(&self, battle_id: Uuid) -> Result<Vec<VoteComment>>;
}

#[async_trait]
pub trait CriteriaRepository: Send + Sync {
    async fn insert_criteria(&self, criteria: &Criteria) -> Result<Criteria>;

    async fn find_criteria(&self, criteria_id: Uuid) -> Result<Option<Criteria>>;

    async fn list_criteria(&self) -> Result<Vec<Criteria>>;
}

#[async_trait]
impl VoteRepository for Database {
    async fn upsert_vote(&self, vote: &CriteriaScore, open: &[BattlePhase]) -> Result<PhaseGuarded<CriteriaScore>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, vote.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let stored = sqlx::query_as::<_, CriteriaScore>(
            r#"
            INSERT INTO battle_votes (id, judge_id, battle_id, participant_id, criteria_id, score, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (judge_id, participant_id, criteria_id)
            DO UPDATE SET
                score = EXCLUDED.score,
                updated_at = EXCLUDED.updated_at
            RETURNING id, judge_id, battle_id, participant_id, criteria_id, score, updated_at
            "#,
        )
        .bind(vote.id)
        .bind(vote.judge_id)
        .bind(vote.battle_id)
        .bind(vote.participant_id)
        .bind(vote.criteria_id)
        .bind(vote.score)
        .bind(vote.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PhaseGuarded::Applied(stored))
    }

    async fn upsert_comment(
        &self,
        comment: &VoteComment,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<VoteComment>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, comment.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let stored = sqlx::query_as::<_, VoteComment>(
            r#"
            INSERT INTO battle_vote_comments (id, judge_id, battle_id, participant_id, comment, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (judge_id, participant_id)
            DO UPDATE SET
                comment = EXCLUDED.comment,
                updated_at = EXCLUDED.updated_at
            RETURNING id, judge_id, battle_id, participant_id, comment, updated_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.judge_id)
        .bind(comment.battle_id)
        .bind(comment.participant_id)
        .bind(&comment.comment)
        .bind(comment.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PhaseGuarded::Applied(stored))
    }

    async fn list_votes(&self, battle_id: Uuid) -> Result<Vec<CriteriaScore>> {
        let votes = sqlx::query_as::<_, CriteriaScore>(
            r#"
            SELECT id, judge_id, battle_id, participant_id, criteria_id, score, updated_at
            FROM battle_votes
            WHERE battle_id = $1
            ORDER BY participant_id, judge_id, criteria_id
            "#,
        )
        .bind(battle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(votes)
    }

    async fn list_votes_by_judge(&self, battle_id: Uuid, judge_id: Uuid) -> Result<Vec<CriteriaScore>> {
        let votes = sqlx::query_as::<_, CriteriaScore>(
            r#"
            SELECT id, judge_id, battle_id, participant_id, criteria_id, score, updated_at
            FROM battle_votes
            WHERE battle_id = $1 AND judge_id = $2
            ORDER BY participant_id, criteria_id
            "#,
        )
        .bind(battle_id)
        .bind(judge_id)
        .fetch_all(self.pool())
        .await?;

        Ok(votes)
    }

    async fn list_comments(&self, battle_id: Uuid) -> Result<Vec<VoteComment>> {
        let comments = sqlx::query_as::<_, VoteComment>(
            r#"
            SELECT id, judge_id, battle_id, participant_id, comment, updated_at
            FROM battle_vote_comments
            WHERE battle_id = $1
            ORDER BY participant_id, judge_id
            "#,
        )
        .bind(battle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(comments)
    }
}

#[async_trait]
impl CriteriaRepository for Database {
    async fn insert_criteria(&self, criteria: &Criteria) -> Result<Criteria> {
        let created = sqlx::query_as::<_, Criteria>(
            r#"
            INSERT INTO battle_criteria (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description
            "#,
        )
        .bind(criteria.id)
        .bind(&criteria.name)
        .bind(&criteria.description)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(format!(
                    "Criteria '{}' already exists",
                    criteria.name
                ));
            }
            err
        })?;

        Ok(created)
    }

    async fn find_criteria(&self, criteria_id: Uuid) -> Result<Option<Criteria>> {
        let criteria = sqlx::query_as::<_, Criteria>(
            r#"
            SELECT id, name, description
            FROM battle_criteria
            WHERE id = $1
            "#,
        )
        .bind(criteria_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(criteria)
    }

    async fn list_criteria(&self) -> Result<Vec<Criteria>> {
        let criteria = sqlx::query_as::<_, Criteria>(
            r#"
            SELECT id, name, description
            FROM battle_criteria
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(criteria)
    }
}
