use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::Database;
use crate::dto::battle::{BattleListFilter, VisibilityRequest};
use crate::error::{Result, StorageError};
use crate::models::{Battle, BattleConstraint, BattlePhase};

/// Battle records and their lifecycle state.
#[async_trait]
pub trait BattleRepository: Send + Sync {
    async fn insert_battle(&self, battle: &Battle) -> Result<Battle>;

    async fn find_battle(&self, battle_id: Uuid) -> Result<Option<Battle>>;

    async fn list_battles(&self, filter: &BattleListFilter) -> Result<Vec<Battle>>;

    /// Moves the battle to `to` only if it is still in `from`.
    /// Returns false when another writer got there first.
    async fn transition_phase(&self, battle_id: Uuid, from: BattlePhase, to: BattlePhase) -> Result<bool>;

    async fn update_visibility(
        &self,
        battle_id: Uuid,
        visibility: &VisibilityRequest,
    ) -> Result<Option<Battle>>;

    /// Hard delete, refused (false) while the battle has participants.
    async fn delete_battle_without_participants(&self, battle_id: Uuid) -> Result<bool>;
}

#[derive(FromRow)]
struct BattleRow {
    id: Uuid,
    theme: String,
    constraints: Json<Vec<BattleConstraint>>,
    registration_end: DateTime<Utc>,
    production_end: DateTime<Utc>,
    voting_end: DateTime<Utc>,
    status: String,
    reward_credits: i64,
    min_jams_required: i32,
    is_featured: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl BattleRow {
    fn into_battle(self) -> Result<Battle> {
        let status = self
            .status
            .parse::<BattlePhase>()
            .map_err(|e| StorageError::Corrupt(format!("battle {}: {}", self.id, e)))?;

        Ok(Battle {
            id: self.id,
            theme: self.theme,
            constraints: self.constraints.0,
            registration_end: self.registration_end,
            production_end: self.production_end,
            voting_end: self.voting_end,
            status,
            reward_credits: self.reward_credits,
            min_jams_required: self.min_jams_required,
            is_featured: self.is_featured,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl BattleRepository for Database {
    async fn insert_battle(&self, battle: &Battle) -> Result<Battle> {
        let row = sqlx::query_as::<_, BattleRow>(
            r#"
            INSERT INTO battles (
                id, theme, constraints, registration_end, production_end, voting_end,
                status, reward_credits, min_jams_required, is_featured, is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, theme, constraints, registration_end, production_end, voting_end,
                      status, reward_credits, min_jams_required, is_featured, is_active, created_at
            "#,
        )
        .bind(battle.id)
        .bind(&battle.theme)
        .bind(Json(&battle.constraints))
        .bind(battle.registration_end)
        .bind(battle.production_end)
        .bind(battle.voting_end)
        .bind(battle.status.as_str())
        .bind(battle.reward_credits)
        .bind(battle.min_jams_required)
        .bind(battle.is_featured)
        .bind(battle.is_active)
        .bind(battle.created_at)
        .fetch_one(self.pool())
        .await?;

        row.into_battle()
    }

    async fn find_battle(&self, battle_id: Uuid) -> Result<Option<Battle>> {
        let row = sqlx::query_as::<_, BattleRow>(
            r#"
            SELECT id, theme, constraints, registration_end, production_end, voting_end,
                   status, reward_credits, min_jams_required, is_featured, is_active, created_at
            FROM battles
            WHERE id = $1
            "#,
        )
        .bind(battle_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(BattleRow::into_battle).transpose()
    }

    async fn list_battles(&self, filter: &BattleListFilter) -> Result<Vec<Battle>> {
        let rows = sqlx::query_as::<_, BattleRow>(
            r#"
            SELECT id, theme, constraints, registration_end, production_end, voting_end,
                   status, reward_credits, min_jams_required, is_featured, is_active, created_at
            FROM battles
            WHERE ($1 = false OR is_active)
              AND ($2 = false OR is_featured)
            ORDER BY is_featured DESC, registration_end DESC, created_at DESC
            "#,
        )
        .bind(filter.active_only)
        .bind(filter.featured_only)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(BattleRow::into_battle).collect()
    }

    async fn transition_phase(&self, battle_id: Uuid, from: BattlePhase, to: BattlePhase) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE battles
            SET status = $3
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(battle_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_visibility(
        &self,
        battle_id: Uuid,
        visibility: &VisibilityRequest,
    ) -> Result<Option<Battle>> {
        let row = sqlx::query_as::<_, BattleRow>(
            r#"
            UPDATE battles
            SET
                is_featured = COALESCE($2, is_featured),
                is_active = COALESCE($3, is_active)
            WHERE id = $1
            RETURNING id, theme, constraints, registration_end, production_end, voting_end,
                      status, reward_credits, min_jams_required, is_featured, is_active, created_at
            "#,
        )
        .bind(battle_id)
        .bind(visibility.is_featured)
        .bind(visibility.is_active)
        .fetch_optional(self.pool())
        .await?;

        row.map(BattleRow::into_battle).transpose()
    }

    async fn delete_battle_without_participants(&self, battle_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM battles
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM battle_participants WHERE battle_id = $1)
            "#,
        )
        .bind(battle_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
