use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BattleResult {
    pub id: Uuid,
    pub battle_id: Uuid,
    /// `None` records a tie.
    pub winner_id: Option<Uuid>,
    pub participant_a_id: Uuid,
    pub participant_b_id: Uuid,
    pub participant_a_score: Decimal,
    pub participant_b_score: Decimal,
    pub reward_distributed: bool,
    pub declared_at: DateTime<Utc>,
    pub distributed_at: Option<DateTime<Utc>>,
}

impl BattleResult {
    pub fn is_tie(&self) -> bool {
        self.winner_id.is_none()
    }
}
