use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Candidate {
    pub id: Uuid,
    pub battle_id: Uuid,
    pub user_id: Uuid,
    pub motivation: String,
    pub reference_jam_id: Option<Uuid>,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participant {
    pub id: Uuid,
    pub battle_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Judge {
    pub id: Uuid,
    pub battle_id: Uuid,
    pub user_id: Uuid,
    pub is_validated: bool,
    /// Sample exchange: the judge ordered the participants' jams.
    pub has_ordered: bool,
    /// Sample exchange: the jams arrived.
    pub has_received: bool,
    pub created_at: DateTime<Utc>,
}

/// Judge flags tracking the physical sample exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JudgeLogistics {
    HasOrdered,
    HasReceived,
}
