use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The slice of a user profile the battle engine touches.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub credits: i64,
    pub is_organizer: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only ledger entry; every balance change has exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub related_order_id: Option<Uuid>,
    pub battle_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
