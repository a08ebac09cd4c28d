use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lowest accepted criteria score.
pub const SCORE_MIN: i16 = 1;
/// Highest accepted criteria score.
pub const SCORE_MAX: i16 = 5;

/// A judging dimension such as taste or texture.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Criteria {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// One judge's score for one participant on one criteria.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CriteriaScore {
    pub id: Uuid,
    pub judge_id: Uuid,
    pub battle_id: Uuid,
    pub participant_id: Uuid,
    pub criteria_id: Uuid,
    pub score: i16,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VoteComment {
    pub id: Uuid,
    pub judge_id: Uuid,
    pub battle_id: Uuid,
    pub participant_id: Uuid,
    pub comment: String,
    pub updated_at: DateTime<Utc>,
}
