use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;
use crate::models::{SCORE_MAX, SCORE_MIN};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CastVoteRequest {
    pub judge_id: Uuid,
    pub participant_id: Uuid,
    pub criteria_id: Uuid,
    #[validate(range(
        min = "SCORE_MIN",
        max = "SCORE_MAX",
        message = "Score is outside the judging scale"
    ))]
    pub score: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CastCommentRequest {
    pub judge_id: Uuid,
    pub participant_id: Uuid,
    #[validate(length(
        min = 1,
        max = 2000,
        message = "Comment must be between 1 and 2000 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCriteriaRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}
