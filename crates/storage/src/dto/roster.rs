use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::validate_not_blank;
use crate::models::JudgeLogistics;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitCandidacyRequest {
    pub user_id: Uuid,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Motivation must be between 1 and 2000 characters"
    ))]
    #[validate(custom(function = "validate_not_blank"))]
    pub motivation: String,

    pub reference_jam_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JudgeApplicationRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JudgeLogisticsRequest {
    pub field: JudgeLogistics,
    pub value: bool,
}
