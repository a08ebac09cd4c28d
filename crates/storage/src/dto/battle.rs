use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Battle, BattleConstraint, BattlePhase, BattleResult, Candidate, Judge, Participant};

/// Request payload for creating a new battle
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBattleRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Theme must be between 1 and 255 characters"
    ))]
    pub theme: String,

    #[serde(default)]
    #[validate(custom(function = "validate_constraints"))]
    pub constraints: Vec<BattleConstraint>,

    pub registration_end: DateTime<Utc>,

    pub production_end: DateTime<Utc>,

    pub voting_end: DateTime<Utc>,

    #[validate(range(min = 0, message = "Reward must not be negative"))]
    pub reward_credits: i64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Minimum jam count must not be negative"))]
    pub min_jams_required: i32,
}

impl CreateBattleRequest {
    /// Deadlines must be strictly increasing.
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        if self.production_end <= self.registration_end {
            return Err("production_end must be after registration_end");
        }

        if self.voting_end <= self.production_end {
            return Err("voting_end must be after production_end");
        }

        Ok(())
    }
}

fn validate_constraints(constraints: &[BattleConstraint]) -> Result<(), validator::ValidationError> {
    let mut seen = std::collections::HashSet::new();

    for constraint in constraints {
        let name = constraint.name.trim();
        if name.is_empty() || !seen.insert(name) {
            return Err(validator::ValidationError::new("invalid_constraint_name"));
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvancePhaseRequest {
    pub target: BattlePhase,
}

/// Partial update of the display flags; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VisibilityRequest {
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BattleListFilter {
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub featured_only: bool,
}

/// A battle with its whole roster and result, for the organizer view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BattleOverview {
    pub battle: Battle,
    pub candidates: Vec<Candidate>,
    pub participants: Vec<Participant>,
    pub judges: Vec<Judge>,
    pub result: Option<BattleResult>,
}
