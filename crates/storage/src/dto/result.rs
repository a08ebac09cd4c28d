use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{BattleResult, CreditTransaction};

/// Without `manual`, the recorded votes are aggregated to pick the winner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeclareResultRequest {
    /// Organizer-entered points, bypassing the votes.
    pub manual: Option<ManualResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManualResult {
    pub participant_a_id: Uuid,
    pub participant_a_score: Decimal,
    pub participant_b_id: Uuid,
    pub participant_b_score: Decimal,
    /// Must be one of the two participants; `None` declares a tie.
    pub winner_id: Option<Uuid>,
}

/// One judge's mean over the criteria they scored for a participant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct JudgeSubScore {
    pub judge_id: Uuid,
    pub criteria_count: usize,
    pub mean: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ParticipantScore {
    pub participant_id: Uuid,
    pub user_id: Uuid,
    /// Sum of the per-judge means, rounded to two decimals.
    pub total: Decimal,
    pub judges: Vec<JudgeSubScore>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Standings {
    pub battle_id: Uuid,
    pub scores: Vec<ParticipantScore>,
    /// Strictly highest total, `None` on a tie or an empty board.
    pub leader_id: Option<Uuid>,
}

/// Outcome of a reward distribution call; both variants are successes.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewardOutcome {
    Distributed {
        result: BattleResult,
        transaction: CreditTransaction,
    },
    AlreadyDistributed {
        result: BattleResult,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result() -> BattleResult {
        BattleResult {
            id: Uuid::new_v4(),
            battle_id: Uuid::new_v4(),
            winner_id: None,
            participant_a_id: Uuid::new_v4(),
            participant_b_id: Uuid::new_v4(),
            participant_a_score: Decimal::new(650, 2),
            participant_b_score: Decimal::new(650, 2),
            reward_distributed: true,
            declared_at: Utc::now(),
            distributed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_reward_outcome_is_tagged_by_status() {
        let outcome = RewardOutcome::AlreadyDistributed { result: result() };
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "already_distributed");
        assert_eq!(json["result"]["reward_distributed"], true);
    }

    #[test]
    fn test_declare_request_defaults_to_vote_aggregation() {
        let request: DeclareResultRequest = serde_json::from_str("{}").unwrap();
        assert!(request.manual.is_none());
    }
}
