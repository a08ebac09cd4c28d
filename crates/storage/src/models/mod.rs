pub mod battle;
pub mod battle_result;
pub mod credit;
pub mod roster;
pub mod vote;

pub use battle::{Battle, BattleConstraint, BattlePhase};
pub use battle_result::BattleResult;
pub use credit::{CreditTransaction, Profile};
pub use roster::{Candidate, Judge, JudgeLogistics, Participant};
pub use vote::{Criteria, CriteriaScore, SCORE_MAX, SCORE_MIN, VoteComment};
