use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::battles::load_battle;
use crate::dto::result::{DeclareResultRequest, JudgeSubScore, ManualResult, ParticipantScore, Standings};
use crate::error::{BattleError, EngineResult, Entity};
use crate::models::{BattlePhase, BattleResult, CriteriaScore, Participant};
use crate::repository::Store;

/// Reduce raw criteria scores to one total per participant.
///
/// Each judge contributes the mean of the criteria they actually scored for
/// that participant; unscored criteria are left out of the mean. The total
/// is the sum of those per-judge means, rounded to two decimals. Votes for
/// participants not listed are ignored. Output follows `participants` order.
pub fn aggregate_scores(participants: &[Participant], votes: &[CriteriaScore]) -> Vec<ParticipantScore> {
    participants
        .iter()
        .map(|participant| {
            // judge -> (sum, count); BTreeMap keeps judge order stable
            let mut per_judge: BTreeMap<Uuid, (i64, usize)> = BTreeMap::new();
            for vote in votes.iter().filter(|v| v.participant_id == participant.id) {
                let entry = per_judge.entry(vote.judge_id).or_insert((0, 0));
                entry.0 += i64::from(vote.score);
                entry.1 += 1;
            }

            let mut total = Decimal::ZERO;
            let judges = per_judge
                .into_iter()
                .map(|(judge_id, (sum, count))| {
                    let mean = Decimal::from(sum) / Decimal::from(count as i64);
                    total += mean;
                    JudgeSubScore {
                        judge_id,
                        criteria_count: count,
                        mean: mean.round_dp(2),
                    }
                })
                .collect();

            ParticipantScore {
                participant_id: participant.id,
                user_id: participant.user_id,
                total: total.round_dp(2),
                judges,
            }
        })
        .collect()
}

/// The participant with the strictly highest total, if any.
pub fn leader(scores: &[ParticipantScore]) -> Option<Uuid> {
    let best = scores.iter().map(|s| s.total).max()?;
    let mut at_best = scores.iter().filter(|s| s.total == best);

    match (at_best.next(), at_best.next()) {
        (Some(only), None) => Some(only.participant_id),
        _ => None,
    }
}

/// Current aggregated totals, without declaring anything.
pub async fn standings<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<Standings> {
    load_battle(store, battle_id).await?;

    let participants = store.list_participants(battle_id).await?;
    let votes = store.list_votes(battle_id).await?;
    let scores = aggregate_scores(&participants, &votes);

    Ok(Standings {
        battle_id,
        leader_id: leader(&scores),
        scores,
    })
}

pub async fn get_result<S: Store + ?Sized>(store: &S, battle_id: Uuid) -> EngineResult<BattleResult> {
    store
        .find_result(battle_id)
        .await?
        .ok_or(BattleError::not_found(Entity::Result, battle_id))
}

/// Record the battle outcome, from the votes or from organizer points.
///
/// Equal scores record a tie with no winner. A battle holds one result.
pub async fn declare_result<S: Store + ?Sized>(
    store: &S,
    battle_id: Uuid,
    request: &DeclareResultRequest,
) -> EngineResult<BattleResult> {
    let battle = load_battle(store, battle_id).await?;
    if battle.status < BattlePhase::Vote {
        return Err(BattleError::InvalidState(format!(
            "battle {} is in phase '{}': results open with the vote",
            battle_id, battle.status
        )));
    }

    if store.find_result(battle_id).await?.is_some() {
        return Err(already_declared(battle_id));
    }

    let participants = store.list_participants(battle_id).await?;

    let (a, a_score, b, b_score, winner_id) = match &request.manual {
        Some(manual) => validate_manual(battle_id, &participants, manual)?,
        None => {
            let [a, b] = participants.as_slice() else {
                return Err(BattleError::InvalidState(format!(
                    "battle {} has {} participant(s); a result needs exactly two",
                    battle_id,
                    participants.len()
                )));
            };
            let votes = store.list_votes(battle_id).await?;
            let scores = aggregate_scores(&participants, &votes);
            (a.id, scores[0].total, b.id, scores[1].total, leader(&scores))
        }
    };

    let result = BattleResult {
        id: Uuid::new_v4(),
        battle_id,
        winner_id,
        participant_a_id: a,
        participant_b_id: b,
        participant_a_score: a_score,
        participant_b_score: b_score,
        reward_distributed: false,
        declared_at: Utc::now(),
        distributed_at: None,
    };

    let result = store
        .insert_result(&result)
        .await?
        .ok_or_else(|| already_declared(battle_id))?;

    match result.winner_id {
        Some(winner) => tracing::info!(
            battle_id = %battle_id,
            winner_id = %winner,
            score_a = %result.participant_a_score,
            score_b = %result.participant_b_score,
            manual = request.manual.is_some(),
            "Battle result declared"
        ),
        None => tracing::info!(
            battle_id = %battle_id,
            score = %result.participant_a_score,
            manual = request.manual.is_some(),
            "Battle ended in a tie"
        ),
    }

    Ok(result)
}

fn already_declared(battle_id: Uuid) -> BattleError {
    BattleError::InvalidState(format!("battle {} already has a result", battle_id))
}

type ResultPair = (Uuid, Decimal, Uuid, Decimal, Option<Uuid>);

/// Result scores are stored as `NUMERIC(10, 2)`.
const RESULT_SCORE_SCALE: u32 = 2;
// 99_999_999.99 is 9_999_999_999 at scale 2, split as lo + mid * 2^32
const MAX_RESULT_SCORE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

fn validate_manual(
    battle_id: Uuid,
    participants: &[Participant],
    manual: &ManualResult,
) -> EngineResult<ResultPair> {
    let (a, b) = (manual.participant_a_id, manual.participant_b_id);

    if a == b {
        return Err(BattleError::Validation(
            "participant_a_id and participant_b_id must differ".to_string(),
        ));
    }
    for id in [a, b] {
        if !participants.iter().any(|p| p.id == id) {
            return Err(BattleError::Validation(format!(
                "participant {} does not compete in battle {}",
                id, battle_id
            )));
        }
    }
    for score in [manual.participant_a_score, manual.participant_b_score] {
        if score.is_sign_negative() {
            return Err(BattleError::Validation("scores must not be negative".to_string()));
        }
        if score.normalize().scale() > RESULT_SCORE_SCALE {
            return Err(BattleError::Validation(format!(
                "score {} has more than {} decimal places",
                score, RESULT_SCORE_SCALE
            )));
        }
        if score > MAX_RESULT_SCORE {
            return Err(BattleError::Validation(format!(
                "score {} exceeds the maximum of {}",
                score, MAX_RESULT_SCORE
            )));
        }
    }

    let tie = manual.participant_a_score == manual.participant_b_score;
    match manual.winner_id {
        Some(winner) if winner != a && winner != b => {
            return Err(BattleError::Validation(format!(
                "winner {} is neither participant {} nor {}",
                winner, a, b
            )));
        }
        Some(_) if tie => {
            return Err(BattleError::Validation(
                "equal scores are a tie and cannot name a winner".to_string(),
            ));
        }
        None if !tie => {
            return Err(BattleError::Validation(
                "a winner is required unless the scores are equal".to_string(),
            ));
        }
        _ => {}
    }

    Ok((
        a,
        manual.participant_a_score,
        b,
        manual.participant_b_score,
        manual.winner_id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn participant() -> Participant {
        Participant {
            id: Uuid::new_v4(),
            battle_id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn vote(judge: Uuid, participant: &Participant, criteria: Uuid, score: i16) -> CriteriaScore {
        CriteriaScore {
            id: Uuid::new_v4(),
            judge_id: judge,
            battle_id: Uuid::nil(),
            participant_id: participant.id,
            criteria_id: criteria,
            score,
            updated_at: Utc::now(),
        }
    }

    fn dec(value: f64) -> Decimal {
        Decimal::from_f64(value).unwrap().round_dp(2)
    }

    #[test]
    fn test_sum_of_judge_means() {
        let a = participant();
        let b = participant();
        let (j1, j2) = (Uuid::new_v4(), Uuid::new_v4());
        let criteria: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();

        let mut votes = Vec::new();
        // j1 on a: 5,4,4,4,4 -> 4.2 ; j2 on a: 4,4,4,4,3 -> 3.8
        for (c, s) in criteria.iter().zip([5, 4, 4, 4, 4]) {
            votes.push(vote(j1, &a, *c, s));
        }
        for (c, s) in criteria.iter().zip([4, 4, 4, 4, 3]) {
            votes.push(vote(j2, &a, *c, s));
        }
        for c in &criteria {
            votes.push(vote(j1, &b, *c, 3));
            votes.push(vote(j2, &b, *c, 3));
        }

        let scores = aggregate_scores(&[a.clone(), b.clone()], &votes);
        assert_eq!(scores[0].total, dec(8.0));
        assert_eq!(scores[1].total, dec(6.0));
        assert_eq!(scores[0].judges.len(), 2);
        assert_eq!(leader(&scores), Some(a.id));
    }

    #[test]
    fn test_missing_criteria_excluded_from_mean() {
        let a = participant();
        let judge = Uuid::new_v4();
        let votes = vec![
            vote(judge, &a, Uuid::new_v4(), 5),
            vote(judge, &a, Uuid::new_v4(), 3),
        ];

        let scores = aggregate_scores(&[a], &votes);
        assert_eq!(scores[0].total, dec(4.0));
        assert_eq!(scores[0].judges[0].criteria_count, 2);
    }

    #[test]
    fn test_participant_without_votes_scores_zero() {
        let a = participant();
        let scores = aggregate_scores(&[a], &[]);
        assert_eq!(scores[0].total, Decimal::ZERO);
        assert!(scores[0].judges.is_empty());
    }

    #[test]
    fn test_equal_totals_have_no_leader() {
        let a = participant();
        let b = participant();
        let judge = Uuid::new_v4();
        let criteria = Uuid::new_v4();
        let votes = vec![vote(judge, &a, criteria, 4), vote(judge, &b, criteria, 4)];

        let scores = aggregate_scores(&[a, b], &votes);
        assert_eq!(leader(&scores), None);
        assert_eq!(leader(&[]), None);
    }

    #[test]
    fn test_votes_for_unknown_participants_ignored() {
        let a = participant();
        let stranger = participant();
        let votes = vec![vote(Uuid::new_v4(), &stranger, Uuid::new_v4(), 5)];

        let scores = aggregate_scores(&[a], &votes);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].total, Decimal::ZERO);
    }

    #[test]
    fn test_manual_winner_must_be_in_pair() {
        let a = participant();
        let b = participant();
        let participants = vec![a.clone(), b.clone()];
        let mut manual = ManualResult {
            participant_a_id: a.id,
            participant_a_score: dec(12.0),
            participant_b_id: b.id,
            participant_b_score: dec(9.5),
            winner_id: Some(Uuid::new_v4()),
        };
        assert!(matches!(
            validate_manual(Uuid::nil(), &participants, &manual),
            Err(BattleError::Validation(_))
        ));

        manual.winner_id = Some(a.id);
        let (_, _, _, _, winner) = validate_manual(Uuid::nil(), &participants, &manual).unwrap();
        assert_eq!(winner, Some(a.id));
    }

    #[test]
    fn test_manual_scores_beyond_two_decimals_rejected() {
        let a = participant();
        let b = participant();
        let participants = vec![a.clone(), b.clone()];
        let mut manual = ManualResult {
            participant_a_id: a.id,
            participant_a_score: Decimal::new(7004, 3),
            participant_b_id: b.id,
            participant_b_score: Decimal::new(7001, 3),
            winner_id: Some(a.id),
        };
        assert!(matches!(
            validate_manual(Uuid::nil(), &participants, &manual),
            Err(BattleError::Validation(_))
        ));

        // trailing zeros do not count as precision
        manual.participant_a_score = Decimal::new(7_500, 3);
        manual.participant_b_score = Decimal::new(700, 2);
        assert!(validate_manual(Uuid::nil(), &participants, &manual).is_ok());
    }

    #[test]
    fn test_manual_scores_capped_at_column_maximum() {
        let a = participant();
        let b = participant();
        let participants = vec![a.clone(), b.clone()];
        let mut manual = ManualResult {
            participant_a_id: a.id,
            participant_a_score: Decimal::new(1_000_000_000_000, 0),
            participant_b_id: b.id,
            participant_b_score: dec(1.0),
            winner_id: Some(a.id),
        };
        assert!(matches!(
            validate_manual(Uuid::nil(), &participants, &manual),
            Err(BattleError::Validation(_))
        ));

        manual.participant_a_score = Decimal::new(9_999_999_999, 2);
        assert!(validate_manual(Uuid::nil(), &participants, &manual).is_ok());
    }

    #[test]
    fn test_manual_tie_cannot_name_winner() {
        let a = participant();
        let b = participant();
        let participants = vec![a.clone(), b.clone()];
        let mut manual = ManualResult {
            participant_a_id: a.id,
            participant_a_score: dec(7.0),
            participant_b_id: b.id,
            participant_b_score: dec(7.0),
            winner_id: Some(b.id),
        };
        assert!(validate_manual(Uuid::nil(), &participants, &manual).is_err());

        manual.winner_id = None;
        assert!(validate_manual(Uuid::nil(), &participants, &manual).is_ok());
    }
}
