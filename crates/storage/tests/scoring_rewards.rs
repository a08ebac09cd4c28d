mod common;

use std::sync::Arc;

use common::{Arena, advance_to, battle_request};
use rust_decimal::Decimal;
use storage::dto::result::{DeclareResultRequest, ManualResult, RewardOutcome};
use storage::dto::vote::{CastCommentRequest, CastVoteRequest};
use storage::models::BattlePhase;
use storage::repository::ProfileRepository;
use storage::services::{battles, rewards, roster, scoring, votes};
use storage::{BattleError, MemoryStore};
use tokio::task::JoinSet;
use uuid::Uuid;

fn vote(arena: &Arena, judge: usize, participant: usize, score: i16) -> CastVoteRequest {
    CastVoteRequest {
        judge_id: arena.judges[judge].id,
        participant_id: arena.participants[participant].id,
        criteria_id: arena.criteria[0].id,
        score,
    }
}

#[tokio::test]
async fn test_vote_checks() {
    let arena = Arena::new("Raspberry", 0).await;

    let err = votes::cast_vote(&arena.store, arena.battle.id, &vote(&arena, 0, 0, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));

    let err = votes::cast_vote(&arena.store, arena.battle.id, &vote(&arena, 0, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));

    let mut unknown_criteria = vote(&arena, 0, 0, 3);
    unknown_criteria.criteria_id = Uuid::new_v4();
    let err = votes::cast_vote(&arena.store, arena.battle.id, &unknown_criteria)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::NotFound { .. }));

    let mut stranger = vote(&arena, 0, 0, 3);
    stranger.participant_id = Uuid::new_v4();
    assert!(
        votes::cast_vote(&arena.store, arena.battle.id, &stranger)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_unvalidated_judge_cannot_vote() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Blueberry", 0))
        .await
        .unwrap();
    let user = store.create_profile("nia", 0).await;
    let competitor = store.create_profile("oz", 0).await;
    let judge = roster::apply_as_judge(&store, battle.id, user.id).await.unwrap();
    let candidate = roster::submit_candidacy(&store, battle.id, &common::candidacy(competitor.id))
        .await
        .unwrap();
    let participant = roster::select_candidate(&store, candidate.id).await.unwrap();
    let criteria = storage::services::criteria::create_criteria(
        &store,
        &storage::dto::vote::CreateCriteriaRequest {
            name: "taste".to_string(),
            description: Some("Fruit forward, not cloying".to_string()),
        },
    )
    .await
    .unwrap();
    advance_to(&store, battle.id, BattlePhase::Vote).await;

    let request = CastVoteRequest {
        judge_id: judge.id,
        participant_id: participant.id,
        criteria_id: criteria.id,
        score: 4,
    };
    let err = votes::cast_vote(&store, battle.id, &request).await.unwrap_err();
    assert!(matches!(err, BattleError::NotEligible { .. }));
}

#[tokio::test]
async fn test_votes_close_outside_vote_phase() {
    let arena = Arena::new("Strawberry", 0).await;
    advance_to(&arena.store, arena.battle.id, BattlePhase::Termine).await;

    let err = votes::cast_vote(&arena.store, arena.battle.id, &vote(&arena, 0, 0, 3))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));
}

#[tokio::test]
async fn test_revote_overwrites_and_moves_the_total() {
    let arena = Arena::new("Elderflower", 0).await;

    votes::cast_vote(&arena.store, arena.battle.id, &vote(&arena, 0, 0, 2))
        .await
        .unwrap();
    votes::cast_vote(&arena.store, arena.battle.id, &vote(&arena, 0, 0, 5))
        .await
        .unwrap();

    let all = votes::list_votes(&arena.store, arena.battle.id).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].score, 5);

    let by_judge = votes::list_votes_by_judge(&arena.store, arena.battle.id, arena.judges[0].id)
        .await
        .unwrap();
    assert_eq!(by_judge.len(), 1);
    let other_judge =
        votes::list_votes_by_judge(&arena.store, arena.battle.id, arena.judges[1].id)
            .await
            .unwrap();
    assert!(other_judge.is_empty());

    let standings = scoring::standings(&arena.store, arena.battle.id).await.unwrap();
    assert_eq!(standings.scores[0].total, Decimal::from(5));
    assert_eq!(standings.leader_id, Some(arena.participants[0].id));
}

#[tokio::test]
async fn test_comment_is_replaced() {
    let arena = Arena::new("Damson", 0).await;
    let mut request = CastCommentRequest {
        judge_id: arena.judges[0].id,
        participant_id: arena.participants[1].id,
        comment: "Set too firm".to_string(),
    };

    votes::cast_comment(&arena.store, arena.battle.id, &request)
        .await
        .unwrap();
    request.comment = "Set is fine after a day".to_string();
    votes::cast_comment(&arena.store, arena.battle.id, &request)
        .await
        .unwrap();

    let comments = votes::list_comments(&arena.store, arena.battle.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment, "Set is fine after a day");
}

#[tokio::test]
async fn test_declared_winner_is_paid_once() {
    let arena = Arena::new("Spiced pumpkin", 50).await;
    arena.score(0, 0, [5, 4, 4, 4, 4]).await;
    arena.score(1, 0, [4, 4, 4, 4, 3]).await;
    arena.score(0, 1, [3, 3, 3, 3, 3]).await;
    arena.score(1, 1, [3, 3, 3, 3, 3]).await;

    let result = scoring::declare_result(&arena.store, arena.battle.id, &DeclareResultRequest::default())
        .await
        .unwrap();
    assert_eq!(result.participant_a_score, Decimal::from(8));
    assert_eq!(result.participant_b_score, Decimal::from(6));
    assert_eq!(result.winner_id, Some(arena.participants[0].id));
    assert!(!result.reward_distributed);

    let err = scoring::declare_result(&arena.store, arena.battle.id, &DeclareResultRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));

    let winner = &arena.competitors[0];
    match rewards::distribute_rewards(&arena.store, arena.battle.id).await.unwrap() {
        RewardOutcome::Distributed { result, transaction } => {
            assert!(result.reward_distributed);
            assert!(result.distributed_at.is_some());
            assert_eq!(transaction.user_id, winner.id);
            assert_eq!(transaction.amount, 50);
            assert_eq!(transaction.battle_id, Some(arena.battle.id));
            assert_eq!(transaction.description, "Battle reward: Spiced pumpkin");
        }
        other => panic!("expected a payout, got {:?}", other),
    }

    assert!(matches!(
        rewards::distribute_rewards(&arena.store, arena.battle.id).await.unwrap(),
        RewardOutcome::AlreadyDistributed { .. }
    ));

    let profile = arena.store.find_profile(winner.id).await.unwrap().unwrap();
    assert_eq!(profile.credits, 150);
    let ledger = rewards::list_credit_transactions(&arena.store, winner.id)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);

    let battle = battles::get_battle(&arena.store, arena.battle.id).await.unwrap();
    assert_eq!(battle.status, BattlePhase::Termine);
}

#[tokio::test]
async fn test_concurrent_distribution_pays_once() {
    let arena = Arena::new("Cranberry", 50).await;
    arena.score(0, 0, [5, 5, 5, 5, 5]).await;
    arena.score(0, 1, [1, 1, 1, 1, 1]).await;
    scoring::declare_result(&arena.store, arena.battle.id, &DeclareResultRequest::default())
        .await
        .unwrap();

    let battle_id = arena.battle.id;
    let winner_id = arena.competitors[0].id;
    let store = Arc::new(arena.store);

    let mut calls = JoinSet::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        calls.spawn(async move { rewards::distribute_rewards(store.as_ref(), battle_id).await });
    }

    let mut paid = 0;
    while let Some(outcome) = calls.join_next().await {
        if let RewardOutcome::Distributed { .. } = outcome.unwrap().unwrap() {
            paid += 1;
        }
    }
    assert_eq!(paid, 1);

    let profile = store.find_profile(winner_id).await.unwrap().unwrap();
    assert_eq!(profile.credits, 150);
    let ledger = rewards::list_credit_transactions(store.as_ref(), winner_id)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_tie_has_no_winner_and_no_reward() {
    let arena = Arena::new("Kiwi", 50).await;
    arena.score(0, 0, [4, 4, 4, 4, 4]).await;
    arena.score(0, 1, [4, 4, 4, 4, 4]).await;

    let result = scoring::declare_result(&arena.store, arena.battle.id, &DeclareResultRequest::default())
        .await
        .unwrap();
    assert!(result.is_tie());
    assert_eq!(result.winner_id, None);

    let err = rewards::distribute_rewards(&arena.store, arena.battle.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::NoWinner(_)));

    for competitor in &arena.competitors {
        let profile = arena.store.find_profile(competitor.id).await.unwrap().unwrap();
        assert_eq!(profile.credits, 100);
    }
}

#[tokio::test]
async fn test_manual_result_is_checked() {
    let arena = Arena::new("Chestnut", 20).await;
    let (a, b) = (arena.participants[0].id, arena.participants[1].id);

    let outsider = DeclareResultRequest {
        manual: Some(ManualResult {
            participant_a_id: a,
            participant_a_score: Decimal::from(7),
            participant_b_id: b,
            participant_b_score: Decimal::from(3),
            winner_id: Some(Uuid::new_v4()),
        }),
    };
    let err = scoring::declare_result(&arena.store, arena.battle.id, &outsider)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));

    // would round to a stored 7.00 / 7.00 tie with a winner
    let sub_cent = DeclareResultRequest {
        manual: Some(ManualResult {
            participant_a_id: a,
            participant_a_score: Decimal::new(7004, 3),
            participant_b_id: b,
            participant_b_score: Decimal::new(7001, 3),
            winner_id: Some(a),
        }),
    };
    let err = scoring::declare_result(&arena.store, arena.battle.id, &sub_cent)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));
    assert!(matches!(
        rewards::distribute_rewards(&arena.store, arena.battle.id).await,
        Err(BattleError::NotFound { .. })
    ));

    let manual = DeclareResultRequest {
        manual: Some(ManualResult {
            participant_a_id: a,
            participant_a_score: Decimal::from(7),
            participant_b_id: b,
            participant_b_score: Decimal::from(3),
            winner_id: Some(a),
        }),
    };
    let result = scoring::declare_result(&arena.store, arena.battle.id, &manual)
        .await
        .unwrap();
    assert_eq!(result.winner_id, Some(a));
    assert_eq!(
        scoring::get_result(&arena.store, arena.battle.id).await.unwrap().id,
        result.id
    );
}

#[tokio::test]
async fn test_result_waits_for_vote_phase() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Lime", 0))
        .await
        .unwrap();

    let err = scoring::declare_result(&store, battle.id, &DeclareResultRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));

    let err = rewards::distribute_rewards(&store, battle.id).await.unwrap_err();
    assert!(matches!(err, BattleError::NotFound { .. }));
}
