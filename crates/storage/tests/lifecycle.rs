mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{Arena, advance_to, battle_request, candidacy};
use storage::dto::battle::{BattleListFilter, VisibilityRequest};
use storage::models::{BattlePhase, JudgeLogistics};
use storage::services::{battles, eligibility, roster};
use storage::{BattleError, MemoryStore};
use tokio::task::JoinSet;
use uuid::Uuid;

#[tokio::test]
async fn test_create_rejects_unordered_deadlines() {
    let store = MemoryStore::new();
    let mut request = battle_request("Quince", 10);
    request.production_end = request.registration_end - Duration::hours(1);

    let err = battles::create_battle(&store, &request).await.unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));

    let mut request = battle_request("Quince", 10);
    request.voting_end = request.production_end;
    let err = battles::create_battle(&store, &request).await.unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));

    let err = battles::create_battle(&store, &battle_request("Quince", -1))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));
}

#[tokio::test]
async fn test_new_battle_starts_in_inscription() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Fig and walnut", 25))
        .await
        .unwrap();

    assert_eq!(battle.status, BattlePhase::Inscription);
    assert!(battle.is_active);
    assert!(!battle.is_featured);
}

#[tokio::test]
async fn test_phases_only_move_forward_one_step() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Fig and walnut", 25))
        .await
        .unwrap();

    let err = battles::advance_phase(&store, battle.id, BattlePhase::Production)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BattleError::InvalidTransition {
            from: BattlePhase::Inscription,
            to: BattlePhase::Production,
            ..
        }
    ));

    advance_to(&store, battle.id, BattlePhase::Termine).await;

    let err = battles::advance_phase(&store, battle.id, BattlePhase::Inscription)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidTransition { .. }));
    assert_eq!(
        battles::get_battle(&store, battle.id).await.unwrap().status,
        BattlePhase::Termine
    );
}

#[tokio::test]
async fn test_unknown_battle_is_not_found() {
    let store = MemoryStore::new();
    let err = battles::advance_phase(&store, Uuid::new_v4(), BattlePhase::Selection)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::NotFound { .. }));
}

#[tokio::test]
async fn test_listing_filters_visibility() {
    let store = MemoryStore::new();
    let visible = battles::create_battle(&store, &battle_request("Blackcurrant", 0))
        .await
        .unwrap();
    let hidden = battles::create_battle(&store, &battle_request("Rhubarb", 0))
        .await
        .unwrap();

    battles::set_featured(&store, visible.id, true).await.unwrap();
    battles::set_active(&store, hidden.id, false).await.unwrap();

    let all = battles::list_battles(&store, &BattleListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let active = battles::list_battles(
        &store,
        &BattleListFilter {
            active_only: true,
            featured_only: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, visible.id);

    let untouched = battles::set_visibility(&store, visible.id, &VisibilityRequest::default())
        .await
        .unwrap();
    assert!(untouched.is_featured);
}

#[tokio::test]
async fn test_candidate_eligibility_counts_approved_active_jams() {
    let store = MemoryStore::new();
    let mut request = battle_request("Sugar-free", 0);
    request.min_jams_required = 2;
    let battle = battles::create_battle(&store, &request).await.unwrap();
    let user = store.create_profile("cleo", 0).await;

    store.create_jam(user.id, "approved").await;
    store.create_jam(user.id, "pending").await;
    let delisted = store.create_jam(user.id, "active").await;
    store.set_jam_active(delisted, false).await;

    assert!(
        !eligibility::is_eligible_candidate(&store, user.id, battle.id)
            .await
            .unwrap()
    );
    let err = roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::NotEligible { .. }));

    store.set_jam_active(delisted, true).await;
    assert!(
        eligibility::is_eligible_candidate(&store, user.id, battle.id)
            .await
            .unwrap()
    );
    roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_candidacy_only_once_and_only_in_inscription() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Apricot", 0))
        .await
        .unwrap();
    let user = store.create_profile("dora", 0).await;
    let late = store.create_profile("eli", 0).await;

    roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
        .await
        .unwrap();
    let err = roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::DuplicateCandidacy { .. }));

    advance_to(&store, battle.id, BattlePhase::Selection).await;
    let err = roster::submit_candidacy(&store, battle.id, &candidacy(late.id))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));
}

#[tokio::test]
async fn test_reference_jam_must_belong_to_candidate() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Plum", 0))
        .await
        .unwrap();
    let user = store.create_profile("fay", 0).await;
    let other = store.create_profile("gus", 0).await;
    let foreign_jam = store.create_jam(other.id, "approved").await;

    let mut request = candidacy(user.id);
    request.reference_jam_id = Some(foreign_jam);
    let err = roster::submit_candidacy(&store, battle.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::Validation(_)));
}

#[tokio::test]
async fn test_selection_is_idempotent_and_capped() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Bitter orange", 0))
        .await
        .unwrap();

    let mut candidates = Vec::new();
    for name in ["h1", "h2", "h3"] {
        let user = store.create_profile(name, 0).await;
        candidates.push(
            roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
                .await
                .unwrap(),
        );
    }

    let first = roster::select_candidate(&store, candidates[0].id).await.unwrap();
    let again = roster::select_candidate(&store, candidates[0].id).await.unwrap();
    assert_eq!(first, again);

    roster::select_candidate(&store, candidates[1].id).await.unwrap();
    let err = roster::select_candidate(&store, candidates[2].id)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));

    let overview = battles::battle_overview(&store, battle.id).await.unwrap();
    assert_eq!(overview.participants.len(), 2);
    let third = overview
        .candidates
        .iter()
        .find(|c| c.id == candidates[2].id)
        .unwrap();
    assert!(!third.is_selected);
}

#[tokio::test]
async fn test_selection_closes_after_selection_phase() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Gooseberry", 0))
        .await
        .unwrap();
    let user = store.create_profile("ivy", 0).await;
    let candidate = roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
        .await
        .unwrap();

    advance_to(&store, battle.id, BattlePhase::Production).await;
    let err = roster::select_candidate(&store, candidate.id).await.unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));
}

#[tokio::test]
async fn test_participant_removal_closes_at_vote() {
    let arena = Arena::new("Cherry", 10).await;

    let err = roster::remove_participant(&arena.store, arena.participants[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));

    let overview = battles::battle_overview(&arena.store, arena.battle.id)
        .await
        .unwrap();
    assert_eq!(overview.participants.len(), 2);
}

#[tokio::test]
async fn test_participant_removal_frees_a_slot_before_vote() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Pear", 0))
        .await
        .unwrap();
    let mut candidates = Vec::new();
    for name in ["g1", "g2", "g3"] {
        let user = store.create_profile(name, 0).await;
        candidates.push(
            roster::submit_candidacy(&store, battle.id, &candidacy(user.id))
                .await
                .unwrap(),
        );
    }

    let first = roster::select_candidate(&store, candidates[0].id).await.unwrap();
    roster::select_candidate(&store, candidates[1].id).await.unwrap();
    roster::remove_participant(&store, first.id).await.unwrap();

    let overview = battles::battle_overview(&store, battle.id).await.unwrap();
    let removed = overview
        .candidates
        .iter()
        .find(|c| c.id == candidates[0].id)
        .unwrap();
    assert!(!removed.is_selected);

    roster::select_candidate(&store, candidates[2].id).await.unwrap();

    let overview = battles::battle_overview(&store, battle.id).await.unwrap();
    assert_eq!(overview.participants.len(), 2);
    let selected = overview.candidates.iter().filter(|c| c.is_selected).count();
    assert_eq!(selected, 2);
}

#[tokio::test]
async fn test_concurrent_advance_moves_once() {
    let store = Arc::new(MemoryStore::new());
    let battle = battles::create_battle(store.as_ref(), &battle_request("Blood orange", 0))
        .await
        .unwrap();

    let mut calls = JoinSet::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let battle_id = battle.id;
        calls.spawn(async move {
            battles::advance_phase(store.as_ref(), battle_id, BattlePhase::Selection).await
        });
    }

    let mut advanced = 0;
    while let Some(outcome) = calls.join_next().await {
        match outcome.unwrap() {
            Ok(battle) => {
                assert_eq!(battle.status, BattlePhase::Selection);
                advanced += 1;
            }
            Err(err) => assert!(matches!(err, BattleError::InvalidTransition { .. })),
        }
    }
    assert_eq!(advanced, 1);
}

#[tokio::test]
async fn test_concurrent_selection_respects_capacity() {
    let store = Arc::new(MemoryStore::new());
    let battle = battles::create_battle(store.as_ref(), &battle_request("Elderflower", 0))
        .await
        .unwrap();

    let mut candidates = Vec::new();
    for name in ["c1", "c2", "c3", "c4"] {
        let user = store.create_profile(name, 0).await;
        candidates.push(
            roster::submit_candidacy(store.as_ref(), battle.id, &candidacy(user.id))
                .await
                .unwrap(),
        );
    }

    let mut calls = JoinSet::new();
    for candidate in &candidates {
        let store = Arc::clone(&store);
        let candidate_id = candidate.id;
        calls.spawn(async move { roster::select_candidate(store.as_ref(), candidate_id).await });
    }

    let mut seated = 0;
    while let Some(outcome) = calls.join_next().await {
        match outcome.unwrap() {
            Ok(_) => seated += 1,
            Err(err) => assert!(matches!(err, BattleError::InvalidState(_))),
        }
    }
    assert_eq!(seated, roster::MAX_PARTICIPANTS);

    let overview = battles::battle_overview(store.as_ref(), battle.id).await.unwrap();
    assert_eq!(overview.participants.len(), roster::MAX_PARTICIPANTS);
    let selected = overview.candidates.iter().filter(|c| c.is_selected).count();
    assert_eq!(selected, roster::MAX_PARTICIPANTS);
}

#[tokio::test]
async fn test_judges_cannot_compete() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Mango", 0))
        .await
        .unwrap();
    let competitor = store.create_profile("kai", 0).await;
    let judge = store.create_profile("lou", 0).await;

    roster::submit_candidacy(&store, battle.id, &candidacy(competitor.id))
        .await
        .unwrap();
    assert!(
        !eligibility::is_eligible_judge(&store, competitor.id, battle.id)
            .await
            .unwrap()
    );
    let err = roster::apply_as_judge(&store, battle.id, competitor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::NotEligible { .. }));

    roster::apply_as_judge(&store, battle.id, judge.id).await.unwrap();
    let err = roster::apply_as_judge(&store, battle.id, judge.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::DuplicateJudge { .. }));

    let err = roster::submit_candidacy(&store, battle.id, &candidacy(judge.id))
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::NotEligible { .. }));
}

#[tokio::test]
async fn test_racing_judge_and_candidacy_keep_one_role() {
    for _ in 0..16 {
        let store = MemoryStore::new();
        let battle = battles::create_battle(&store, &battle_request("Rhubarb", 0))
            .await
            .unwrap();
        let user = store.create_profile("nell", 0).await;

        let request = candidacy(user.id);
        let (as_candidate, as_judge) = tokio::join!(
            roster::submit_candidacy(&store, battle.id, &request),
            roster::apply_as_judge(&store, battle.id, user.id)
        );
        assert!(as_candidate.is_ok() ^ as_judge.is_ok());

        let overview = battles::battle_overview(&store, battle.id).await.unwrap();
        assert_eq!(overview.candidates.len() + overview.judges.len(), 1);
    }
}

#[tokio::test]
async fn test_judge_validation_and_logistics() {
    let store = MemoryStore::new();
    let battle = battles::create_battle(&store, &battle_request("Lemon curd", 0))
        .await
        .unwrap();
    let user = store.create_profile("max", 0).await;
    let judge = roster::apply_as_judge(&store, battle.id, user.id).await.unwrap();
    assert!(!judge.is_validated);

    let validated = roster::validate_judge(&store, judge.id).await.unwrap();
    assert!(validated.is_validated);
    let twice = roster::validate_judge(&store, judge.id).await.unwrap();
    assert!(twice.is_validated);

    let ordered = roster::update_judge_logistics(&store, judge.id, JudgeLogistics::HasOrdered, true)
        .await
        .unwrap();
    assert!(ordered.has_ordered);
    assert!(!ordered.has_received);

    roster::remove_judge(&store, judge.id).await.unwrap();
    let err = roster::validate_judge(&store, judge.id).await.unwrap_err();
    assert!(matches!(err, BattleError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_only_without_participants() {
    let arena = Arena::new("Peach", 0).await;
    let err = battles::delete_battle(&arena.store, arena.battle.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BattleError::InvalidState(_)));

    let store = MemoryStore::new();
    let empty = battles::create_battle(&store, &battle_request("Empty", 0))
        .await
        .unwrap();
    battles::delete_battle(&store, empty.id).await.unwrap();
    let err = battles::get_battle(&store, empty.id).await.unwrap_err();
    assert!(matches!(err, BattleError::NotFound { .. }));
}
