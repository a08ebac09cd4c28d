#![allow(dead_code)]

use chrono::{Duration, Utc};
use storage::MemoryStore;
use storage::dto::battle::CreateBattleRequest;
use storage::dto::roster::SubmitCandidacyRequest;
use storage::dto::vote::{CastVoteRequest, CreateCriteriaRequest};
use storage::models::{Battle, BattlePhase, Criteria, Judge, Participant, Profile};
use storage::services::{battles, criteria, roster, votes};
use uuid::Uuid;

pub fn battle_request(theme: &str, reward_credits: i64) -> CreateBattleRequest {
    let now = Utc::now();
    CreateBattleRequest {
        theme: theme.to_string(),
        constraints: Vec::new(),
        registration_end: now + Duration::days(7),
        production_end: now + Duration::days(14),
        voting_end: now + Duration::days(21),
        reward_credits,
        min_jams_required: 0,
    }
}

pub fn candidacy(user_id: Uuid) -> SubmitCandidacyRequest {
    SubmitCandidacyRequest {
        user_id,
        motivation: "Ready to cook".to_string(),
        reference_jam_id: None,
    }
}

pub async fn advance_to(store: &MemoryStore, battle_id: Uuid, target: BattlePhase) {
    loop {
        let battle = battles::get_battle(store, battle_id).await.unwrap();
        if battle.status == target {
            return;
        }
        let next = battle.status.successor().expect("target is ahead");
        battles::advance_phase(store, battle_id, next).await.unwrap();
    }
}

/// A battle in the vote phase with two participants, two validated judges
/// and five criteria.
pub struct Arena {
    pub store: MemoryStore,
    pub battle: Battle,
    pub competitors: Vec<Profile>,
    pub participants: Vec<Participant>,
    pub judges: Vec<Judge>,
    pub criteria: Vec<Criteria>,
}

impl Arena {
    pub async fn new(theme: &str, reward_credits: i64) -> Self {
        let store = MemoryStore::new();
        let battle = battles::create_battle(&store, &battle_request(theme, reward_credits))
            .await
            .unwrap();

        let mut competitors = Vec::new();
        let mut candidates = Vec::new();
        for name in ["alba", "bruno"] {
            let profile = store.create_profile(name, 100).await;
            candidates.push(
                roster::submit_candidacy(&store, battle.id, &candidacy(profile.id))
                    .await
                    .unwrap(),
            );
            competitors.push(profile);
        }

        let mut judges = Vec::new();
        for name in ["judge-1", "judge-2"] {
            let profile = store.create_profile(name, 0).await;
            judges.push(roster::apply_as_judge(&store, battle.id, profile.id).await.unwrap());
        }

        advance_to(&store, battle.id, BattlePhase::Selection).await;
        let mut participants = Vec::new();
        for candidate in &candidates {
            participants.push(roster::select_candidate(&store, candidate.id).await.unwrap());
        }
        for judge in judges.iter_mut() {
            *judge = roster::validate_judge(&store, judge.id).await.unwrap();
        }

        let mut criteria_list = Vec::new();
        for name in ["taste", "texture", "sweetness", "theme", "presentation"] {
            let request = CreateCriteriaRequest {
                name: name.to_string(),
                description: None,
            };
            criteria_list.push(criteria::create_criteria(&store, &request).await.unwrap());
        }

        advance_to(&store, battle.id, BattlePhase::Vote).await;
        let battle = battles::get_battle(&store, battle.id).await.unwrap();

        Self {
            store,
            battle,
            competitors,
            participants,
            judges,
            criteria: criteria_list,
        }
    }

    /// Scores every criteria of one participant for one judge.
    pub async fn score(&self, judge: usize, participant: usize, scores: [i16; 5]) {
        for (criteria, score) in self.criteria.iter().zip(scores) {
            let request = CastVoteRequest {
                judge_id: self.judges[judge].id,
                participant_id: self.participants[participant].id,
                criteria_id: criteria.id,
                score,
            };
            votes::cast_vote(&self.store, self.battle.id, &request)
                .await
                .unwrap();
        }
    }
}
