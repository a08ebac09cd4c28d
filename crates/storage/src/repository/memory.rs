//! In-process backend.
//!
//! All state sits behind one lock, so every trait method is atomic with
//! respect to every other. Used by the test suites and by the web binary
//! when `STORAGE_BACKEND=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::profile::APPROVED_JAM_STATUSES;
use super::{
    BattleRepository, BattleRole, CriteriaRepository, Enrollment, JamInventory, PhaseGuarded,
    ProfileRepository, ResultRepository, RewardPayout, RosterRepository, SelectionOutcome, Settlement,
    VoteRepository,
};
use crate::dto::battle::{BattleListFilter, VisibilityRequest};
use crate::error::{Result, StorageError};
use crate::models::{
    Battle, BattlePhase, BattleResult, Candidate, CreditTransaction, Criteria, CriteriaScore, Judge,
    JudgeLogistics, Participant, Profile, VoteComment,
};

#[derive(Debug, Clone)]
struct StoredJam {
    id: Uuid,
    owner: Uuid,
    status: String,
    is_active: bool,
}

#[derive(Default)]
struct MemoryState {
    profiles: HashMap<Uuid, Profile>,
    jams: Vec<StoredJam>,
    battles: HashMap<Uuid, Battle>,
    candidates: Vec<Candidate>,
    participants: Vec<Participant>,
    judges: Vec<Judge>,
    criteria: Vec<Criteria>,
    votes: Vec<CriteriaScore>,
    comments: Vec<VoteComment>,
    results: HashMap<Uuid, BattleResult>,
    transactions: Vec<CreditTransaction>,
}

impl MemoryState {
    fn phase(&self, battle_id: Uuid) -> Option<BattlePhase> {
        self.battles.get(&battle_id).map(|battle| battle.status)
    }

    /// `Some` short-circuits the caller with `Missing` or `Closed`.
    fn guard<T>(&self, battle_id: Uuid, open: &[BattlePhase]) -> Option<PhaseGuarded<T>> {
        match self.phase(battle_id) {
            None => Some(PhaseGuarded::Missing),
            Some(phase) => PhaseGuarded::check(phase, open),
        }
    }

    fn holds_role(&self, role: BattleRole, battle_id: Uuid, user_id: Uuid) -> bool {
        match role {
            BattleRole::Candidate => self
                .candidates
                .iter()
                .any(|c| c.battle_id == battle_id && c.user_id == user_id),
            BattleRole::Participant => self
                .participants
                .iter()
                .any(|p| p.battle_id == battle_id && p.user_id == user_id),
            BattleRole::Judge => self
                .judges
                .iter()
                .any(|j| j.battle_id == battle_id && j.user_id == user_id),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user profile with an opening balance.
    pub async fn create_profile(&self, username: &str, credits: i64) -> Profile {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: username.to_string(),
            credits,
            is_organizer: false,
            created_at: Utc::now(),
        };

        self.state
            .write()
            .await
            .profiles
            .insert(profile.id, profile.clone());

        profile
    }

    /// Adds a jam to the catalogue and returns its id.
    pub async fn create_jam(&self, owner: Uuid, status: &str) -> Uuid {
        let jam = StoredJam {
            id: Uuid::new_v4(),
            owner,
            status: status.to_string(),
            is_active: true,
        };
        let id = jam.id;

        self.state.write().await.jams.push(jam);

        id
    }

    pub async fn set_jam_active(&self, jam_id: Uuid, is_active: bool) {
        let mut state = self.state.write().await;
        if let Some(jam) = state.jams.iter_mut().find(|jam| jam.id == jam_id) {
            jam.is_active = is_active;
        }
    }
}

#[async_trait]
impl BattleRepository for MemoryStore {
    async fn insert_battle(&self, battle: &Battle) -> Result<Battle> {
        let mut state = self.state.write().await;

        if state.battles.contains_key(&battle.id) {
            return Err(StorageError::ConstraintViolation(format!(
                "battle {} already exists",
                battle.id
            )));
        }
        state.battles.insert(battle.id, battle.clone());

        Ok(battle.clone())
    }

    async fn find_battle(&self, battle_id: Uuid) -> Result<Option<Battle>> {
        Ok(self.state.read().await.battles.get(&battle_id).cloned())
    }

    async fn list_battles(&self, filter: &BattleListFilter) -> Result<Vec<Battle>> {
        let state = self.state.read().await;

        let mut battles: Vec<Battle> = state
            .battles
            .values()
            .filter(|b| !filter.active_only || b.is_active)
            .filter(|b| !filter.featured_only || b.is_featured)
            .cloned()
            .collect();

        battles.sort_by(|a, b| {
            b.is_featured
                .cmp(&a.is_featured)
                .then(b.registration_end.cmp(&a.registration_end))
                .then(b.created_at.cmp(&a.created_at))
        });

        Ok(battles)
    }

    async fn transition_phase(&self, battle_id: Uuid, from: BattlePhase, to: BattlePhase) -> Result<bool> {
        let mut state = self.state.write().await;

        match state.battles.get_mut(&battle_id) {
            Some(battle) if battle.status == from => {
                battle.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_visibility(
        &self,
        battle_id: Uuid,
        visibility: &VisibilityRequest,
    ) -> Result<Option<Battle>> {
        let mut state = self.state.write().await;

        let Some(battle) = state.battles.get_mut(&battle_id) else {
            return Ok(None);
        };
        if let Some(is_featured) = visibility.is_featured {
            battle.is_featured = is_featured;
        }
        if let Some(is_active) = visibility.is_active {
            battle.is_active = is_active;
        }

        Ok(Some(battle.clone()))
    }

    async fn delete_battle_without_participants(&self, battle_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.participants.iter().any(|p| p.battle_id == battle_id) {
            return Ok(false);
        }
        if state.battles.remove(&battle_id).is_none() {
            return Ok(false);
        }

        state.candidates.retain(|c| c.battle_id != battle_id);
        state.judges.retain(|j| j.battle_id != battle_id);
        state.votes.retain(|v| v.battle_id != battle_id);
        state.comments.retain(|c| c.battle_id != battle_id);
        state.results.remove(&battle_id);

        Ok(true)
    }
}

#[async_trait]
impl RosterRepository for MemoryStore {
    async fn insert_candidate(
        &self,
        candidate: &Candidate,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<Enrollment<Candidate>>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(candidate.battle_id, open) {
            return Ok(stop);
        }
        if state.holds_role(BattleRole::Judge, candidate.battle_id, candidate.user_id) {
            return Ok(PhaseGuarded::Applied(Enrollment::Conflict(BattleRole::Judge)));
        }
        if state.holds_role(BattleRole::Candidate, candidate.battle_id, candidate.user_id) {
            return Ok(PhaseGuarded::Applied(Enrollment::Duplicate));
        }
        state.candidates.push(candidate.clone());

        Ok(PhaseGuarded::Applied(Enrollment::Enrolled(candidate.clone())))
    }

    async fn find_candidate(&self, candidate_id: Uuid) -> Result<Option<Candidate>> {
        let state = self.state.read().await;
        Ok(state.candidates.iter().find(|c| c.id == candidate_id).cloned())
    }

    async fn list_candidates(&self, battle_id: Uuid) -> Result<Vec<Candidate>> {
        let state = self.state.read().await;
        Ok(state
            .candidates
            .iter()
            .filter(|c| c.battle_id == battle_id)
            .cloned()
            .collect())
    }

    async fn select_candidate(
        &self,
        candidate: &Candidate,
        open: &[BattlePhase],
        capacity: usize,
    ) -> Result<SelectionOutcome> {
        let mut state = self.state.write().await;

        match state.phase(candidate.battle_id) {
            None => return Ok(SelectionOutcome::Missing),
            Some(phase) if !open.contains(&phase) => return Ok(SelectionOutcome::Closed(phase)),
            Some(_) => {}
        }

        let Some(index) = state.candidates.iter().position(|c| c.id == candidate.id) else {
            return Ok(SelectionOutcome::Missing);
        };
        state.candidates[index].is_selected = true;

        if let Some(existing) = state
            .participants
            .iter()
            .find(|p| p.battle_id == candidate.battle_id && p.user_id == candidate.user_id)
        {
            return Ok(SelectionOutcome::AlreadySelected(existing.clone()));
        }

        let seated = state
            .participants
            .iter()
            .filter(|p| p.battle_id == candidate.battle_id)
            .count();
        if seated >= capacity {
            // Undo the flag, matching the rolled back transaction.
            state.candidates[index].is_selected = candidate.is_selected;
            return Ok(SelectionOutcome::RosterFull);
        }

        let participant = Participant {
            id: Uuid::new_v4(),
            battle_id: candidate.battle_id,
            user_id: candidate.user_id,
            created_at: Utc::now(),
        };
        state.participants.push(participant.clone());

        Ok(SelectionOutcome::Selected(participant))
    }

    async fn delete_candidate(&self, candidate: &Candidate, open: &[BattlePhase]) -> Result<PhaseGuarded<()>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(candidate.battle_id, open) {
            return Ok(stop);
        }
        let before = state.candidates.len();
        state.candidates.retain(|c| c.id != candidate.id);

        Ok(if state.candidates.len() == before {
            PhaseGuarded::Missing
        } else {
            PhaseGuarded::Applied(())
        })
    }

    async fn find_participant(&self, participant_id: Uuid) -> Result<Option<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned())
    }

    async fn list_participants(&self, battle_id: Uuid) -> Result<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.battle_id == battle_id)
            .cloned()
            .collect())
    }

    async fn delete_participant(
        &self,
        participant: &Participant,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<()>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(participant.battle_id, open) {
            return Ok(stop);
        }
        let before = state.participants.len();
        state.participants.retain(|p| p.id != participant.id);
        if state.participants.len() == before {
            return Ok(PhaseGuarded::Missing);
        }

        for candidate in state
            .candidates
            .iter_mut()
            .filter(|c| c.battle_id == participant.battle_id && c.user_id == participant.user_id)
        {
            candidate.is_selected = false;
        }

        Ok(PhaseGuarded::Applied(()))
    }

    async fn insert_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<Enrollment<Judge>>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(judge.battle_id, open) {
            return Ok(stop);
        }
        for role in [BattleRole::Participant, BattleRole::Candidate] {
            if state.holds_role(role, judge.battle_id, judge.user_id) {
                return Ok(PhaseGuarded::Applied(Enrollment::Conflict(role)));
            }
        }
        if state.holds_role(BattleRole::Judge, judge.battle_id, judge.user_id) {
            return Ok(PhaseGuarded::Applied(Enrollment::Duplicate));
        }
        state.judges.push(judge.clone());

        Ok(PhaseGuarded::Applied(Enrollment::Enrolled(judge.clone())))
    }

    async fn find_judge(&self, judge_id: Uuid) -> Result<Option<Judge>> {
        let state = self.state.read().await;
        Ok(state.judges.iter().find(|j| j.id == judge_id).cloned())
    }

    async fn list_judges(&self, battle_id: Uuid) -> Result<Vec<Judge>> {
        let state = self.state.read().await;
        Ok(state
            .judges
            .iter()
            .filter(|j| j.battle_id == battle_id)
            .cloned()
            .collect())
    }

    async fn validate_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<Judge>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(judge.battle_id, open) {
            return Ok(stop);
        }
        let Some(stored) = state.judges.iter_mut().find(|j| j.id == judge.id) else {
            return Ok(PhaseGuarded::Missing);
        };
        stored.is_validated = true;

        Ok(PhaseGuarded::Applied(stored.clone()))
    }

    async fn set_judge_logistics(
        &self,
        judge: &Judge,
        field: JudgeLogistics,
        value: bool,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<Judge>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(judge.battle_id, open) {
            return Ok(stop);
        }
        let Some(stored) = state.judges.iter_mut().find(|j| j.id == judge.id) else {
            return Ok(PhaseGuarded::Missing);
        };
        match field {
            JudgeLogistics::HasOrdered => stored.has_ordered = value,
            JudgeLogistics::HasReceived => stored.has_received = value,
        }

        Ok(PhaseGuarded::Applied(stored.clone()))
    }

    async fn delete_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<()>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(judge.battle_id, open) {
            return Ok(stop);
        }
        let before = state.judges.len();
        state.judges.retain(|j| j.id != judge.id);

        Ok(if state.judges.len() == before {
            PhaseGuarded::Missing
        } else {
            PhaseGuarded::Applied(())
        })
    }
}

#[async_trait]
impl VoteRepository for MemoryStore {
    async fn upsert_vote(&self, vote: &CriteriaScore, open: &[BattlePhase]) -> Result<PhaseGuarded<CriteriaScore>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(vote.battle_id, open) {
            return Ok(stop);
        }

        let existing = state.votes.iter_mut().find(|v| {
            v.judge_id == vote.judge_id
                && v.participant_id == vote.participant_id
                && v.criteria_id == vote.criteria_id
        });

        let stored = match existing {
            Some(current) => {
                current.score = vote.score;
                current.updated_at = vote.updated_at;
                current.clone()
            }
            None => {
                state.votes.push(vote.clone());
                vote.clone()
            }
        };

        Ok(PhaseGuarded::Applied(stored))
    }

    async fn upsert_comment(
        &self,
        comment: &VoteComment,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<VoteComment>> {
        let mut state = self.state.write().await;

        if let Some(stop) = state.guard(comment.battle_id, open) {
            return Ok(stop);
        }

        let existing = state
            .comments
            .iter_mut()
            .find(|c| c.judge_id == comment.judge_id && c.participant_id == comment.participant_id);

        let stored = match existing {
            Some(current) => {
                current.comment = comment.comment.clone();
                current.updated_at = comment.updated_at;
                current.clone()
            }
            None => {
                state.comments.push(comment.clone());
                comment.clone()
            }
        };

        Ok(PhaseGuarded::Applied(stored))
    }

    async fn list_votes(&self, battle_id: Uuid) -> Result<Vec<CriteriaScore>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .iter()
            .filter(|v| v.battle_id == battle_id)
            .cloned()
            .collect())
    }

    async fn list_votes_by_judge(&self, battle_id: Uuid, judge_id: Uuid) -> Result<Vec<CriteriaScore>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .iter()
            .filter(|v| v.battle_id == battle_id && v.judge_id == judge_id)
            .cloned()
            .collect())
    }

    async fn list_comments(&self, battle_id: Uuid) -> Result<Vec<VoteComment>> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.battle_id == battle_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CriteriaRepository for MemoryStore {
    async fn insert_criteria(&self, criteria: &Criteria) -> Result<Criteria> {
        let mut state = self.state.write().await;

        if state.criteria.iter().any(|c| c.name == criteria.name) {
            return Err(StorageError::ConstraintViolation(format!(
                "Criteria '{}' already exists",
                criteria.name
            )));
        }
        state.criteria.push(criteria.clone());

        Ok(criteria.clone())
    }

    async fn find_criteria(&self, criteria_id: Uuid) -> Result<Option<Criteria>> {
        let state = self.state.read().await;
        Ok(state.criteria.iter().find(|c| c.id == criteria_id).cloned())
    }

    async fn list_criteria(&self) -> Result<Vec<Criteria>> {
        let mut criteria = self.state.read().await.criteria.clone();
        criteria.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(criteria)
    }
}

#[async_trait]
impl ResultRepository for MemoryStore {
    async fn insert_result(&self, result: &BattleResult) -> Result<Option<BattleResult>> {
        let mut state = self.state.write().await;

        if state.results.contains_key(&result.battle_id) {
            return Ok(None);
        }
        state.results.insert(result.battle_id, result.clone());

        Ok(Some(result.clone()))
    }

    async fn find_result(&self, battle_id: Uuid) -> Result<Option<BattleResult>> {
        Ok(self.state.read().await.results.get(&battle_id).cloned())
    }

    async fn settle_reward(&self, payout: &RewardPayout) -> Result<Settlement> {
        let mut state = self.state.write().await;
        let state = &mut *state;

        let Some(result) = state.results.get_mut(&payout.battle_id) else {
            return Ok(Settlement::NothingToPay);
        };
        if result.reward_distributed {
            return Ok(Settlement::AlreadyDistributed(result.clone()));
        }
        if result.winner_id.is_none() {
            return Ok(Settlement::NothingToPay);
        }
        let Some(profile) = state.profiles.get_mut(&payout.user_id) else {
            return Ok(Settlement::MissingProfile);
        };

        let now = Utc::now();
        profile.credits += payout.amount;
        result.reward_distributed = true;
        result.distributed_at = Some(now);

        let transaction = CreditTransaction {
            id: Uuid::new_v4(),
            user_id: payout.user_id,
            amount: payout.amount,
            description: payout.description.clone(),
            related_order_id: None,
            battle_id: Some(payout.battle_id),
            created_at: now,
        };
        state.transactions.push(transaction.clone());

        if let Some(battle) = state.battles.get_mut(&payout.battle_id)
            && battle.status == BattlePhase::Vote
        {
            battle.status = BattlePhase::Termine;
        }

        Ok(Settlement::Paid {
            result: result.clone(),
            transaction,
        })
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.state.read().await.profiles.get(&user_id).cloned())
    }

    async fn list_credit_transactions(&self, user_id: Uuid) -> Result<Vec<CreditTransaction>> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JamInventory for MemoryStore {
    async fn count_approved_jams(&self, user_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        let count = state
            .jams
            .iter()
            .filter(|jam| {
                jam.owner == user_id
                    && jam.is_active
                    && APPROVED_JAM_STATUSES.contains(&jam.status.as_str())
            })
            .count();

        Ok(count as i64)
    }

    async fn find_jam_owner(&self, jam_id: Uuid) -> Result<Option<Uuid>> {
        let state = self.state.read().await;
        Ok(state.jams.iter().find(|jam| jam.id == jam_id).map(|jam| jam.owner))
    }
}
