//! Storage seams of the battle engine.
//!
//! Each concern has its own trait; [`Database`](crate::Database) implements
//! them on PostgreSQL and [`memory::MemoryStore`] keeps everything in
//! process. Every method that guards an invariant spanning more than one
//! record runs as one atomic unit in both backends.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{BattlePhase, BattleResult, CreditTransaction, Participant};

pub mod battle;
pub mod memory;
pub mod profile;
pub mod result;
pub mod roster;
pub mod vote;

pub use battle::BattleRepository;
pub use memory::MemoryStore;
pub use profile::{JamInventory, ProfileRepository};
pub use result::ResultRepository;
pub use roster::RosterRepository;
pub use vote::{CriteriaRepository, VoteRepository};

/// Everything the engine services need from a backend.
pub trait Store:
    BattleRepository
    + RosterRepository
    + VoteRepository
    + CriteriaRepository
    + ResultRepository
    + ProfileRepository
    + JamInventory
{
}

impl<T> Store for T where
    T: BattleRepository
        + RosterRepository
        + VoteRepository
        + CriteriaRepository
        + ResultRepository
        + ProfileRepository
        + JamInventory
{
}

/// Result of a write that is only legal in some battle phases.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseGuarded<T> {
    Applied(T),
    /// The battle sits in a phase that forbids the write.
    Closed(BattlePhase),
    /// The battle or the targeted record is gone.
    Missing,
}

impl<T> PhaseGuarded<T> {
    pub fn check(phase: BattlePhase, allowed: &[BattlePhase]) -> Option<Self> {
        if allowed.contains(&phase) {
            None
        } else {
            Some(PhaseGuarded::Closed(phase))
        }
    }
}

/// Roles a user can hold in one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleRole {
    Candidate,
    Participant,
    Judge,
}

/// Result of adding a candidate or a judge. A user never holds both a
/// competing role and a judging role in the same battle.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrollment<T> {
    Enrolled(T),
    /// The user already holds the requested role.
    Duplicate,
    /// The user holds a role that excludes the requested one.
    Conflict(BattleRole),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Selected(Participant),
    /// The user already had a participant row; nothing was created.
    AlreadySelected(Participant),
    RosterFull,
    Closed(BattlePhase),
    Missing,
}

/// Everything needed to pay a battle winner in one step.
#[derive(Debug, Clone)]
pub struct RewardPayout {
    pub battle_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub description: String,
}

#[derive(Debug, Clone)]
pub enum Settlement {
    Paid {
        result: BattleResult,
        transaction: CreditTransaction,
    },
    /// The flag was already set; nothing changed.
    AlreadyDistributed(BattleResult),
    /// No result row, or a tie.
    NothingToPay,
    /// The winner's profile vanished; the flag was left untouched.
    MissingProfile,
}

/// Reads the battle phase inside a transaction while holding a row lock.
///
/// `exclusive` takes `FOR UPDATE`; otherwise `FOR SHARE`, which lets
/// concurrent writers of independent rows proceed but blocks phase changes.
pub(crate) async fn lock_battle_phase(
    conn: &mut PgConnection,
    battle_id: Uuid,
    exclusive: bool,
) -> Result<Option<BattlePhase>> {
    let sql = if exclusive {
        "SELECT status FROM battles WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT status FROM battles WHERE id = $1 FOR SHARE"
    };

    let status: Option<String> = sqlx::query_scalar(sql)
        .bind(battle_id)
        .fetch_optional(conn)
        .await?;

    status
        .map(|s| {
            s.parse::<BattlePhase>()
                .map_err(|e| StorageError::Corrupt(format!("battle {}: {}", battle_id, e)))
        })
        .transpose()
}
