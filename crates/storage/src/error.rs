use thiserror::Error;
use uuid::Uuid;

use crate::models::BattlePhase;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }
}

/// Entity named in a [`BattleError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Battle,
    Candidate,
    Participant,
    Judge,
    Criteria,
    Profile,
    Jam,
    Result,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Battle => "battle",
            Entity::Candidate => "candidate",
            Entity::Participant => "participant",
            Entity::Judge => "judge",
            Entity::Criteria => "criteria",
            Entity::Profile => "profile",
            Entity::Jam => "jam",
            Entity::Result => "battle result",
        };
        f.write_str(name)
    }
}

/// Failures of the battle engine operations.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: Uuid },

    #[error("User {user_id} is not eligible: {reason}")]
    NotEligible { user_id: Uuid, reason: String },

    #[error("User {user_id} already applied to battle {battle_id}")]
    DuplicateCandidacy { battle_id: Uuid, user_id: Uuid },

    #[error("User {user_id} is already a judge of battle {battle_id}")]
    DuplicateJudge { battle_id: Uuid, user_id: Uuid },

    #[error("Battle {battle_id} cannot move from {from} to {to}")]
    InvalidTransition {
        battle_id: Uuid,
        from: BattlePhase,
        to: BattlePhase,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Battle {0} has no winner")]
    NoWinner(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type EngineResult<T> = std::result::Result<T, BattleError>;

impl BattleError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        BattleError::NotFound { entity, id }
    }

    /// Only storage I/O failures are worth retrying; every engine operation
    /// is safe to repeat.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BattleError::Storage(StorageError::Database(_)))
    }
}
