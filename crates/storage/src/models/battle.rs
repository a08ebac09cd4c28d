use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle phase of a battle.
///
/// Phases are strictly ordered; the only legal move is to the immediate
/// successor, and `Termine` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BattlePhase {
    Inscription,
    Selection,
    Production,
    Envoi,
    Vote,
    Termine,
}

impl BattlePhase {
    pub const ALL: [BattlePhase; 6] = [
        BattlePhase::Inscription,
        BattlePhase::Selection,
        BattlePhase::Production,
        BattlePhase::Envoi,
        BattlePhase::Vote,
        BattlePhase::Termine,
    ];

    /// Every phase but the absorbing one.
    pub const LIVE: [BattlePhase; 5] = [
        BattlePhase::Inscription,
        BattlePhase::Selection,
        BattlePhase::Production,
        BattlePhase::Envoi,
        BattlePhase::Vote,
    ];

    /// Phases during which the roster may still be edited.
    pub const ROSTER_OPEN: [BattlePhase; 4] = [
        BattlePhase::Inscription,
        BattlePhase::Selection,
        BattlePhase::Production,
        BattlePhase::Envoi,
    ];

    pub fn successor(self) -> Option<BattlePhase> {
        match self {
            BattlePhase::Inscription => Some(BattlePhase::Selection),
            BattlePhase::Selection => Some(BattlePhase::Production),
            BattlePhase::Production => Some(BattlePhase::Envoi),
            BattlePhase::Envoi => Some(BattlePhase::Vote),
            BattlePhase::Vote => Some(BattlePhase::Termine),
            BattlePhase::Termine => None,
        }
    }

    pub fn can_advance_to(self, target: BattlePhase) -> bool {
        self.successor() == Some(target)
    }

    pub fn is_terminal(self) -> bool {
        self == BattlePhase::Termine
    }

    /// True while candidates, participants and judges may still be removed.
    pub fn roster_open(self) -> bool {
        self < BattlePhase::Vote
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BattlePhase::Inscription => "inscription",
            BattlePhase::Selection => "selection",
            BattlePhase::Production => "production",
            BattlePhase::Envoi => "envoi",
            BattlePhase::Vote => "vote",
            BattlePhase::Termine => "termine",
        }
    }
}

impl fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BattlePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BattlePhase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("unknown battle phase '{}'", s))
    }
}

/// One named rule of a battle, e.g. `max_ingredients = 4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BattleConstraint {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Battle {
    pub id: Uuid,
    pub theme: String,
    /// Ordered as entered by the organizer.
    pub constraints: Vec<BattleConstraint>,
    pub registration_end: DateTime<Utc>,
    pub production_end: DateTime<Utc>,
    pub voting_end: DateTime<Utc>,
    pub status: BattlePhase,
    pub reward_credits: i64,
    pub min_jams_required: i32,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_phase_advances_only_to_its_successor() {
        for (i, from) in BattlePhase::ALL.iter().enumerate() {
            for (j, to) in BattlePhase::ALL.iter().enumerate() {
                assert_eq!(from.can_advance_to(*to), j == i + 1, "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_termine_is_absorbing() {
        assert!(BattlePhase::Termine.is_terminal());
        assert_eq!(BattlePhase::Termine.successor(), None);
        assert!(!BattlePhase::Inscription.can_advance_to(BattlePhase::Termine));
    }

    #[test]
    fn test_roster_closes_at_vote() {
        assert!(BattlePhase::Envoi.roster_open());
        assert!(!BattlePhase::Vote.roster_open());
        assert!(!BattlePhase::Termine.roster_open());
        assert!(BattlePhase::ROSTER_OPEN.iter().all(|p| p.roster_open()));
    }

    #[test]
    fn test_phase_string_round_trip() {
        for phase in BattlePhase::ALL {
            assert_eq!(phase.as_str().parse::<BattlePhase>(), Ok(phase));
        }
        assert!("finished".parse::<BattlePhase>().is_err());
    }
}
