//! Team-wipe detection.

use crate::state::{Participant, Team};

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleOutcome {
    Victory { winner: Team },
    /// Both teams were wiped by the same action (mutual damage-over-time).
    Draw,
}

impl BattleOutcome {
    pub fn winner(self) -> Option<Team> {
        match self {
            BattleOutcome::Victory { winner } => Some(winner),
            BattleOutcome::Draw => None,
        }
    }
}

/// Checks whether one team has been wiped.
///
/// A team is wiped when every one of its participants (at least one) is
/// `Defeated`. Retired (`Inactive`) participants no longer count toward the
/// team at all. Returns `None` while both teams still have standing members.
pub fn check_completion(participants: &[Participant]) -> Option<BattleOutcome> {
    let wiped = |team: Team| {
        let mut total = 0u32;
        let mut defeated = 0u32;
        for p in participants.iter().filter(|p| p.team == team) {
            match p.status {
                crate::state::ParticipantStatus::Inactive => {}
                crate::state::ParticipantStatus::Defeated => {
                    total += 1;
                    defeated += 1;
                }
                _ => total += 1,
            }
        }
        total > 0 && defeated == total
    };

    match (wiped(Team::One), wiped(Team::Two)) {
        (true, true) => Some(BattleOutcome::Draw),
        (true, false) => Some(BattleOutcome::Victory { winner: Team::Two }),
        (false, true) => Some(BattleOutcome::Victory { winner: Team::One }),
        (false, false) => None,
    }
}
