//! End-of-match detection.

use serde::{Deserialize, Serialize};

use crate::entities::{Factory, Player, PlayerId};

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// One player is left, or leads on score at the round cap.
    Winner(PlayerId),
    /// Nobody is left, or the leaders are tied.
    Draw,
}

/// Match status after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Verdict {
    /// Keep playing.
    #[default]
    Ongoing,
    /// No further rounds.
    MatchOver(Outcome),
}

impl Verdict {
    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::MatchOver(_))
    }
}

/// Live players with nothing left: no units anywhere and no production
/// rate on any owned factory.
///
/// Scores must be current. Disabled factories still count their rate.
#[must_use]
pub fn exhausted_players(factories: &[Factory], players: &[Player]) -> Vec<PlayerId> {
    players
        .iter()
        .filter(|p| p.is_alive() && p.score == 0)
        .filter(|p| {
            factories
                .iter()
                .filter(|f| f.owner.is(p.id))
                .all(|f| f.production_rate == 0)
        })
        .map(|p| p.id)
        .collect()
}

/// Verdict from who is still alive.
#[must_use]
pub fn check_victory(players: &[Player]) -> Verdict {
    let mut alive = players.iter().filter(|p| p.is_alive());
    match (alive.next(), alive.next()) {
        (None, _) => Verdict::MatchOver(Outcome::Draw),
        (Some(last), None) => Verdict::MatchOver(Outcome::Winner(last.id)),
        _ => Verdict::Ongoing,
    }
}

/// Outcome when the match is stopped early: the live player with the
/// highest score wins; a tie at the top is a draw.
#[must_use]
pub fn outcome_by_score(players: &[Player]) -> Outcome {
    let alive: Vec<&Player> = players.iter().filter(|p| p.is_alive()).collect();
    let Some(best) = alive.iter().map(|p| p.score).max() else {
        return Outcome::Draw;
    };
    let mut leaders = alive.iter().filter(|p| p.score == best);
    match (leaders.next(), leaders.next()) {
        (Some(leader), None) => Outcome::Winner(leader.id),
        _ => Outcome::Draw,
    }
}
