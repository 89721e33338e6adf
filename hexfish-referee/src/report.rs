//! Final match report

use hexfish_core::{GameState, Identity};
use serde::{Deserialize, Serialize};

/// One row of the leaderboard
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub identity: Identity,
    pub score: u32,
}

/// Outcome of a finished match
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    /// Players who finished the match, highest score first
    pub leaderboard: Vec<Standing>,
    /// Finishers sharing the top score
    pub winners: Vec<Identity>,
    /// Everybody else, including removed players
    pub losers: Vec<Identity>,
    pub cheaters: Vec<Identity>,
    pub failures: Vec<Identity>,
}

impl GameReport {
    /// Build the report for a finished game
    pub fn new(state: &GameState, cheaters: Vec<Identity>, failures: Vec<Identity>) -> Self {
        let leaderboard = state
            .leaderboard()
            .into_iter()
            .map(|record| Standing {
                identity: record.identity.clone(),
                score: record.score,
            })
            .collect();
        Self::from_standings(leaderboard, cheaters, failures)
    }

    /// Build a report from a leaderboard sorted by descending score
    pub fn from_standings(
        leaderboard: Vec<Standing>,
        cheaters: Vec<Identity>,
        failures: Vec<Identity>,
    ) -> Self {
        let top = leaderboard.iter().map(|s| s.score).max();

        let (winners, mut losers): (Vec<Identity>, Vec<Identity>) = {
            let (w, l): (Vec<&Standing>, Vec<&Standing>) =
                leaderboard.iter().partition(|s| Some(s.score) == top);
            (
                w.into_iter().map(|s| s.identity.clone()).collect(),
                l.into_iter().map(|s| s.identity.clone()).collect(),
            )
        };
        losers.extend(cheaters.iter().cloned());
        losers.extend(failures.iter().cloned());

        Self {
            leaderboard,
            winners,
            losers,
            cheaters,
            failures,
        }
    }

    /// Check if a player, by name and color, won
    pub fn is_winner(&self, identity: &Identity) -> bool {
        self.winners.contains(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfish_core::Color;

    fn standing(color: Color, score: u32) -> Standing {
        Standing {
            identity: Identity::new(color, format!("{color:?}")),
            score,
        }
    }

    #[test]
    fn test_ties_share_the_win() {
        let report = GameReport::from_standings(
            vec![standing(Color::Red, 9), standing(Color::Brown, 9), standing(Color::White, 4)],
            vec![],
            vec![Identity::new(Color::Black, "Black")],
        );
        assert_eq!(report.winners.len(), 2);
        assert!(report.is_winner(&Identity::new(Color::Brown, "Brown")));
        assert_eq!(
            report.losers,
            vec![Identity::new(Color::White, "White"), Identity::new(Color::Black, "Black")]
        );
    }

    #[test]
    fn test_empty_leaderboard_has_no_winners() {
        let cheater = Identity::new(Color::Red, "Red");
        let report = GameReport::from_standings(vec![], vec![cheater.clone()], vec![]);
        assert!(report.winners.is_empty());
        assert_eq!(report.losers, vec![cheater]);
    }

    #[test]
    fn test_report_serializes() {
        let report = GameReport::from_standings(vec![standing(Color::Red, 3)], vec![], vec![]);
        let json = serde_json::to_string(&report).unwrap();
        let back: GameReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
