use alias_types::{Player, PlayerId};

/// Index of the next explainer in roster order, wrapping at the end.
///
/// An unknown current position starts again from the top of the roster.
pub fn next_turn_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match current {
        Some(index) => Some((index + 1) % len),
        None => Some(0),
    }
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// The player who explains after `current_id`.
    pub fn next_turn_player(players: &[Player], current_id: Option<&str>) -> Option<PlayerId> {
        let current = current_id.and_then(|id| players.iter().position(|p| p.id == id));
        next_turn_index(current, players.len()).map(|index| players[index].id.clone())
    }

    /// First player, in roster order, whose score has reached the target.
    pub fn find_winner(players: &[Player], target_score: u32) -> Option<&Player> {
        players.iter().find(|p| p.score >= target_score)
    }

    /// Players by descending score. Ties keep roster order.
    pub fn leaderboard(players: &[Player]) -> Vec<Player> {
        let mut sorted = players.to_vec();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted
    }

    /// Add one point to a player. Returns false if the player is unknown.
    pub fn award_point(players: &mut [Player], player_id: &str) -> bool {
        match players.iter_mut().find(|p| p.id == player_id) {
            Some(player) => {
                player.score = player.score.saturating_add(1);
                true
            }
            None => false,
        }
    }
}
