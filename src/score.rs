//! End-of-game scoring.

use crate::board::RouteId;
use crate::card::DestinationTicket;
use crate::connectivity;
use crate::player::Player;

use serde::{Deserialize, Serialize};

/// Bonus for holding the (possibly shared) longest continuous path.
pub const LONGEST_PATH_BONUS: i16 = 10;

/// One destination ticket with its end-of-game verdict.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TicketResult {
    pub ticket: DestinationTicket,
    pub completed: bool,
}

/// The complete score breakdown of one player.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerScore {
    pub player_id: usize,
    /// Points accumulated by claiming routes during the game.
    pub route_points: u8,
    /// Ticket points: positive for completed tickets, negative for failed
    /// ones.
    pub ticket_points: i16,
    pub completed_tickets: u8,
    pub tickets: Vec<TicketResult>,
    /// Length of this player's longest continuous path.
    pub longest_path: u16,
    /// The routes of one such path, in traversal order.
    pub longest_path_trace: Vec<RouteId>,
    pub has_longest_path_bonus: bool,
    pub total: i16,
}

/// The final standings: every player's breakdown, plus the winner(s).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Standings {
    pub scores: Vec<PlayerScore>,
    /// Ids of the winning player(s). More than one entry means a full tie,
    /// after breaking by completed tickets and then by longest path.
    pub winners: Vec<usize>,
}

/// Scores every player and ranks them.
pub fn compute_standings(players: &[Player]) -> Standings {
    let mut scores: Vec<PlayerScore> = players.iter().map(score_player).collect();

    // The path bonus goes to every player tied for the longest path, but only
    // if somebody built one at all.
    let best_path = scores.iter().map(|score| score.longest_path).max().unwrap_or(0);
    if best_path > 0 {
        for score in &mut scores {
            if score.longest_path == best_path {
                score.has_longest_path_bonus = true;
                score.total += LONGEST_PATH_BONUS;
            }
        }
    }

    let best_rank = scores.iter().map(rank).max();
    let winners = scores
        .iter()
        .filter(|score| Some(rank(score)) == best_rank)
        .map(|score| score.player_id)
        .collect();

    Standings { scores, winners }
}

fn rank(score: &PlayerScore) -> (i16, u8, u16) {
    (score.total, score.completed_tickets, score.longest_path)
}

fn score_player(player: &Player) -> PlayerScore {
    let claimed = player.claimed_routes();

    let mut ticket_points = 0;
    let mut completed_tickets = 0;
    let tickets: Vec<TicketResult> = player
        .tickets()
        .iter()
        .map(|ticket| {
            let completed = connectivity::reachable(ticket.cities.0, ticket.cities.1, claimed);
            if completed {
                ticket_points += ticket.points as i16;
                completed_tickets += 1;
            } else {
                ticket_points -= ticket.points as i16;
            }
            TicketResult {
                ticket: ticket.clone(),
                completed,
            }
        })
        .collect();

    let (longest_path, longest_path_trace) = connectivity::longest_path_with_trace(claimed);

    PlayerScore {
        player_id: player.id,
        route_points: player.route_points(),
        ticket_points,
        completed_tickets,
        tickets,
        longest_path,
        longest_path_trace,
        has_longest_path_bonus: false,
        total: player.route_points() as i16 + ticket_points,
    }
}
