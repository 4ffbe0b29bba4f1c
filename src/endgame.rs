use serde::{Deserialize, Serialize};

/// A player ending a turn with this many cars or fewer triggers the final
/// round.
pub const CAR_TRIGGER_THRESHOLD: u8 = 2;

/// The end-of-game state machine.
///
/// The game runs until a player's car supply drops to the trigger threshold,
/// after which every player, the triggering player included, gets exactly one
/// more turn.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndGame {
    Running,
    FinalCountdown {
        triggered_by: usize,
        turns_remaining: u8,
    },
    Finished,
}

impl EndGame {
    pub fn new() -> Self {
        EndGame::Running
    }

    /// Called when a player ends their turn with `cars_left` cars. Starts the
    /// final countdown if the threshold is hit; later triggers are ignored, the
    /// countdown only starts once. Returns whether it started just now.
    pub fn maybe_trigger(&mut self, player_id: usize, cars_left: u8, num_players: usize) -> bool {
        if *self != EndGame::Running || cars_left > CAR_TRIGGER_THRESHOLD {
            return false;
        }

        log::debug!(
            "player {} is down to {} cars; every player gets one more turn",
            player_id,
            cars_left
        );
        *self = EndGame::FinalCountdown {
            triggered_by: player_id,
            turns_remaining: num_players as u8,
        };
        true
    }

    /// Called as each new turn is about to begin. Returns `true` when the game
    /// is over and the turn must not take place.
    pub fn begin_turn(&mut self) -> bool {
        match self {
            EndGame::Running => false,
            EndGame::FinalCountdown {
                turns_remaining, ..
            } => {
                if *turns_remaining == 0 {
                    *self = EndGame::Finished;
                    true
                } else {
                    *turns_remaining -= 1;
                    false
                }
            }
            EndGame::Finished => true,
        }
    }

    /// Ends the game immediately, skipping any countdown.
    pub fn force_finish(&mut self) {
        *self = EndGame::Finished;
    }

    pub fn is_finished(&self) -> bool {
        *self == EndGame::Finished
    }

    /// Remaining turns of the final countdown, if it is running.
    pub fn countdown(&self) -> Option<u8> {
        match self {
            EndGame::FinalCountdown {
                turns_remaining, ..
            } => Some(*turns_remaining),
            _ => None,
        }
    }
}

impl Default for EndGame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trigger_above_threshold() {
        let mut end_game = EndGame::new();
        assert!(!end_game.maybe_trigger(0, 3, 4));
        assert_eq!(end_game, EndGame::Running);
    }

    #[test]
    fn trigger_at_threshold() {
        let mut end_game = EndGame::new();
        assert!(end_game.maybe_trigger(1, 2, 4));
        assert_eq!(
            end_game,
            EndGame::FinalCountdown {
                triggered_by: 1,
                turns_remaining: 4
            }
        );
    }

    #[test]
    fn trigger_fires_only_once() {
        let mut end_game = EndGame::new();
        assert!(end_game.maybe_trigger(1, 0, 3));
        assert!(!end_game.maybe_trigger(2, 1, 3));
        assert_eq!(
            end_game,
            EndGame::FinalCountdown {
                triggered_by: 1,
                turns_remaining: 3
            }
        );
    }

    #[test]
    fn every_player_gets_exactly_one_more_turn() {
        let num_players = 3;
        let mut end_game = EndGame::new();

        // Turns run freely before the trigger.
        assert!(!end_game.begin_turn());
        end_game.maybe_trigger(0, 2, num_players);

        // Exactly `num_players` further turns take place.
        for _ in 0..num_players {
            assert!(!end_game.begin_turn());
        }
        assert!(end_game.begin_turn());
        assert!(end_game.is_finished());

        // And the game stays finished.
        assert!(end_game.begin_turn());
    }

    #[test]
    fn force_finish_skips_the_countdown() {
        let mut end_game = EndGame::new();
        end_game.maybe_trigger(0, 1, 5);

        end_game.force_finish();
        assert!(end_game.is_finished());
        assert!(end_game.begin_turn());
    }

    #[test]
    fn countdown_is_only_reported_mid_countdown() {
        let mut end_game = EndGame::new();
        assert_eq!(end_game.countdown(), None);

        end_game.maybe_trigger(0, 2, 2);
        assert_eq!(end_game.countdown(), Some(2));

        end_game.force_finish();
        assert_eq!(end_game.countdown(), None);
    }
}
