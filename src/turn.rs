use crate::error::Error;

use serde::{Deserialize, Serialize};

/// Tracks what the current player has done so far this turn.
///
/// A turn is either two train card draws (where a face-up wild card counts as
/// both), or a single exclusive action: claiming a route or drawing destination
/// tickets. The state is reset by the game as each turn begins.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TurnState {
    cards_drawn: u8,
    drew_open_wild: bool,
    complete: bool,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn cards_drawn(&self) -> u8 {
        self.cards_drawn
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether this turn was spent on a face-up wild card.
    pub fn drew_open_wild(&self) -> bool {
        self.drew_open_wild
    }

    /// Whether the player has started drawing train cards, which locks them
    /// out of the exclusive actions for the rest of the turn.
    pub fn is_drawing(&self) -> bool {
        self.cards_drawn > 0
    }

    /// Pre-check for a train card draw. Split from [`TurnState::record_draw`]
    /// so the game can refuse the move before any card leaves the dealer.
    pub fn ensure_can_draw(&self, open_wild: bool) -> Result<(), Error> {
        if self.complete {
            return Err(Error::InvalidMove(String::from(
                "turn is already complete",
            )));
        }
        if open_wild && self.cards_drawn > 0 {
            return Err(Error::InvalidMove(String::from(
                "a face-up wild card can only be taken as the first draw of a turn",
            )));
        }

        Ok(())
    }

    /// Records a train card draw. `open_wild` marks the draw of a face-up wild
    /// card, which consumes the whole turn.
    pub fn record_draw(&mut self, open_wild: bool) -> Result<(), Error> {
        self.ensure_can_draw(open_wild)?;

        if open_wild {
            self.drew_open_wild = true;
            self.cards_drawn = 2;
        } else {
            self.cards_drawn += 1;
        }

        if self.cards_drawn >= 2 {
            self.complete = true;
        }

        Ok(())
    }

    /// Records a route claim or a ticket draw, both of which must be the only
    /// action of the turn.
    pub fn record_exclusive_action(&mut self) -> Result<(), Error> {
        if self.complete {
            return Err(Error::InvalidMove(String::from(
                "turn is already complete",
            )));
        }
        if self.cards_drawn > 0 {
            return Err(Error::InvalidMove(String::from(
                "cannot take another action after drawing train cards this turn",
            )));
        }

        self.complete = true;
        Ok(())
    }

    /// Ends the turn regardless of progress. Used when a half-finished draw
    /// cannot continue, e.g. because no second card is left anywhere.
    pub fn force_complete(&mut self) {
        self.complete = true;
    }
}
