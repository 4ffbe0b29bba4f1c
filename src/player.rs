use crate::board::{ClaimedRoute, Route};
use crate::card::{DestinationTicket, TrainColor, INITIAL_HAND_SIZE, TICKETS_PER_DRAW};
use crate::error::Error;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Number of cars (plastic trains) each player starts with.
pub const NUM_OF_CARS: u8 = 45;

/// Colors a player can embody. Distinct from [`TrainColor`], which has a wild
/// variant and no such thing as a wild player.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlayerColor {
    Black,
    Blue,
    Green,
    Orange,
    Pink,
    Red,
    White,
    Yellow,
}

/// The identity a player registers with before the game starts.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PlayerSetup {
    pub name: String,
    pub color: PlayerColor,
}

/// Everything one player owns: identity, hand, tickets, cars, and claimed
/// routes.
///
/// This type holds the mechanics of ownership; the rules deciding *when* any
/// of it may change live in [`crate::game::Game`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub id: usize,
    pub name: String,
    pub color: PlayerColor,
    /// Keyed over every color at all times, with zero counts for absent cards.
    train_cards: HashMap<TrainColor, u8>,
    /// Tickets committed to, scored at the end of the game.
    tickets: Vec<DestinationTicket>,
    /// The initial ticket offer, awaiting the keep-or-return decision.
    pending_tickets: SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
    /// A mid-game ticket offer, awaiting the keep-or-return decision.
    reserved_tickets: SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
    cars: u8,
    route_points: u8,
    claimed_routes: Vec<ClaimedRoute>,
}

impl Player {
    pub fn new(id: usize, setup: &PlayerSetup) -> Self {
        Self {
            id,
            name: setup.name.clone(),
            color: setup.color,
            train_cards: TrainColor::iter().map(|color| (color, 0)).collect(),
            tickets: Vec::new(),
            pending_tickets: smallvec![],
            reserved_tickets: smallvec![],
            cars: NUM_OF_CARS,
            route_points: 0,
            claimed_routes: Vec::new(),
        }
    }

    /// Hands the player their start-of-game cards and ticket offer.
    pub fn receive_initial_deal(
        &mut self,
        hand: [TrainColor; INITIAL_HAND_SIZE],
        tickets: SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
    ) {
        for card in hand {
            self.add_train_card(card);
        }
        self.pending_tickets = tickets;
    }

    pub fn add_train_card(&mut self, card: TrainColor) {
        *self.train_cards.entry(card).or_insert(0) += 1;
    }

    /// Whether the hand holds every one of the given cards, multiplicity
    /// included.
    pub fn can_afford(&self, cards: &[TrainColor]) -> bool {
        let mut needed: HashMap<TrainColor, u8> = HashMap::new();
        for card in cards {
            *needed.entry(*card).or_insert(0) += 1;
        }

        needed
            .iter()
            .all(|(color, count)| self.train_cards.get(color).copied().unwrap_or(0) >= *count)
    }

    /// Removes the given cards from the hand. Callers must have checked
    /// affordability first.
    pub fn remove_cards(&mut self, cards: &[TrainColor]) -> Result<(), Error> {
        if !self.can_afford(cards) {
            return Err(Error::Inconsistent(format!(
                "player {} does not hold all of {:?}",
                self.id, cards
            )));
        }

        for card in cards {
            if let Some(count) = self.train_cards.get_mut(card) {
                *count -= 1;
            }
        }

        Ok(())
    }

    pub fn cars(&self) -> u8 {
        self.cars
    }

    pub fn spend_cars(&mut self, num: u8) -> Result<(), Error> {
        if num > self.cars {
            return Err(Error::Inconsistent(format!(
                "player {} cannot place {} cars, only {} left",
                self.id, num, self.cars
            )));
        }

        self.cars -= num;
        Ok(())
    }

    pub fn route_points(&self) -> u8 {
        self.route_points
    }

    pub fn add_route_points(&mut self, points: u8) {
        self.route_points += points;
    }

    pub fn claimed_routes(&self) -> &[ClaimedRoute] {
        &self.claimed_routes
    }

    pub fn record_claimed_route(&mut self, route: ClaimedRoute) {
        self.claimed_routes.push(route);
    }

    pub fn tickets(&self) -> &[DestinationTicket] {
        &self.tickets
    }

    pub fn has_pending_tickets(&self) -> bool {
        !self.pending_tickets.is_empty()
    }

    pub fn pending_tickets(&self) -> &[DestinationTicket] {
        &self.pending_tickets
    }

    pub fn has_reserved_tickets(&self) -> bool {
        !self.reserved_tickets.is_empty()
    }

    pub fn reserved_tickets(&self) -> &[DestinationTicket] {
        &self.reserved_tickets
    }

    pub fn set_reserved_tickets(
        &mut self,
        tickets: SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
    ) {
        self.reserved_tickets = tickets;
    }

    /// Settles the initial ticket offer: kept tickets join the player's
    /// committed tickets, the rest are returned for the deck.
    pub fn resolve_pending_tickets(
        &mut self,
        keep: &[bool],
        min_keep: usize,
    ) -> Result<SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>, Error> {
        let offer = std::mem::take(&mut self.pending_tickets);
        match Self::split_ticket_offer(offer, keep, min_keep) {
            Ok((kept, returned)) => {
                self.tickets.extend(kept);
                Ok(returned)
            }
            Err((offer, error)) => {
                self.pending_tickets = offer;
                Err(error)
            }
        }
    }

    /// Settles a mid-game ticket offer, same contract as
    /// [`Player::resolve_pending_tickets`].
    pub fn resolve_reserved_tickets(
        &mut self,
        keep: &[bool],
        min_keep: usize,
    ) -> Result<SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>, Error> {
        let offer = std::mem::take(&mut self.reserved_tickets);
        match Self::split_ticket_offer(offer, keep, min_keep) {
            Ok((kept, returned)) => {
                self.tickets.extend(kept);
                Ok(returned)
            }
            Err((offer, error)) => {
                self.reserved_tickets = offer;
                Err(error)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn split_ticket_offer(
        offer: SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
        keep: &[bool],
        min_keep: usize,
    ) -> Result<
        (
            SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
            SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
        ),
        (SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>, Error),
    > {
        if offer.is_empty() {
            return Err((
                offer,
                Error::InvalidMove(String::from("no ticket offer to decide on")),
            ));
        }
        if keep.len() != offer.len() {
            let error = Error::InvalidMove(format!(
                "the offer holds {} tickets, but {} decisions were given",
                offer.len(),
                keep.len()
            ));
            return Err((offer, error));
        }
        if keep.iter().filter(|kept| **kept).count() < min_keep {
            let error = Error::InvalidMove(format!(
                "at least {} ticket(s) must be kept",
                min_keep
            ));
            return Err((offer, error));
        }

        let mut kept = smallvec![];
        let mut returned = smallvec![];
        for (ticket, keep_it) in offer.into_iter().zip(keep) {
            if *keep_it {
                kept.push(ticket);
            } else {
                returned.push(ticket);
            }
        }

        Ok((kept, returned))
    }

    /// Whether the hand could pay for the route at all, wilds included. Used
    /// to decide if a player still has a possible move.
    pub fn can_pay_for_route(&self, route: &Route) -> bool {
        if route.length > self.cars {
            return false;
        }

        let wilds = self.train_cards[&TrainColor::Wild];
        if route.color.is_not_wild() {
            return self.train_cards[&route.color] + wilds >= route.length;
        }

        TrainColor::iter()
            .filter(|color| color.is_not_wild())
            .any(|color| self.train_cards[&color] + wilds >= route.length)
    }

    /// Total number of train cards in the hand.
    pub fn train_card_count(&self) -> usize {
        self.train_cards.values().map(|count| *count as usize).sum()
    }

    /// Accessor to the hand.
    pub fn train_cards(&self) -> &HashMap<TrainColor, u8> {
        &self.train_cards
    }

    /// Mutable accessor to the hand.
    ///
    /// Should only be used for testing!
    pub fn get_mut_train_cards(&mut self) -> &mut HashMap<TrainColor, u8> {
        &mut self.train_cards
    }

    /// Mutable accessor to the car count.
    ///
    /// Should only be used for testing!
    pub fn get_mut_cars(&mut self) -> &mut u8 {
        &mut self.cars
    }
}
