use crate::city::{City, CityToCity};
use crate::error::Error;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::iter::repeat;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Number of train cards in the face-up window.
pub const NUM_OPEN_CARDS: usize = 5;
const NUM_WILD_CARDS: usize = 14;
const NUM_CARDS_PER_COLOR: usize = 12;
const OPEN_WILD_CARD_LIMIT: usize = 3;
/// Number of destination tickets offered per draw.
pub const TICKETS_PER_DRAW: usize = 3;
/// Number of train cards dealt to each player at game start.
pub const INITIAL_HAND_SIZE: usize = 4;

/// Represents the different variants of train cards.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrainColor {
    Black,
    Blue,
    Green,
    Orange,
    Pink,
    Red,
    White,
    /// The locomotive: matches any color when paying for a route.
    Wild,
    Yellow,
}

impl TrainColor {
    /// Whether the current color is wild, i.e. matches with any color.
    ///
    /// # Examples:
    /// ```
    /// use rail_rules::card::TrainColor;
    ///
    /// assert!(!TrainColor::Green.is_wild());
    /// assert!(TrainColor::Wild.is_wild());
    /// ```
    #[inline]
    pub fn is_wild(&self) -> bool {
        *self == TrainColor::Wild
    }

    /// The opposite of `is_wild`.
    #[inline]
    pub fn is_not_wild(&self) -> bool {
        !self.is_wild()
    }
}

/// A destination ticket: connecting its two cities with claimed routes is worth
/// `points` at the end of the game, and failing to do so costs the same amount.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DestinationTicket {
    pub cities: CityToCity,
    pub points: u8,
}

/// Convenience macro to generate a destination ticket.
macro_rules! ticket {
    ($start:expr, $end:expr, $points:literal) => {
        DestinationTicket {
            cities: ($start, $end),
            points: $points,
        }
    };
}

/// Entity in charge of dealing, discarding and shuffling train cards and
/// destination tickets.
///
/// Train cards are conserved: every card is at all times in exactly one of the
/// closed pile, the discard pile, the open window, or a player's hand.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CardDealer {
    open_cards: SmallVec<[Option<TrainColor>; NUM_OPEN_CARDS]>,
    draw_pile: Vec<TrainColor>,
    discard_pile: Vec<TrainColor>,
    ticket_deck: VecDeque<DestinationTicket>,
    /// Drives every shuffle after construction, so a seeded dealer stays
    /// deterministic for its whole lifetime. Not persisted; a restored dealer
    /// reseeds from entropy.
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

impl CardDealer {
    /// Creates a new `CardDealer` with freshly shuffled decks and a valid open
    /// window (i.e. fewer than three wild cards visible).
    pub fn new() -> Self {
        Self::with_rng(&mut thread_rng())
    }

    /// Same as [`CardDealer::new`], but shuffles with the given generator.
    ///
    /// Randomness in the engine is confined to shuffling, so passing a seeded
    /// generator makes the initial decks fully deterministic.
    pub fn with_rng(rng: &mut impl Rng) -> Self {
        let mut rng = StdRng::seed_from_u64(rng.gen());
        let mut all_train_cards = Vec::with_capacity(110);

        for color in TrainColor::iter() {
            let num_cards = if color.is_wild() {
                NUM_WILD_CARDS
            } else {
                NUM_CARDS_PER_COLOR
            };
            all_train_cards.extend(repeat(color).take(num_cards));
        }

        all_train_cards.shuffle(&mut rng);

        let open_cards: SmallVec<_> = all_train_cards
            .iter()
            .take(NUM_OPEN_CARDS)
            .map(|color| Some(*color))
            .collect();
        let draw_pile: Vec<_> = all_train_cards
            .into_iter()
            .skip(NUM_OPEN_CARDS)
            .collect();

        let mut ticket_deck = Self::generate_tickets();
        ticket_deck.make_contiguous().shuffle(&mut rng);

        let mut dealer = Self {
            open_cards,
            draw_pile,
            discard_pile: Vec::new(),
            ticket_deck,
            rng,
        };

        dealer.maybe_reshuffle_open_cards();

        dealer
    }

    fn generate_tickets() -> VecDeque<DestinationTicket> {
        VecDeque::from([
            ticket! {City::Boston, City::Miami, 12},
            ticket! {City::Calgary, City::Phoenix, 13},
            ticket! {City::Calgary, City::SaltLakeCity, 7},
            ticket! {City::Chicago, City::NewOrleans, 7},
            ticket! {City::Chicago, City::SantaFe, 9},
            ticket! {City::Dallas, City::NewYork, 11},
            ticket! {City::Denver, City::ElPaso, 4},
            ticket! {City::Denver, City::Pittsburgh, 11},
            ticket! {City::Duluth, City::ElPaso, 10},
            ticket! {City::Duluth, City::Houston, 8},
            ticket! {City::Helena, City::LosAngeles, 8},
            ticket! {City::KansasCity, City::Houston, 5},
            ticket! {City::LosAngeles, City::Chicago, 16},
            ticket! {City::LosAngeles, City::Miami, 20},
            ticket! {City::LosAngeles, City::NewYork, 21},
            ticket! {City::Montreal, City::Atlanta, 9},
            ticket! {City::Montreal, City::NewOrleans, 13},
            ticket! {City::NewYork, City::Atlanta, 6},
            ticket! {City::Portland, City::Nashville, 17},
            ticket! {City::Portland, City::Phoenix, 11},
            ticket! {City::SanFrancisco, City::Atlanta, 17},
            ticket! {City::SaultStMarie, City::Nashville, 8},
            ticket! {City::SaultStMarie, City::OklahomaCity, 9},
            ticket! {City::Seattle, City::LosAngeles, 9},
            ticket! {City::Seattle, City::NewYork, 22},
            ticket! {City::Toronto, City::Miami, 10},
            ticket! {City::Vancouver, City::Montreal, 20},
            ticket! {City::Vancouver, City::SantaFe, 13},
            ticket! {City::Winnipeg, City::Houston, 12},
            ticket! {City::Winnipeg, City::LittleRock, 11},
        ])
    }

    /// Draws from the top of the closed pile.
    ///
    /// If the closed pile is empty, the discard pile is first shuffled back in
    /// as the new closed pile. Returns `None` only when both piles are empty,
    /// which callers must treat as a blocked draw rather than an error.
    pub fn draw_closed(&mut self) -> Option<TrainColor> {
        if self.draw_pile.is_empty() {
            self.swap_in_discard_pile();
        }

        self.draw_pile.pop()
    }

    fn swap_in_discard_pile(&mut self) {
        if self.discard_pile.is_empty() {
            return;
        }

        log::debug!(
            "closed pile is empty; shuffling {} discarded cards back in",
            self.discard_pile.len()
        );
        self.discard_pile.shuffle(&mut self.rng);
        std::mem::swap(&mut self.draw_pile, &mut self.discard_pile);
    }

    /// Looks up the open card at `index` without removing it.
    ///
    /// Errors if the index is out of bounds, or if the slot is empty (which
    /// only happens once the piles cannot refill the window).
    pub fn peek_open(&self, index: usize) -> Result<TrainColor, Error> {
        if index >= self.open_cards.len() {
            return Err(Error::InvalidMove(format!(
                "open card index {} is out of bounds (size {})",
                index,
                self.open_cards.len()
            )));
        }

        self.open_cards[index]
            .ok_or_else(|| Error::InvalidMove(format!("no open card at index {}", index)))
    }

    /// Draws the open card at `index`.
    ///
    /// The emptied slot is immediately refilled from the closed pile, after
    /// which the too-many-wild-cards rule is re-evaluated. The returned boolean
    /// indicates whether that rule fired and the window was redealt.
    pub fn draw_open(&mut self, index: usize) -> Result<(TrainColor, bool), Error> {
        let card = self.peek_open(index)?;

        self.open_cards[index] = self.draw_closed();

        Ok((card, self.maybe_reshuffle_open_cards()))
    }

    fn should_reshuffle_open_cards(&self) -> bool {
        let num_open_wild_cards = self
            .open_cards
            .iter()
            .flatten()
            .filter(|card| card.is_wild())
            .count();

        if num_open_wild_cards < OPEN_WILD_CARD_LIMIT {
            return false;
        }

        // Only reshuffle if at least three non-wild cards exist across all
        // piles and the window. Otherwise every fresh window would trigger the
        // rule again, and the reshuffle would never terminate.
        let num_non_wild_cards = self
            .open_cards
            .iter()
            .flatten()
            .chain(self.draw_pile.iter())
            .chain(self.discard_pile.iter())
            .filter(|card| card.is_not_wild())
            .count();

        num_non_wild_cards >= OPEN_WILD_CARD_LIMIT
    }

    /// Applies the reshuffle rule: whenever three or more wild cards are
    /// visible, the whole window is discarded and five fresh cards are dealt.
    /// The fresh window can trigger the rule again, hence the recursion.
    fn maybe_reshuffle_open_cards(&mut self) -> bool {
        if !self.should_reshuffle_open_cards() {
            return false;
        }

        log::debug!("open window holds too many wild cards; dealing a fresh window");

        let discarded: Vec<TrainColor> = self.open_cards.drain(..).flatten().collect();
        self.discard_pile.extend(discarded);

        for _ in 0..NUM_OPEN_CARDS {
            let refill = self.draw_closed();
            self.open_cards.push(refill);
        }

        self.maybe_reshuffle_open_cards();

        true
    }

    /// Adds the given train cards to the discard pile.
    pub fn discard(&mut self, cards: Vec<TrainColor>) {
        // Insertion order in the discard pile does not matter.
        self.discard_pile.extend(cards);
    }

    /// Draws up to `n` destination tickets from the top of the ticket deck.
    ///
    /// Returns fewer than `n` tickets if the deck is close to exhausted, and an
    /// empty vector if it is empty.
    pub fn draw_tickets(&mut self, n: usize) -> SmallVec<[DestinationTicket; TICKETS_PER_DRAW]> {
        let mut drawn = SmallVec::new();

        for _ in 0..n {
            match self.ticket_deck.pop_back() {
                Some(ticket) => drawn.push(ticket),
                None => break,
            }
        }

        drawn
    }

    /// Returns destination tickets to the *bottom* of the ticket deck.
    ///
    /// Returned tickets are not shuffled back in: players cycling through the
    /// whole deck will see them again in the order they were returned.
    pub fn return_tickets(&mut self, tickets: impl IntoIterator<Item = DestinationTicket>) {
        for ticket in tickets {
            self.ticket_deck.push_front(ticket);
        }
    }

    /// The deal performed once per player at game start: a starting hand of
    /// train cards plus the initial ticket-choice set.
    pub fn initial_deal(
        &mut self,
    ) -> (
        [TrainColor; INITIAL_HAND_SIZE],
        SmallVec<[DestinationTicket; TICKETS_PER_DRAW]>,
    ) {
        // Safe to unwrap: with at most five players, the initial deals cannot
        // come close to exhausting a fresh 110-card deck.
        (
            array_init::array_init(|_| self.draw_closed().unwrap()),
            self.draw_tickets(TICKETS_PER_DRAW),
        )
    }

    /// Accessor to the open window. Empty slots are `None`.
    pub fn open_cards(&self) -> &[Option<TrainColor>] {
        &self.open_cards
    }

    /// Whether any train card can still be drawn, from any location.
    pub fn can_draw_any_train_card(&self) -> bool {
        !self.draw_pile.is_empty()
            || !self.discard_pile.is_empty()
            || self.open_cards.iter().any(|card| card.is_some())
    }

    /// Whether a player who has already drawn once this turn can draw again.
    ///
    /// A wild card is never a legal second draw, so this holds only if a
    /// non-wild card remains somewhere: in the window, or in a pile that the
    /// closed draw could surface.
    pub fn can_draw_again(&self) -> bool {
        !self.draw_pile.is_empty()
            || !self.discard_pile.is_empty()
            || self
                .open_cards
                .iter()
                .flatten()
                .any(|card| card.is_not_wild())
    }

    /// Whether the ticket deck still holds tickets.
    pub fn has_tickets(&self) -> bool {
        !self.ticket_deck.is_empty()
    }

    /// Total number of train cards currently held by the dealer (closed pile,
    /// discard pile, and open window). Together with the players' hand sizes,
    /// this must always add up to the deck's initial 110 cards.
    pub fn train_card_count(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.open_cards.iter().flatten().count()
    }

    /// Mutable accessor to the open window.
    ///
    /// Should only be used for testing!
    pub fn get_mut_open_cards(&mut self) -> &mut SmallVec<[Option<TrainColor>; NUM_OPEN_CARDS]> {
        &mut self.open_cards
    }

    /// Mutable accessor to the closed pile.
    ///
    /// Should only be used for testing!
    pub fn get_mut_draw_pile(&mut self) -> &mut Vec<TrainColor> {
        &mut self.draw_pile
    }

    /// Accessor to the discard pile.
    ///
    /// Should only be used for testing!
    pub fn get_discard_pile(&self) -> &Vec<TrainColor> {
        &self.discard_pile
    }

    /// Mutable accessor to the discard pile.
    ///
    /// Should only be used for testing!
    pub fn get_mut_discard_pile(&mut self) -> &mut Vec<TrainColor> {
        &mut self.discard_pile
    }

    /// Accessor to the ticket deck.
    ///
    /// Should only be used for testing!
    pub fn get_ticket_deck(&self) -> &VecDeque<DestinationTicket> {
        &self.ticket_deck
    }

    /// Mutable accessor to the ticket deck.
    ///
    /// Should only be used for testing!
    pub fn get_mut_ticket_deck(&mut self) -> &mut VecDeque<DestinationTicket> {
        &mut self.ticket_deck
    }
}

impl Default for CardDealer {
    fn default() -> Self {
        Self::new()
    }
}
