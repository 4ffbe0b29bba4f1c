use crate::board::{Board, RouteId, Settlement, MAX_PLAYERS, MIN_PLAYERS};
use crate::card::{CardDealer, DestinationTicket, TrainColor, TICKETS_PER_DRAW};
use crate::endgame::EndGame;
use crate::error::Error;
use crate::player::{Player, PlayerSetup};
use crate::score::{self, Standings};
use crate::turn::TurnState;

use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use uuid::Uuid;

pub type GameId = Uuid;

/// How many of the initial ticket offer must be kept.
pub const MIN_INITIAL_TICKETS_KEPT: usize = 2;
/// How many of a mid-game ticket offer must be kept.
pub const MIN_PURCHASED_TICKETS_KEPT: usize = 1;

/// The lifecycle of a game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Players are deciding on their initial ticket offers.
    Starting,
    Playing,
    Finished,
}

/// One game of the route-claiming rules engine.
///
/// This aggregate owns all per-game state and is the only entry point for
/// player actions. Every operation validates before it mutates: a returned
/// user error guarantees the game state is unchanged. The hosting layer must
/// serialize calls per game; nothing here is `Sync`-aware.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Game {
    id: GameId,
    players: SmallVec<[Player; MAX_PLAYERS]>,
    board: Board,
    card_dealer: CardDealer,
    current_turn: usize,
    turn_state: TurnState,
    end_game: EndGame,
    phase: GamePhase,
}

impl Game {
    /// Creates a game for the given players, dealing every starting hand and
    /// ticket offer. Turn order follows registration order.
    pub fn new(setups: &[PlayerSetup]) -> Result<Self, Error> {
        Self::with_rng(setups, &mut thread_rng())
    }

    /// Same as [`Game::new`], but shuffles with the given generator.
    pub fn with_rng(setups: &[PlayerSetup], rng: &mut impl Rng) -> Result<Self, Error> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&setups.len()) {
            return Err(Error::InvalidMove(format!(
                "games support {} to {} players, got {}",
                MIN_PLAYERS,
                MAX_PLAYERS,
                setups.len()
            )));
        }

        let mut names = HashSet::new();
        let mut colors = HashSet::new();
        for setup in setups {
            if !names.insert(setup.name.as_str()) {
                return Err(Error::InvalidMove(format!(
                    "player name `{}` is taken",
                    setup.name
                )));
            }
            if !colors.insert(setup.color) {
                return Err(Error::InvalidMove(format!(
                    "player color `{}` is taken",
                    setup.color
                )));
            }
        }

        let board = Board::new(setups.len())?;
        let mut card_dealer = CardDealer::with_rng(rng);

        let players: SmallVec<[Player; MAX_PLAYERS]> = setups
            .iter()
            .enumerate()
            .map(|(id, setup)| {
                let mut player = Player::new(id, setup);
                let (hand, tickets) = card_dealer.initial_deal();
                player.receive_initial_deal(hand, tickets);
                player
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            players,
            board,
            card_dealer,
            current_turn: 0,
            turn_state: TurnState::new(),
            end_game: EndGame::new(),
            phase: GamePhase::Starting,
        })
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Index of the player whose turn it is. Only meaningful while playing.
    pub fn current_player(&self) -> usize {
        self.current_turn
    }

    /// Progress of the current turn (draws so far, wild draw, completion).
    pub fn turn_state(&self) -> &TurnState {
        &self.turn_state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn card_dealer(&self) -> &CardDealer {
        &self.card_dealer
    }

    /// Settles one player's initial ticket offer. At least two of the three
    /// tickets must be kept; the rest go back under the ticket deck. The game
    /// starts once every player has decided, with the first registered player
    /// to act.
    ///
    /// Returns how many tickets were kept and how many returned.
    pub fn choose_initial_tickets(
        &mut self,
        player_id: usize,
        keep: &[bool],
    ) -> Result<(usize, usize), Error> {
        if self.phase != GamePhase::Starting {
            return Err(Error::InvalidMove(String::from(
                "initial tickets have already been decided",
            )));
        }
        self.get_player(player_id)?;

        let returned = self.players[player_id]
            .resolve_pending_tickets(keep, MIN_INITIAL_TICKETS_KEPT)?;
        let kept = keep.len() - returned.len();
        self.card_dealer.return_tickets(returned);

        if self.players.iter().all(|player| !player.has_pending_tickets()) {
            log::debug!("game {}: all initial tickets chosen, starting", self.id);
            self.phase = GamePhase::Playing;
            self.current_turn = 0;
            self.turn_state.reset();
        }

        Ok((kept, keep.len() - kept))
    }

    /// Draws a card from the top of the closed pile into the player's hand.
    pub fn draw_closed_card(&mut self, player_id: usize) -> Result<TrainColor, Error> {
        self.ensure_playing_turn(player_id)?;
        self.ensure_no_pending_offer(player_id)?;
        self.turn_state.ensure_can_draw(false)?;

        let card = self.card_dealer.draw_closed().ok_or(Error::DeckExhausted)?;
        self.players[player_id].add_train_card(card);
        self.turn_state.record_draw(false)?;

        self.finish_draw_if_needed();
        Ok(card)
    }

    /// Draws the face-up card at `index` into the player's hand. A wild card
    /// is only legal as the first draw of the turn, and consumes the whole
    /// turn.
    pub fn draw_open_card(&mut self, player_id: usize, index: usize) -> Result<TrainColor, Error> {
        self.ensure_playing_turn(player_id)?;
        self.ensure_no_pending_offer(player_id)?;

        let card = self.card_dealer.peek_open(index)?;
        self.turn_state.ensure_can_draw(card.is_wild())?;

        let (card, _reshuffled) = self.card_dealer.draw_open(index)?;
        self.players[player_id].add_train_card(card);
        self.turn_state.record_draw(card.is_wild())?;

        self.finish_draw_if_needed();
        Ok(card)
    }

    /// Ends the turn after a draw if it is complete, or if no legal second
    /// draw exists anywhere.
    fn finish_draw_if_needed(&mut self) {
        if !self.turn_state.is_complete() && !self.card_dealer.can_draw_again() {
            log::debug!("game {}: no second draw available, ending the turn", self.id);
            self.turn_state.force_complete();
        }
        if self.turn_state.is_complete() {
            self.advance_turn();
        }
    }

    /// Claims a route: the given cards leave the player's hand for the discard
    /// pile, cars are placed, points awarded, and the turn ends. This is an
    /// exclusive action, rejected after any draw this turn.
    ///
    /// All rules are checked before anything changes; a user error leaves the
    /// game untouched.
    pub fn claim_route(
        &mut self,
        player_id: usize,
        route_id: RouteId,
        cards: Vec<TrainColor>,
    ) -> Result<Settlement, Error> {
        self.ensure_playing_turn(player_id)?;
        self.ensure_no_pending_offer(player_id)?;

        let route = self.board.get(route_id)?;
        let player = &self.players[player_id];
        if route.length > player.cars() {
            return Err(Error::InvalidMove(format!(
                "claiming this route requires {} cars, but only {} are left",
                route.length,
                player.cars()
            )));
        }
        if !player.can_afford(&cards) {
            return Err(Error::InvalidMove(String::from(
                "you do not hold all of those cards",
            )));
        }
        self.board.validate_claim(route_id, &cards, player_id)?;
        self.turn_state.record_exclusive_action()?;

        // Past this point every step must succeed; failures are internal
        // contradictions, not user errors.
        let settlement = self.board.settle_claim(route_id, player_id)?;
        let player = &mut self.players[player_id];
        player.remove_cards(&cards)?;
        player.spend_cars(settlement.claimed.length)?;
        player.add_route_points(settlement.points);
        player.record_claimed_route(settlement.claimed.clone());
        let cars_left = player.cars();
        self.card_dealer.discard(cards);

        self.end_game
            .maybe_trigger(player_id, cars_left, self.players.len());
        self.advance_turn();

        Ok(settlement)
    }

    /// Draws up to `count` destination tickets (capped at three) as an offer
    /// the player must then settle with [`Game::confirm_ticket_purchase`].
    /// This is an exclusive action, but the turn only ends at confirmation.
    pub fn preview_tickets(
        &mut self,
        player_id: usize,
        count: usize,
    ) -> Result<&[DestinationTicket], Error> {
        self.ensure_playing_turn(player_id)?;
        self.ensure_no_pending_offer(player_id)?;
        if count == 0 {
            return Err(Error::InvalidMove(String::from(
                "at least one ticket must be drawn",
            )));
        }
        if self.turn_state.is_drawing() || self.turn_state.is_complete() {
            return Err(Error::InvalidMove(String::from(
                "tickets can only be drawn as the only action of a turn",
            )));
        }

        let offer = self.card_dealer.draw_tickets(count.min(TICKETS_PER_DRAW));
        if offer.is_empty() {
            return Err(Error::TicketDeckExhausted);
        }

        self.players[player_id].set_reserved_tickets(offer);
        Ok(self.players[player_id].reserved_tickets())
    }

    /// Settles the pending ticket offer: at least one ticket must be kept, the
    /// rest go back under the deck, and the turn ends.
    ///
    /// Returns how many tickets the player kept.
    pub fn confirm_ticket_purchase(
        &mut self,
        player_id: usize,
        keep: &[bool],
    ) -> Result<usize, Error> {
        self.ensure_playing_turn(player_id)?;
        if !self.players[player_id].has_reserved_tickets() {
            return Err(Error::InvalidMove(String::from(
                "there is no ticket offer to decide on",
            )));
        }

        let returned = self.players[player_id]
            .resolve_reserved_tickets(keep, MIN_PURCHASED_TICKETS_KEPT)?;
        let kept = keep.len() - returned.len();
        self.card_dealer.return_tickets(returned);

        self.turn_state.record_exclusive_action()?;
        self.advance_turn();

        Ok(kept)
    }

    /// Gives up the rest of the turn. Not allowed while a ticket offer is
    /// pending. Returns the index of the next player to act.
    pub fn pass_turn(&mut self, player_id: usize) -> Result<usize, Error> {
        self.ensure_playing_turn(player_id)?;
        self.ensure_no_pending_offer(player_id)?;

        self.turn_state.force_complete();
        self.advance_turn();
        Ok(self.current_turn)
    }

    /// The final standings. Only available once the game is finished.
    pub fn final_score(&self) -> Result<Standings, Error> {
        if self.phase != GamePhase::Finished {
            return Err(Error::InvalidMove(String::from(
                "the game is not finished yet",
            )));
        }

        Ok(score::compute_standings(&self.players))
    }

    /// Ends the game on the spot, e.g. when the host abandons it.
    pub fn force_finish(&mut self) {
        self.end_game.force_finish();
        self.phase = GamePhase::Finished;
    }

    /// Moves on to the next player able to act, honoring the end-of-game
    /// countdown. If a full rotation finds nobody with a legal move, the game
    /// is finished early instead of looping forever.
    fn advance_turn(&mut self) {
        let num_players = self.players.len();
        let mut skipped = 0;

        loop {
            if self.end_game.begin_turn() {
                log::debug!("game {}: final turn played, game over", self.id);
                self.phase = GamePhase::Finished;
                return;
            }

            self.current_turn = (self.current_turn + 1) % num_players;
            self.turn_state.reset();

            if self.can_act(self.current_turn) {
                return;
            }

            log::debug!(
                "game {}: player {} has no legal move, skipping",
                self.id,
                self.current_turn
            );
            skipped += 1;
            if skipped == num_players {
                log::debug!("game {}: nobody has a legal move, game over", self.id);
                self.end_game.force_finish();
                self.phase = GamePhase::Finished;
                return;
            }
        }
    }

    /// Whether the player has any legal move at all.
    fn can_act(&self, player_id: usize) -> bool {
        if self.card_dealer.can_draw_any_train_card() || self.card_dealer.has_tickets() {
            return true;
        }

        let player = &self.players[player_id];
        self.board.routes().iter().any(|route| {
            self.board.is_claimable_by(route.id, player_id) && player.can_pay_for_route(route)
        })
    }

    fn get_player(&self, player_id: usize) -> Result<&Player, Error> {
        self.players
            .get(player_id)
            .ok_or(Error::PlayerNotFound(player_id))
    }

    fn ensure_playing_turn(&self, player_id: usize) -> Result<(), Error> {
        self.get_player(player_id)?;

        match self.phase {
            GamePhase::Starting => Err(Error::InvalidMove(String::from(
                "the game has not started yet",
            ))),
            GamePhase::Finished => Err(Error::InvalidMove(String::from("the game is over"))),
            GamePhase::Playing if self.current_turn != player_id => {
                Err(Error::InvalidMove(String::from("it is not your turn")))
            }
            GamePhase::Playing => Ok(()),
        }
    }

    fn ensure_no_pending_offer(&self, player_id: usize) -> Result<(), Error> {
        if self.players[player_id].has_reserved_tickets() {
            return Err(Error::InvalidMove(String::from(
                "decide on your pending ticket offer first",
            )));
        }

        Ok(())
    }

    /// Mutable accessor to the card dealer.
    ///
    /// Should only be used for testing!
    pub fn get_mut_card_dealer(&mut self) -> &mut CardDealer {
        &mut self.card_dealer
    }

    /// Mutable accessor to a player.
    ///
    /// Should only be used for testing!
    pub fn get_mut_player(&mut self, player_id: usize) -> &mut Player {
        &mut self.players[player_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::RouteOwner;
    use crate::city::{same_connection, City, CityToCity};
    use crate::player::{PlayerColor, NUM_OF_CARS};

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOTAL_TRAIN_CARDS: usize = 110;

    fn setups(num_players: usize) -> Vec<PlayerSetup> {
        let colors = [
            PlayerColor::Red,
            PlayerColor::Blue,
            PlayerColor::Green,
            PlayerColor::Yellow,
            PlayerColor::Black,
        ];

        (0..num_players)
            .map(|i| PlayerSetup {
                name: format!("player-{}", i),
                color: colors[i],
            })
            .collect()
    }

    fn new_game(num_players: usize) -> Game {
        Game::with_rng(&setups(num_players), &mut StdRng::seed_from_u64(42)).unwrap()
    }

    /// Settles everybody's initial offer, moving the game to `Playing`.
    fn start_game(game: &mut Game) {
        for player_id in 0..game.players().len() {
            game.choose_initial_tickets(player_id, &[true, true, false])
                .unwrap();
        }
        assert_eq!(game.phase(), GamePhase::Playing);
    }

    fn find_route(game: &Game, cities: CityToCity, color: TrainColor) -> RouteId {
        game.board()
            .routes()
            .iter()
            .find(|route| same_connection(route.cities, cities) && route.color == color)
            .map(|route| route.id)
            .unwrap()
    }

    /// Puts exactly the given cards in the player's hand.
    fn rig_hand(game: &mut Game, player_id: usize, cards: &[(TrainColor, u8)]) {
        let hand = game.get_mut_player(player_id).get_mut_train_cards();
        for count in hand.values_mut() {
            *count = 0;
        }
        for (color, count) in cards {
            hand.insert(*color, *count);
        }
    }

    fn total_train_cards(game: &Game) -> usize {
        game.card_dealer().train_card_count()
            + game
                .players()
                .iter()
                .map(|player| player.train_card_count())
                .sum::<usize>()
    }

    #[test]
    fn rejects_invalid_player_counts() {
        assert!(Game::new(&setups(1)).is_err());
        assert!(Game::new(&setups(2)).is_ok());
        assert!(Game::new(&setups(5)).is_ok());
    }

    #[test]
    fn rejects_duplicate_names_and_colors() {
        let mut duplicate_name = setups(3);
        duplicate_name[2].name = duplicate_name[0].name.clone();
        assert!(Game::new(&duplicate_name).is_err());

        let mut duplicate_color = setups(3);
        duplicate_color[2].color = duplicate_color[0].color;
        assert!(Game::new(&duplicate_color).is_err());
    }

    #[test]
    fn initial_deal_per_player() {
        let game = new_game(3);

        assert_eq!(game.phase(), GamePhase::Starting);
        for player in game.players() {
            assert_eq!(player.train_card_count(), 4);
            assert_eq!(player.pending_tickets().len(), 3);
            assert_eq!(player.cars(), NUM_OF_CARS);
        }
        assert_eq!(total_train_cards(&game), TOTAL_TRAIN_CARDS);
        assert_eq!(game.card_dealer().get_ticket_deck().len(), 30 - 3 * 3);
    }

    #[test]
    fn no_actions_before_the_game_starts() {
        let mut game = new_game(2);

        assert!(game.draw_closed_card(0).unwrap_err().is_user_error());
        assert!(game.pass_turn(0).unwrap_err().is_user_error());
        assert!(game.preview_tickets(0, 3).is_err());
    }

    #[test]
    fn initial_tickets_must_keep_at_least_two() {
        let mut game = new_game(2);

        assert!(game
            .choose_initial_tickets(0, &[true, false, false])
            .unwrap_err()
            .is_user_error());

        assert_eq!(
            game.choose_initial_tickets(0, &[true, true, false]).unwrap(),
            (2, 1)
        );
        assert_eq!(game.phase(), GamePhase::Starting);

        assert_eq!(
            game.choose_initial_tickets(1, &[true, true, true]).unwrap(),
            (3, 0)
        );
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.current_player(), 0);

        // One returned ticket went back under the deck.
        assert_eq!(game.card_dealer().get_ticket_deck().len(), 30 - 6 + 1);
    }

    #[test]
    fn choosing_initial_tickets_twice_is_rejected() {
        let mut game = new_game(2);

        game.choose_initial_tickets(0, &[true, true, false]).unwrap();
        assert!(game
            .choose_initial_tickets(0, &[true, true, false])
            .unwrap_err()
            .is_user_error());
    }

    #[test]
    fn two_closed_draws_make_a_turn() {
        let mut game = new_game(2);
        start_game(&mut game);

        let before = game.players()[0].train_card_count();
        game.draw_closed_card(0).unwrap();
        assert_eq!(game.current_player(), 0);

        game.draw_closed_card(0).unwrap();
        assert_eq!(game.players()[0].train_card_count(), before + 2);
        assert_eq!(game.current_player(), 1);
        assert_eq!(total_train_cards(&game), TOTAL_TRAIN_CARDS);
    }

    #[test]
    fn acting_out_of_turn_is_rejected() {
        let mut game = new_game(2);
        start_game(&mut game);

        let err = game.draw_closed_card(1).unwrap_err();
        assert_eq!(err, Error::InvalidMove(String::from("it is not your turn")));
        assert!(game.draw_closed_card(7).unwrap_err().is_not_found());
    }

    #[test]
    fn open_wild_card_only_as_first_draw() {
        let mut game = new_game(2);
        start_game(&mut game);
        *game.get_mut_card_dealer().get_mut_open_cards() = [
            Some(TrainColor::Wild),
            Some(TrainColor::Red),
            Some(TrainColor::Blue),
            Some(TrainColor::Green),
            Some(TrainColor::Black),
        ]
        .into();

        game.draw_open_card(0, 1).unwrap();
        assert!(game.draw_open_card(0, 0).unwrap_err().is_user_error());

        // A non-wild second draw still works and ends the turn.
        game.draw_open_card(0, 2).unwrap();
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn open_wild_card_consumes_the_turn() {
        let mut game = new_game(2);
        start_game(&mut game);
        game.get_mut_card_dealer().get_mut_open_cards()[0] = Some(TrainColor::Wild);

        assert_eq!(game.draw_open_card(0, 0).unwrap(), TrainColor::Wild);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn claiming_a_route_end_to_end() {
        let mut game = new_game(4);
        start_game(&mut game);
        let route_id = find_route(&game, (City::Chicago, City::Duluth), TrainColor::Red);
        rig_hand(&mut game, 0, &[(TrainColor::Red, 2), (TrainColor::Wild, 1)]);
        let dealt_cards = total_train_cards(&game);

        let settlement = game
            .claim_route(
                0,
                route_id,
                vec![TrainColor::Red, TrainColor::Red, TrainColor::Wild],
            )
            .unwrap();

        assert_eq!(settlement.points, 4);
        let player = &game.players()[0];
        assert_eq!(player.route_points(), 4);
        assert_eq!(player.cars(), NUM_OF_CARS - 3);
        assert_eq!(player.train_card_count(), 0);
        assert_eq!(player.claimed_routes().len(), 1);
        assert_eq!(
            game.board().get(route_id).unwrap().owner,
            Some(RouteOwner::Player(0))
        );

        // The payment went to the discard pile, nothing disappeared.
        assert_eq!(total_train_cards(&game), dealt_cards);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn claiming_without_the_cards_is_rejected() {
        let mut game = new_game(4);
        start_game(&mut game);
        let route_id = find_route(&game, (City::Chicago, City::Duluth), TrainColor::Red);
        rig_hand(&mut game, 0, &[(TrainColor::Red, 1)]);

        let err = game
            .claim_route(
                0,
                route_id,
                vec![TrainColor::Red, TrainColor::Red, TrainColor::Red],
            )
            .unwrap_err();
        assert!(err.is_user_error());

        // Nothing changed: still player 0's turn, hand intact, route open.
        assert_eq!(game.current_player(), 0);
        assert_eq!(game.players()[0].train_card_count(), 1);
        assert!(game.board().get(route_id).unwrap().is_open());
    }

    #[test]
    fn claiming_after_a_draw_is_rejected() {
        let mut game = new_game(4);
        start_game(&mut game);
        let route_id = find_route(&game, (City::Atlanta, City::Nashville), TrainColor::Wild);
        rig_hand(&mut game, 0, &[(TrainColor::Red, 5)]);

        game.draw_closed_card(0).unwrap();
        let err = game
            .claim_route(0, route_id, vec![TrainColor::Red])
            .unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn ticket_purchase_end_to_end() {
        let mut game = new_game(2);
        start_game(&mut game);
        let deck_before = game.card_dealer().get_ticket_deck().len();
        let tickets_before = game.players()[0].tickets().len();

        let offer = game.preview_tickets(0, 3).unwrap();
        assert_eq!(offer.len(), 3);

        // No other action while the offer is pending.
        assert!(game.draw_closed_card(0).unwrap_err().is_user_error());
        assert!(game.pass_turn(0).unwrap_err().is_user_error());

        assert_eq!(
            game.confirm_ticket_purchase(0, &[false, true, false]).unwrap(),
            1
        );
        assert_eq!(game.players()[0].tickets().len(), tickets_before + 1);
        assert_eq!(game.card_dealer().get_ticket_deck().len(), deck_before - 1);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn ticket_purchase_must_keep_one() {
        let mut game = new_game(2);
        start_game(&mut game);

        game.preview_tickets(0, 3).unwrap();
        assert!(game
            .confirm_ticket_purchase(0, &[false, false, false])
            .unwrap_err()
            .is_user_error());

        // The offer survives a rejected decision.
        assert!(game.players()[0].has_reserved_tickets());
        assert!(game
            .confirm_ticket_purchase(0, &[true, false, false])
            .is_ok());
    }

    #[test]
    fn ticket_preview_with_empty_deck() {
        let mut game = new_game(2);
        start_game(&mut game);
        game.get_mut_card_dealer().get_mut_ticket_deck().clear();

        assert_eq!(game.preview_tickets(0, 3), Err(Error::TicketDeckExhausted));
        // The failed preview did not consume the turn.
        assert!(game.draw_closed_card(0).is_ok());
    }

    #[test]
    fn tickets_after_a_draw_are_rejected() {
        let mut game = new_game(2);
        start_game(&mut game);

        game.draw_closed_card(0).unwrap();
        assert!(game.preview_tickets(0, 3).unwrap_err().is_user_error());
    }

    #[test]
    fn passing_moves_to_the_next_player() {
        let mut game = new_game(3);
        start_game(&mut game);

        assert_eq!(game.pass_turn(0).unwrap(), 1);
        assert_eq!(game.pass_turn(1).unwrap(), 2);
        assert_eq!(game.pass_turn(2).unwrap(), 0);
    }

    #[test]
    fn low_cars_trigger_the_final_round() {
        let mut game = new_game(2);
        start_game(&mut game);
        let route_id = find_route(&game, (City::Atlanta, City::Nashville), TrainColor::Wild);
        rig_hand(&mut game, 0, &[(TrainColor::Red, 1)]);
        *game.get_mut_player(0).get_mut_cars() = 3;

        game.claim_route(0, route_id, vec![TrainColor::Red]).unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);

        // Every player, the triggering one included, gets one more turn.
        game.pass_turn(1).unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        game.pass_turn(0).unwrap();
        assert_eq!(game.phase(), GamePhase::Finished);

        assert!(game.draw_closed_card(1).unwrap_err().is_user_error());
        assert!(game.final_score().is_ok());
    }

    #[test]
    fn final_score_requires_a_finished_game() {
        let mut game = new_game(2);
        start_game(&mut game);

        assert!(game.final_score().unwrap_err().is_user_error());

        game.force_finish();
        let standings = game.final_score().unwrap();
        assert_eq!(standings.scores.len(), 2);
    }

    #[test]
    fn final_score_includes_route_and_ticket_points() {
        let mut game = new_game(2);
        start_game(&mut game);
        let route_id = find_route(&game, (City::Chicago, City::Duluth), TrainColor::Red);
        rig_hand(&mut game, 0, &[(TrainColor::Red, 3)]);

        game.claim_route(
            0,
            route_id,
            vec![TrainColor::Red, TrainColor::Red, TrainColor::Red],
        )
        .unwrap();
        game.force_finish();

        let standings = game.final_score().unwrap();
        let claimer = &standings.scores[0];
        assert_eq!(claimer.route_points, 4);
        assert_eq!(claimer.longest_path, 3);
        assert!(claimer.has_longest_path_bonus);
        // Both players still hold their two initial tickets, uncompleted.
        assert_eq!(claimer.tickets.len(), 2);
        assert!(claimer.tickets.iter().all(|ticket| !ticket.completed));
    }

    #[test]
    fn game_ends_when_nobody_can_act() {
        let mut game = new_game(2);
        start_game(&mut game);

        // Strip the dealer and both hands of everything.
        let dealer = game.get_mut_card_dealer();
        dealer.get_mut_draw_pile().clear();
        dealer.get_mut_discard_pile().clear();
        *dealer.get_mut_open_cards() = [None, None, None, None, None].into();
        dealer.get_mut_ticket_deck().clear();
        rig_hand(&mut game, 0, &[]);
        rig_hand(&mut game, 1, &[]);

        game.pass_turn(0).unwrap();
        assert_eq!(game.phase(), GamePhase::Finished);
    }

    #[test]
    fn draw_with_empty_piles_is_rejected() {
        let mut game = new_game(2);
        start_game(&mut game);
        let dealer = game.get_mut_card_dealer();
        dealer.get_mut_draw_pile().clear();
        dealer.get_mut_discard_pile().clear();

        assert_eq!(game.draw_closed_card(0), Err(Error::DeckExhausted));
    }

    #[test]
    fn game_round_trips_through_json() -> serde_json::Result<()> {
        let mut game = new_game(3);
        start_game(&mut game);
        game.draw_closed_card(0).unwrap();

        let mut restored: Game = serde_json::from_str(&serde_json::to_string(&game)?)?;

        assert_eq!(restored.id(), game.id());
        assert_eq!(restored.phase(), game.phase());
        assert_eq!(restored.current_player(), game.current_player());
        assert_eq!(restored.players().len(), game.players().len());
        assert_eq!(
            restored.players()[0].train_card_count(),
            game.players()[0].train_card_count()
        );
        assert_eq!(total_train_cards(&restored), total_train_cards(&game));

        // Finishing both copies the same way yields the same standings.
        game.force_finish();
        restored.force_finish();
        assert_eq!(restored.final_score().unwrap(), game.final_score().unwrap());
        Ok(())
    }
}
