use crate::error::Error;
use crate::game::{Game, GameId};

use std::collections::HashMap;

/// Storage seam for games.
///
/// The engine never persists anything on its own; hosts load a game, apply
/// player actions, and save it back. Implementations only need to store and
/// retrieve whole games by id.
pub trait GameRepository {
    fn get(&self, id: &GameId) -> Result<Game, Error>;
    fn save(&mut self, game: &Game) -> Result<(), Error>;
    fn remove(&mut self, id: &GameId) -> Result<(), Error>;
}

/// A [`GameRepository`] holding games in memory as JSON documents.
///
/// Serializing on save keeps stored games fully detached from live ones, and
/// doubles as a guarantee that every game this repository ever held survives a
/// round trip through its wire format.
#[derive(Debug, Default)]
pub struct InMemoryGameRepository {
    games: HashMap<GameId, String>,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl GameRepository for InMemoryGameRepository {
    fn get(&self, id: &GameId) -> Result<Game, Error> {
        let document = self.games.get(id).ok_or(Error::GameNotFound(*id))?;
        serde_json::from_str(document).map_err(|err| Error::Storage(err.to_string()))
    }

    fn save(&mut self, game: &Game) -> Result<(), Error> {
        let document =
            serde_json::to_string(game).map_err(|err| Error::Storage(err.to_string()))?;
        self.games.insert(game.id(), document);
        Ok(())
    }

    fn remove(&mut self, id: &GameId) -> Result<(), Error> {
        self.games
            .remove(id)
            .map(|_| ())
            .ok_or(Error::GameNotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerColor, PlayerSetup};

    use pretty_assertions::assert_eq;

    fn test_game() -> Game {
        Game::new(&[
            PlayerSetup {
                name: String::from("ada"),
                color: PlayerColor::Red,
            },
            PlayerSetup {
                name: String::from("grace"),
                color: PlayerColor::Blue,
            },
        ])
        .unwrap()
    }

    #[test]
    fn saved_games_can_be_loaded() {
        let mut repository = InMemoryGameRepository::new();
        let game = test_game();

        repository.save(&game).unwrap();
        let loaded = repository.get(&game.id()).unwrap();

        assert_eq!(loaded.id(), game.id());
        assert_eq!(loaded.phase(), game.phase());
        assert_eq!(loaded.players().len(), 2);
    }

    #[test]
    fn saving_again_overwrites() {
        let mut repository = InMemoryGameRepository::new();
        let mut game = test_game();
        repository.save(&game).unwrap();

        game.choose_initial_tickets(0, &[true, true, false]).unwrap();
        repository.save(&game).unwrap();

        assert_eq!(repository.len(), 1);
        let loaded = repository.get(&game.id()).unwrap();
        assert!(!loaded.players()[0].has_pending_tickets());
    }

    #[test]
    fn unknown_games_are_not_found() {
        let repository = InMemoryGameRepository::new();
        let id = GameId::new_v4();

        assert_eq!(repository.get(&id).unwrap_err(), Error::GameNotFound(id));
    }

    #[test]
    fn removed_games_are_gone() {
        let mut repository = InMemoryGameRepository::new();
        let game = test_game();
        repository.save(&game).unwrap();

        repository.remove(&game.id()).unwrap();
        assert!(repository.is_empty());
        assert!(repository.get(&game.id()).unwrap_err().is_not_found());
        assert!(repository.remove(&game.id()).unwrap_err().is_not_found());
    }
}
