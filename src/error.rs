use thiserror::Error;
use uuid::Uuid;

/// The error taxonomy of the engine.
///
/// Three categories matter to callers, and the transport layer is expected to
/// map them to different response classes:
///
/// * Not-found errors ([`Error::is_not_found`]): an identifier did not resolve.
/// * User errors ([`Error::is_user_error`]): the request was understood but the
///   rules reject it. The game state is left untouched.
/// * Fatal errors ([`Error::is_fatal`]): the engine detected an internal
///   contradiction (e.g. a hand missing cards that validation claimed were
///   present). These are programming errors and must not be retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("game `{0}` not found")]
    GameNotFound(Uuid),
    #[error("player {0} not found")]
    PlayerNotFound(usize),
    #[error("route {0} not found")]
    RouteNotFound(usize),
    #[error("{0}")]
    InvalidMove(String),
    /// Both the closed pile and the discard pile are empty. This is a
    /// legal-but-blocked state rather than a rule violation, but it is surfaced
    /// as its own variant so callers can check for it explicitly.
    #[error("there are no train cards left to draw")]
    DeckExhausted,
    #[error("cannot draw from the destination ticket deck, as it is empty")]
    TicketDeckExhausted,
    #[error("inconsistent game state: {0}")]
    Inconsistent(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::GameNotFound(_) | Error::PlayerNotFound(_) | Error::RouteNotFound(_)
        )
    }

    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMove(_) | Error::DeckExhausted | Error::TicketDeckExhausted
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Inconsistent(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
