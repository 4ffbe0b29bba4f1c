use crate::card::TrainColor;
use crate::city::{same_connection, City, CityToCity};
use crate::error::Error;

use serde::{Deserialize, Serialize};

/// Index of a route in the board's route list. Stable for the lifetime of a
/// game, and the public handle clients use to designate routes.
pub type RouteId = usize;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 5;

/// Points awarded for claiming a route of the given length.
pub fn points_for_length(length: u8) -> u8 {
    match length {
        1 => 1,
        2 => 2,
        3 => 4,
        4 => 7,
        5 => 10,
        6 => 15,
        _ => unreachable!("no route is longer than 6"),
    }
}

/// Who holds a claimed route.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOwner {
    Player(usize),
    /// Closed without an owner. In games with two or three players, claiming
    /// one of two parallel routes shuts down the other.
    Blocked,
}

/// A single claimable connection between two adjacent cities.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Route {
    pub id: RouteId,
    pub cities: CityToCity,
    /// The train color required to claim this route. `Wild` means any color.
    pub color: TrainColor,
    pub length: u8,
    pub owner: Option<RouteOwner>,
}

impl Route {
    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.owner.is_some()
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.owner.is_none()
    }

    pub fn points(&self) -> u8 {
        points_for_length(self.length)
    }
}

/// The card composition of a valid claim, as verified by
/// [`Board::validate_claim`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    /// The single non-wild color used, if any.
    pub color: Option<TrainColor>,
    pub num_colored: u8,
    pub num_wild: u8,
}

/// A route in a player's possession. This is the shape stored in player state
/// and consumed by [`crate::connectivity`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClaimedRoute {
    pub id: RouteId,
    pub cities: CityToCity,
    pub length: u8,
}

/// Everything that happened when a claim settled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settlement {
    pub claimed: ClaimedRoute,
    pub points: u8,
    /// The parallel route that was shut down as a side effect, if any.
    pub blocked_route: Option<RouteId>,
}

macro_rules! route {
    ($start:ident, $end:ident, $length:literal, $color:ident) => {
        (
            (City::$start, City::$end),
            $length,
            TrainColor::$color,
        )
    };
}

/// The full route list of the map. Parallel routes appear as two consecutive
/// entries with the same city pair.
fn route_table() -> Vec<(CityToCity, u8, TrainColor)> {
    vec![
        route! {Atlanta, Charleston, 2, Wild},
        route! {Atlanta, Miami, 5, Blue},
        route! {Atlanta, Nashville, 1, Wild},
        route! {Atlanta, NewOrleans, 5, Orange},
        route! {Atlanta, NewOrleans, 5, Yellow},
        route! {Atlanta, Raleigh, 2, Wild},
        route! {Atlanta, Raleigh, 2, Wild},
        route! {Boston, Montreal, 2, Wild},
        route! {Boston, Montreal, 2, Wild},
        route! {Boston, NewYork, 2, Yellow},
        route! {Boston, NewYork, 2, Red},
        route! {Calgary, Helena, 4, Wild},
        route! {Calgary, Seattle, 4, Wild},
        route! {Calgary, Vancouver, 3, Wild},
        route! {Calgary, Winnipeg, 6, White},
        route! {Charleston, Miami, 4, Pink},
        route! {Charleston, Raleigh, 2, Wild},
        route! {Chicago, Duluth, 3, Red},
        route! {Chicago, Omaha, 4, Blue},
        route! {Chicago, Pittsburgh, 3, Black},
        route! {Chicago, Pittsburgh, 3, Orange},
        route! {Chicago, SaintLouis, 2, Green},
        route! {Chicago, SaintLouis, 2, White},
        route! {Chicago, Toronto, 4, White},
        route! {Dallas, ElPaso, 4, Red},
        route! {Dallas, Houston, 1, Wild},
        route! {Dallas, Houston, 1, Wild},
        route! {Dallas, LittleRock, 2, Wild},
        route! {Dallas, OklahomaCity, 2, Wild},
        route! {Dallas, OklahomaCity, 2, Wild},
        route! {Denver, Helena, 4, Green},
        route! {Denver, KansasCity, 4, Black},
        route! {Denver, KansasCity, 4, Orange},
        route! {Denver, OklahomaCity, 4, Red},
        route! {Denver, Omaha, 4, Pink},
        route! {Denver, Phoenix, 5, White},
        route! {Denver, SaltLakeCity, 3, Red},
        route! {Denver, SaltLakeCity, 3, Yellow},
        route! {Denver, SantaFe, 2, Wild},
        route! {Duluth, Helena, 6, Orange},
        route! {Duluth, Omaha, 2, Wild},
        route! {Duluth, Omaha, 2, Wild},
        route! {Duluth, SaultStMarie, 3, Wild},
        route! {Duluth, Toronto, 6, Pink},
        route! {Duluth, Winnipeg, 4, Black},
        route! {ElPaso, Houston, 6, Green},
        route! {ElPaso, LosAngeles, 6, Black},
        route! {ElPaso, OklahomaCity, 5, Yellow},
        route! {ElPaso, Phoenix, 3, Wild},
        route! {ElPaso, SantaFe, 2, Wild},
        route! {Helena, Omaha, 5, Red},
        route! {Helena, SaltLakeCity, 3, Pink},
        route! {Helena, Seattle, 6, Yellow},
        route! {Helena, Winnipeg, 4, Blue},
        route! {Houston, NewOrleans, 2, Wild},
        route! {KansasCity, SaintLouis, 2, Blue},
        route! {KansasCity, SaintLouis, 2, Pink},
        route! {KansasCity, OklahomaCity, 2, Wild},
        route! {KansasCity, OklahomaCity, 2, Wild},
        route! {KansasCity, Omaha, 1, Wild},
        route! {KansasCity, Omaha, 1, Wild},
        route! {LasVegas, LosAngeles, 2, Wild},
        route! {LasVegas, SaltLakeCity, 3, Orange},
        route! {LittleRock, Nashville, 3, White},
        route! {LittleRock, NewOrleans, 3, Wild},
        route! {LittleRock, OklahomaCity, 2, Wild},
        route! {LittleRock, SaintLouis, 2, Wild},
        route! {LosAngeles, Phoenix, 3, Wild},
        route! {LosAngeles, SanFrancisco, 3, Pink},
        route! {LosAngeles, SanFrancisco, 3, Yellow},
        route! {Miami, NewOrleans, 6, Red},
        route! {Montreal, NewYork, 3, Blue},
        route! {Montreal, SaultStMarie, 5, Black},
        route! {Montreal, Toronto, 3, Wild},
        route! {Nashville, Pittsburgh, 4, Yellow},
        route! {Nashville, Raleigh, 3, Black},
        route! {Nashville, SaintLouis, 2, Wild},
        route! {NewYork, Pittsburgh, 2, Green},
        route! {NewYork, Pittsburgh, 2, White},
        route! {NewYork, Washington, 2, Black},
        route! {NewYork, Washington, 2, Orange},
        route! {OklahomaCity, SantaFe, 3, Blue},
        route! {Phoenix, SantaFe, 3, Wild},
        route! {Pittsburgh, Raleigh, 2, Wild},
        route! {Pittsburgh, SaintLouis, 5, Green},
        route! {Pittsburgh, Toronto, 2, Wild},
        route! {Pittsburgh, Washington, 2, Wild},
        route! {Portland, SaltLakeCity, 6, Blue},
        route! {Portland, SanFrancisco, 5, Green},
        route! {Portland, SanFrancisco, 5, Pink},
        route! {Raleigh, Washington, 2, Wild},
        route! {Raleigh, Washington, 2, Wild},
        route! {SaltLakeCity, SanFrancisco, 5, Orange},
        route! {SaltLakeCity, SanFrancisco, 5, White},
        route! {SaultStMarie, Toronto, 2, Wild},
        route! {SaultStMarie, Winnipeg, 6, Wild},
        route! {Seattle, Portland, 1, Wild},
        route! {Seattle, Portland, 1, Wild},
        route! {Seattle, Vancouver, 1, Wild},
        route! {Seattle, Vancouver, 1, Wild},
    ]
}

/// The game map: the fixed route list plus per-game claim state.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Board {
    routes: Vec<Route>,
    /// For each route, the id of its parallel twin, if it has one.
    partners: Vec<Option<RouteId>>,
    /// With two or three players, only one of two parallel routes may be used.
    route_blocking: bool,
}

impl Board {
    pub fn new(num_players: usize) -> Result<Self, Error> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            return Err(Error::InvalidMove(format!(
                "games support {} to {} players, got {}",
                MIN_PLAYERS, MAX_PLAYERS, num_players
            )));
        }

        let routes: Vec<Route> = route_table()
            .into_iter()
            .enumerate()
            .map(|(id, (cities, length, color))| Route {
                id,
                cities,
                color,
                length,
                owner: None,
            })
            .collect();

        let mut partners = vec![None; routes.len()];
        for route in &routes {
            for other in &routes {
                if other.id != route.id && same_connection(route.cities, other.cities) {
                    partners[route.id] = Some(other.id);
                }
            }
        }

        Ok(Self {
            routes,
            partners,
            route_blocking: num_players <= 3,
        })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, route_id: RouteId) -> Result<&Route, Error> {
        self.routes
            .get(route_id)
            .ok_or(Error::RouteNotFound(route_id))
    }

    /// The parallel twin of the given route, if any.
    pub fn partner(&self, route_id: RouteId) -> Option<RouteId> {
        self.partners.get(route_id).copied().flatten()
    }

    /// Checks the rules of a claim and works out the payment, without touching
    /// any state. Returns a user error describing the first violated rule.
    pub fn validate_claim(
        &self,
        route_id: RouteId,
        cards: &[TrainColor],
        player_id: usize,
    ) -> Result<Payment, Error> {
        let route = self.get(route_id)?;

        match route.owner {
            Some(RouteOwner::Player(owner)) => {
                return Err(Error::InvalidMove(format!(
                    "route between {} and {} is already claimed by player {}",
                    route.cities.0, route.cities.1, owner
                )));
            }
            Some(RouteOwner::Blocked) => {
                return Err(Error::InvalidMove(format!(
                    "route between {} and {} is blocked",
                    route.cities.0, route.cities.1
                )));
            }
            None => {}
        }

        // A player may never hold both routes of a parallel pair. With two or
        // three players the twin is blocked at settlement, so this check only
        // bites in larger games.
        if let Some(partner_id) = self.partner(route_id) {
            if self.routes[partner_id].owner == Some(RouteOwner::Player(player_id)) {
                return Err(Error::InvalidMove(format!(
                    "player {} already claimed the parallel route between {} and {}",
                    player_id, route.cities.0, route.cities.1
                )));
            }
        }

        if cards.len() != route.length as usize {
            return Err(Error::InvalidMove(format!(
                "route between {} and {} requires {} cards, got {}",
                route.cities.0,
                route.cities.1,
                route.length,
                cards.len()
            )));
        }

        let num_wild = cards.iter().filter(|card| card.is_wild()).count() as u8;
        let mut color = None;
        for card in cards.iter().filter(|card| card.is_not_wild()) {
            match color {
                None => color = Some(*card),
                Some(chosen) if chosen != *card => {
                    return Err(Error::InvalidMove(format!(
                        "cards mix two colors ({} and {}); all non-wild cards must match",
                        chosen, card
                    )));
                }
                Some(_) => {}
            }
        }

        if route.color.is_not_wild() {
            if let Some(chosen) = color {
                if chosen != route.color {
                    return Err(Error::InvalidMove(format!(
                        "route between {} and {} requires {} cards, got {}",
                        route.cities.0, route.cities.1, route.color, chosen
                    )));
                }
            }
        }

        Ok(Payment {
            color,
            num_colored: cards.len() as u8 - num_wild,
            num_wild,
        })
    }

    /// Marks the route as owned by the player, blocking its parallel twin when
    /// the player count calls for it. Callers must have validated the claim
    /// first; settling an unavailable route is an internal contradiction.
    pub fn settle_claim(
        &mut self,
        route_id: RouteId,
        player_id: usize,
    ) -> Result<Settlement, Error> {
        let route = self.get(route_id)?;
        if route.is_claimed() {
            log::error!(
                "settling route {} which is already {:?}",
                route_id,
                route.owner
            );
            return Err(Error::Inconsistent(format!(
                "route {} is not open for settlement",
                route_id
            )));
        }

        let claimed = ClaimedRoute {
            id: route.id,
            cities: route.cities,
            length: route.length,
        };
        let points = route.points();

        self.routes[route_id].owner = Some(RouteOwner::Player(player_id));

        let mut blocked_route = None;
        if self.route_blocking {
            if let Some(partner_id) = self.partner(route_id) {
                if self.routes[partner_id].is_open() {
                    self.routes[partner_id].owner = Some(RouteOwner::Blocked);
                    blocked_route = Some(partner_id);
                }
            }
        }

        Ok(Settlement {
            claimed,
            points,
            blocked_route,
        })
    }

    /// Whether the player could legally claim this route, cards aside.
    pub fn is_claimable_by(&self, route_id: RouteId, player_id: usize) -> bool {
        let route = match self.routes.get(route_id) {
            Some(route) => route,
            None => return false,
        };

        if route.is_claimed() {
            return false;
        }

        match self.partner(route_id) {
            Some(partner_id) => {
                self.routes[partner_id].owner != Some(RouteOwner::Player(player_id))
            }
            None => true,
        }
    }
}
