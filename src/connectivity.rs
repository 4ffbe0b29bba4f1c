//! Graph queries over a player's claimed routes.
//!
//! Both queries treat the routes as an undirected multigraph: parallel claimed
//! routes (which cannot belong to one player) and cycles are handled, and
//! routes are never traversed twice within one path.

use crate::board::{ClaimedRoute, RouteId};
use crate::city::City;

use std::collections::{HashMap, HashSet, VecDeque};

fn adjacency(routes: &[ClaimedRoute]) -> HashMap<City, Vec<&ClaimedRoute>> {
    let mut adjacent: HashMap<City, Vec<&ClaimedRoute>> = HashMap::new();

    for route in routes {
        let (start, end) = route.cities;
        adjacent.entry(start).or_default().push(route);
        adjacent.entry(end).or_default().push(route);
    }

    adjacent
}

fn other_end(route: &ClaimedRoute, city: City) -> City {
    if route.cities.0 == city {
        route.cities.1
    } else {
        route.cities.0
    }
}

/// Whether the two cities are connected through the given claimed routes.
///
/// A city is trivially reachable from itself, even with no routes at all.
pub fn reachable(from: City, to: City, routes: &[ClaimedRoute]) -> bool {
    if from == to {
        return true;
    }

    let adjacent = adjacency(routes);
    let mut visited = HashSet::from([from]);
    let mut frontier = VecDeque::from([from]);

    while let Some(city) = frontier.pop_front() {
        for route in adjacent.get(&city).into_iter().flatten() {
            let neighbor = other_end(route, city);
            if neighbor == to {
                return true;
            }
            if visited.insert(neighbor) {
                frontier.push_back(neighbor);
            }
        }
    }

    false
}

/// Length of the longest continuous path through the claimed routes.
///
/// Each route counts at most once, but cities may be revisited. Zero routes
/// yield a length of zero.
pub fn longest_path(routes: &[ClaimedRoute]) -> u16 {
    longest_path_with_trace(routes).0
}

/// Same as [`longest_path`], but also returns the ids of the routes making up
/// one such path, in traversal order.
pub fn longest_path_with_trace(routes: &[ClaimedRoute]) -> (u16, Vec<RouteId>) {
    let adjacent = adjacency(routes);

    let mut best_length = 0;
    let mut best_trace = Vec::new();
    let mut used = HashSet::new();
    let mut path = Vec::new();

    // An optimal path can start at any city of the subgraph, so the search is
    // seeded from each of them.
    for city in adjacent.keys() {
        extend_path(
            *city,
            0,
            &adjacent,
            &mut used,
            &mut path,
            &mut best_length,
            &mut best_trace,
        );
    }

    (best_length, best_trace)
}

fn extend_path(
    city: City,
    length: u16,
    adjacent: &HashMap<City, Vec<&ClaimedRoute>>,
    used: &mut HashSet<RouteId>,
    path: &mut Vec<RouteId>,
    best_length: &mut u16,
    best_trace: &mut Vec<RouteId>,
) {
    if length > *best_length {
        *best_length = length;
        *best_trace = path.clone();
    }

    for route in adjacent.get(&city).into_iter().flatten() {
        if !used.insert(route.id) {
            continue;
        }
        path.push(route.id);

        extend_path(
            other_end(route, city),
            length + route.length as u16,
            adjacent,
            used,
            path,
            best_length,
            best_trace,
        );

        path.pop();
        used.remove(&route.id);
    }
}
