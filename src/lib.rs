//! Rules engine for a turn-based, route-claiming train board game.
//!
//! The engine is transport-agnostic: the [`game::Game`] aggregate exposes every
//! player action as a synchronous, in-memory operation, and the hosting layer is
//! expected to serialize actions per game (single writer per game). Persistence
//! goes through the [`repository::GameRepository`] trait.

pub mod board;
pub mod card;
pub mod city;
pub mod connectivity;
pub mod endgame;
pub mod error;
pub mod game;
pub mod player;
pub mod repository;
pub mod score;
pub mod turn;

#[macro_use]
extern crate smallvec;
