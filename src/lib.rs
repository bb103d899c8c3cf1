//! # Connect Four Online
//!
//! A Connect Four engine with a match orchestrator for local two-player
//! games, games against a negamax bot, and online games played through an
//! external matchmaking/move-relay service.
//!
//! ## Modules
//!
//! - [`game`]: board with gravity and win detection, players, game state machine
//! - [`ai`]: bot strategy trait, difficulty levels, negamax search
//! - [`net`]: the game service contract, a bot-backed loopback relay, a scripted double
//! - [`factory`]: board, player and game factories
//! - [`orchestrator`]: starts matches, applies moves, publishes move events
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod factory;
pub mod game;
pub mod net;
pub mod orchestrator;
