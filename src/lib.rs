//! Interactive orchestration core for a pass-and-play chess client
//!
//! The rules live in an external engine reached through [`engine::ChessEngine`].
//! This crate turns pointer input into engine commands, keeps the cached
//! position and derived state (captured pieces, move quality, evaluation bar)
//! and suggests a best move in the background.
//!
//! - [`core`] - settings and their persistence
//! - [`engine`] - engine command interface, channel client, scripted backend
//! - [`game`] - board controller, evaluation history, best-move coordinator
//! - [`input`] - swipe-to-undo gesture recognition
//! - [`ui`] - evaluation bar scaling

pub mod core;
pub mod engine;
pub mod game;
pub mod input;
pub mod ui;
