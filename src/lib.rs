//! A greedy backtracking robot that plays Klondike solitaire.
//!
//! [`board::Board`] holds a game and its legal moves, [`robot::Robot`] searches
//! it with a fixed chain of heuristics and a stack of undo points.

pub mod action;
pub mod batch;
pub mod board;
pub mod card;
pub mod checkpoint;
pub mod logger;
pub mod replay;
pub mod robot;
