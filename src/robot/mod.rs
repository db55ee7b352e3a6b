//! A greedy robot that plays one game to the end.
//!
//! Each iteration the robot records the digest of the current board, then
//! tries a fixed chain of strategies (see [`strategy`]). Strategies that have
//! more than one candidate move fork the board: the first candidate is
//! played, the others are pushed on the backtrack stack. Reaching a board
//! that was already visited, or running out of strategies, pops the stack.
//! The game is lost when the stack is empty.

mod strategy;

use crate::action::{Move, apply_move};
use crate::board::{Board, Digest, MoveError};

use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Play a waste card straight to its foundation when possible.
    pub waste_to_foundation: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            waste_to_foundation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Won,
    Lost,
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub won: bool,
    /// The winning board, or the last board reached before giving up.
    pub board: Board,
    pub iterations: u64,
    pub backtracks: u64,
    pub visited: usize,
}

impl Outcome {
    pub fn score(&self) -> u32 {
        self.board.score()
    }

    pub fn steps(&self) -> u32 {
        self.board.steps()
    }

    pub fn moves(&self) -> &[Move] {
        self.board.moves()
    }
}

#[derive(Debug, Clone)]
pub struct Robot {
    /// The board the search started from; every other board extends its
    /// move list.
    pub(crate) origin: Board,
    pub(crate) board: Board,
    pub(crate) step_backs: Vec<Board>,
    pub(crate) visited: FxHashSet<Digest>,
    pub(crate) config: RobotConfig,
    pub(crate) iterations: u64,
    pub(crate) backtracks: u64,
    status: Status,
}

impl Robot {
    pub fn new(board: Board) -> Self {
        Self::with_config(board, RobotConfig::default())
    }

    pub fn with_config(board: Board, config: RobotConfig) -> Self {
        Self {
            origin: board.clone(),
            board,
            step_backs: Vec::new(),
            visited: FxHashSet::default(),
            config,
            iterations: 0,
            backtracks: 0,
            status: Status::Running,
        }
    }

    pub(crate) fn from_parts(
        origin: Board,
        board: Board,
        step_backs: Vec<Board>,
        visited: FxHashSet<Digest>,
        config: RobotConfig,
        iterations: u64,
        backtracks: u64,
    ) -> Self {
        Self {
            origin,
            board,
            step_backs,
            visited,
            config,
            iterations,
            backtracks,
            status: Status::Running,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn origin(&self) -> &Board {
        &self.origin
    }

    /// Moves played on top of [`Robot::origin`] to reach the current board.
    pub fn moves_from_origin(&self) -> &[Move] {
        self.board
            .moves()
            .get(self.origin.moves().len()..)
            .unwrap_or_default()
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn backtrack_depth(&self) -> usize {
        self.step_backs.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Runs one iteration of the search.
    pub fn step(&mut self) -> Result<Status, MoveError> {
        if self.status != Status::Running {
            return Ok(self.status);
        }
        self.iterations += 1;

        if self.board.is_terminal() {
            info!(
                "win, score {}, step {}.",
                self.board.score(),
                self.board.steps()
            );
            self.status = Status::Won;
            return Ok(self.status);
        }

        if !self.visited.insert(self.board.digest()) {
            debug!("hit in visited states.");
            return Ok(self.step_back());
        }

        if strategy::advance(self)? {
            return Ok(Status::Running);
        }
        debug!("no more step.");
        Ok(self.step_back())
    }

    pub fn run(&mut self) -> Result<Outcome, MoveError> {
        self.run_with(|_| {})
    }

    /// Runs to the end, handing the board to `observer` after every
    /// iteration, the final one included.
    pub fn run_with<F: FnMut(&Board)>(&mut self, mut observer: F) -> Result<Outcome, MoveError> {
        while self.status == Status::Running {
            self.step()?;
            observer(&self.board);
        }
        Ok(self.outcome())
    }

    /// Like [`Robot::run_with`], sleeping `pause` before each render.
    pub fn run_paced<F: FnMut(&Board)>(
        &mut self,
        pause: Option<Duration>,
        mut render: F,
    ) -> Result<Outcome, MoveError> {
        self.run_with(|board| {
            if let Some(pause) = pause {
                std::thread::sleep(pause);
            }
            render(board)
        })
    }

    pub fn outcome(&self) -> Outcome {
        Outcome {
            won: self.status == Status::Won,
            board: self.board.clone(),
            iterations: self.iterations,
            backtracks: self.backtracks,
            visited: self.visited.len(),
        }
    }

    fn step_back(&mut self) -> Status {
        match self.step_backs.pop() {
            Some(board) => {
                self.board = board;
                self.backtracks += 1;
                debug!("step back, {} left.", self.step_backs.len());
                Status::Running
            }
            None => {
                info!(
                    "lost, score {}, step {}.",
                    self.board.score(),
                    self.board.steps()
                );
                self.status = Status::Lost;
                self.status
            }
        }
    }

    /// Plays the first candidate and keeps a forked board for each of the
    /// others, so the top of the stack is the next candidate in order.
    fn commit_candidates(&mut self, candidates: &[Move]) -> Result<bool, MoveError> {
        let Some((first, rest)) = candidates.split_first() else {
            return Ok(false);
        };
        for mv in rest.iter().rev() {
            let mut fork = self.board.clone();
            apply_move(&mut fork, mv)?;
            self.step_backs.push(fork);
        }
        apply_move(&mut self.board, first)?;
        Ok(true)
    }
}
