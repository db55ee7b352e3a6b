//! Replaying recorded move lists against a fresh deal.

use crate::action::{Move, ParseMoveError, apply_move, parse_moves};
use crate::board::{Board, MoveError};

use log::debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error(transparent)]
    Parse(#[from] ParseMoveError),
    #[error("move #{index} `{mv}` cannot be replayed: {source}")]
    Mismatch {
        index: usize,
        mv: Move,
        source: MoveError,
    },
}

/// Score and step counter right after a replayed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracePoint {
    pub score: u32,
    pub steps: u32,
}

/// Plays `moves` on `board` in order, calling `observer` after each one.
/// Stops at the first move that the board rejects. A `t` with nothing to
/// draw or recycle is rejected too, since the board never records one.
pub fn replay_with<F>(
    board: &mut Board,
    moves: &[Move],
    mut observer: F,
) -> Result<Vec<TracePoint>, ReplayError>
where
    F: FnMut(&Board, &Move),
{
    let mut trace = Vec::with_capacity(moves.len());
    for (index, mv) in moves.iter().enumerate() {
        let recorded = board.moves().len();
        let mismatch = |source| ReplayError::Mismatch {
            index,
            mv: *mv,
            source,
        };
        apply_move(board, mv).map_err(mismatch)?;
        if board.moves().len() == recorded {
            return Err(mismatch(MoveError::IllegalMove {
                mv: *mv,
                reason: "nothing to draw or recycle",
            }));
        }
        debug!("replayed {mv}");
        trace.push(TracePoint {
            score: board.score(),
            steps: board.steps(),
        });
        observer(board, mv);
    }
    Ok(trace)
}

pub fn replay(board: &mut Board, moves: &[Move]) -> Result<Vec<TracePoint>, ReplayError> {
    replay_with(board, moves, |_, _| {})
}

/// Parses move codes and replays them.
pub fn replay_codes(board: &mut Board, codes: &str) -> Result<Vec<TracePoint>, ReplayError> {
    let moves = parse_moves(codes)?;
    replay(board, &moves)
}
