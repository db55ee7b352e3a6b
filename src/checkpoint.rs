//! On-disk checkpoints of a running [`Robot`].
//!
//! A checkpoint file is the 4-byte magic `KLRB`, a little-endian `u16`
//! schema version, then a postcard-encoded [`CheckpointV1`]. The schema uses
//! plain card ids and move codes so it does not follow the in-memory layout
//! of [`Board`].

use std::fs;
use std::io;
use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::action::{Move, ParseMoveError};
use crate::board::{Board, Digest, TOTAL_TABLEAUS, Tableau};
use crate::card::Card;
use crate::robot::{Robot, RobotConfig};

pub const MAGIC: [u8; 4] = *b"KLRB";
pub const VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableauV1 {
    pub hidden: Vec<u8>,
    pub revealed: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardV1 {
    pub stock: Vec<u8>,
    pub waste: Vec<u8>,
    pub last_recycle: Vec<u8>,
    /// Top card id per suit.
    pub foundations: [Option<u8>; 4],
    pub tableaus: Vec<TableauV1>,
    pub score: u32,
    pub steps: u32,
    /// Move codes, see [`Move`].
    pub moves: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointV1 {
    pub config: RobotConfig,
    /// Board the search started from.
    pub origin: BoardV1,
    pub board: BoardV1,
    /// Most recent last.
    pub step_backs: Vec<BoardV1>,
    /// Sorted, so equal robots encode to equal bytes.
    pub visited: Vec<Digest>,
    pub iterations: u64,
    pub backtracks: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("not a checkpoint file")]
    BadMagic,
    #[error("unsupported checkpoint version {0}")]
    UnsupportedVersion(u16),
    #[error("invalid card id {0}")]
    InvalidCard(u8),
    #[error(transparent)]
    InvalidMove(#[from] ParseMoveError),
    #[error("checkpoint holds an invalid board")]
    InvalidBoard,
}

impl From<&Board> for BoardV1 {
    fn from(board: &Board) -> Self {
        let ids = |cards: &[Card]| cards.iter().map(Card::id).collect::<Vec<_>>();
        BoardV1 {
            stock: ids(&board.stock),
            waste: ids(&board.waste),
            last_recycle: ids(&board.last_recycle),
            foundations: board.foundations.map(|card| card.map(|c| c.id())),
            tableaus: board
                .tableaus
                .iter()
                .map(|t| TableauV1 {
                    hidden: ids(t.hidden()),
                    revealed: ids(t.revealed()),
                })
                .collect(),
            score: board.score,
            steps: board.steps,
            moves: board.moves.iter().map(Move::to_string).collect(),
        }
    }
}

impl TryFrom<&BoardV1> for Board {
    type Error = CheckpointError;

    fn try_from(v1: &BoardV1) -> Result<Self, Self::Error> {
        let cards = |ids: &[u8]| -> Result<Vec<Card>, CheckpointError> {
            ids.iter()
                .map(|&id| Card::from_id(id).ok_or(CheckpointError::InvalidCard(id)))
                .collect()
        };
        if v1.tableaus.len() != TOTAL_TABLEAUS {
            return Err(CheckpointError::InvalidBoard);
        }

        let mut board = Board::new();
        board.stock.extend(cards(&v1.stock)?);
        board.waste.extend(cards(&v1.waste)?);
        board.last_recycle.extend(cards(&v1.last_recycle)?);
        for (slot, id) in board.foundations.iter_mut().zip(v1.foundations) {
            *slot = id
                .map(|id| Card::from_id(id).ok_or(CheckpointError::InvalidCard(id)))
                .transpose()?;
        }
        for (tableau, t) in board.tableaus.iter_mut().zip(&v1.tableaus) {
            *tableau = Tableau::new(&cards(&t.hidden)?, &cards(&t.revealed)?);
        }
        board.score = v1.score;
        board.steps = v1.steps;
        board.moves = v1
            .moves
            .iter()
            .map(|code| code.parse::<Move>())
            .collect::<Result<_, _>>()?;

        let foundations_match_suits = board
            .foundations
            .iter()
            .enumerate()
            .all(|(i, card)| card.is_none_or(|c| c.suit().index() == i));
        if !foundations_match_suits || !board.is_valid() {
            return Err(CheckpointError::InvalidBoard);
        }
        Ok(board)
    }
}

impl From<&Robot> for CheckpointV1 {
    fn from(robot: &Robot) -> Self {
        let mut visited: Vec<Digest> = robot.visited.iter().cloned().collect();
        visited.sort_unstable();
        CheckpointV1 {
            config: robot.config,
            origin: (&robot.origin).into(),
            board: (&robot.board).into(),
            step_backs: robot.step_backs.iter().map(BoardV1::from).collect(),
            visited,
            iterations: robot.iterations,
            backtracks: robot.backtracks,
        }
    }
}

impl TryFrom<CheckpointV1> for Robot {
    type Error = CheckpointError;

    fn try_from(v1: CheckpointV1) -> Result<Self, Self::Error> {
        let origin = Board::try_from(&v1.origin)?;
        let board = Board::try_from(&v1.board)?;
        let step_backs = v1
            .step_backs
            .iter()
            .map(Board::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let extends_origin = |b: &Board| b.moves().starts_with(origin.moves());
        if !extends_origin(&board) || !step_backs.iter().all(extends_origin) {
            return Err(CheckpointError::InvalidBoard);
        }
        let visited: FxHashSet<Digest> = v1.visited.into_iter().collect();
        Ok(Robot::from_parts(
            origin,
            board,
            step_backs,
            visited,
            v1.config,
            v1.iterations,
            v1.backtracks,
        ))
    }
}

/// Encode a robot to checkpoint bytes.
pub fn to_bytes(robot: &Robot) -> Result<Vec<u8>, CheckpointError> {
    let body = postcard::to_allocvec(&CheckpointV1::from(robot))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a robot from checkpoint bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<Robot, CheckpointError> {
    if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
        return Err(CheckpointError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[MAGIC.len()], bytes[MAGIC.len() + 1]]);
    if version != VERSION {
        return Err(CheckpointError::UnsupportedVersion(version));
    }
    let v1: CheckpointV1 = postcard::from_bytes(&bytes[HEADER_LEN..])?;
    Robot::try_from(v1)
}

pub fn write_to_path<P: AsRef<Path>>(path: P, robot: &Robot) -> Result<(), CheckpointError> {
    let bytes = to_bytes(robot)?;
    fs::write(path, bytes)?;
    Ok(())
}

pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Robot, CheckpointError> {
    let bytes = fs::read(path)?;
    from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::replay;
    use crate::robot::Status;
    use tempfile::NamedTempFile;

    fn robot_after(seed: u64, iterations: usize) -> Robot {
        let mut robot = Robot::new(Board::new_from_seed(seed));
        for _ in 0..iterations {
            if robot.step().unwrap() != Status::Running {
                break;
            }
        }
        robot
    }

    #[test]
    fn test_board_round_trip() {
        let robot = robot_after(11, 60);
        let v1 = BoardV1::from(robot.board());
        let board = Board::try_from(&v1).unwrap();
        assert_eq!(&board, robot.board());
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        for seed in [2, 5, 9] {
            // No game can end within 20 iterations.
            let mut robot = robot_after(seed, 20);
            assert_eq!(robot.status(), Status::Running);
            let bytes = to_bytes(&robot).unwrap();
            let mut resumed = from_bytes(&bytes).unwrap();
            assert_eq!(to_bytes(&resumed).unwrap(), bytes);

            let expected = robot.run().unwrap();
            let actual = resumed.run().unwrap();
            assert_eq!(actual.won, expected.won);
            assert_eq!(actual.moves(), expected.moves());
            assert_eq!(actual.score(), expected.score());
            assert_eq!(actual.steps(), expected.steps());
            assert_eq!(actual.iterations, expected.iterations);
            assert_eq!(actual.backtracks, expected.backtracks);
        }
    }

    #[test]
    fn test_resumed_run_replays_from_origin() {
        let mut start = Board::new_from_seed(13);
        start.tune_card();
        let mut robot = Robot::new(start.clone());
        for _ in 0..20 {
            robot.step().unwrap();
        }
        let mut resumed = from_bytes(&to_bytes(&robot).unwrap()).unwrap();
        assert_eq!(resumed.origin(), &start);

        let outcome = resumed.run().unwrap();
        let mut replayed = resumed.origin().clone();
        replay(&mut replayed, resumed.moves_from_origin()).unwrap();
        assert_eq!(replayed.digest(), outcome.board.digest());
        assert_eq!(replayed.score(), outcome.score());
        assert_eq!(replayed.steps(), outcome.steps());
    }

    #[test]
    fn test_rejects_board_not_derived_from_origin() {
        let robot = robot_after(1, 5);
        let mut v1 = CheckpointV1::from(&robot);
        v1.origin.moves.push("f9".to_string());
        assert!(matches!(
            Robot::try_from(v1),
            Err(CheckpointError::InvalidBoard)
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let robot = robot_after(4, 40);
        let file = NamedTempFile::new().unwrap();
        write_to_path(file.path(), &robot).unwrap();
        let loaded = read_from_path(file.path()).unwrap();
        assert_eq!(loaded.board(), robot.board());
        assert_eq!(loaded.backtrack_depth(), robot.backtrack_depth());
        assert_eq!(loaded.visited_count(), robot.visited_count());
        assert_eq!(loaded.config(), robot.config());
    }

    #[test]
    fn test_rejects_bad_header() {
        let robot = robot_after(1, 5);
        let mut bytes = to_bytes(&robot).unwrap();
        assert!(matches!(from_bytes(&bytes[..3]), Err(CheckpointError::BadMagic)));
        bytes[4] = 9;
        assert!(matches!(
            from_bytes(&bytes),
            Err(CheckpointError::UnsupportedVersion(9))
        ));
        bytes[0] = b'X';
        assert!(matches!(from_bytes(&bytes), Err(CheckpointError::BadMagic)));
    }

    #[test]
    fn test_rejects_invalid_board() {
        let robot = robot_after(1, 5);
        let mut v1 = CheckpointV1::from(&robot);
        v1.board.stock.push(0);
        assert!(matches!(
            Robot::try_from(v1.clone()),
            Err(CheckpointError::InvalidBoard)
        ));
        v1.board.stock.pop();
        v1.board.stock.push(200);
        assert!(matches!(
            Robot::try_from(v1.clone()),
            Err(CheckpointError::InvalidCard(200))
        ));
        v1.board.stock.pop();
        v1.board.moves.push("x".to_string());
        assert!(matches!(
            Robot::try_from(v1),
            Err(CheckpointError::InvalidMove(_))
        ));
    }
}
