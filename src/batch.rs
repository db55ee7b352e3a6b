//! Win-rate estimation over many independent games.

use crate::board::{Board, MoveError};
use crate::robot::{Robot, RobotConfig};

use log::{info, warn};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub count: usize,
    pub workers: usize,
    /// Game `i` is dealt from seed `seed + i`.
    pub seed: u64,
    pub robot: RobotConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub games: usize,
    pub wins: usize,
}

impl BatchReport {
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.wins as f64 / self.games as f64
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Plays one freshly dealt game to the end.
pub fn play_seed(seed: u64, config: RobotConfig) -> Result<bool, MoveError> {
    let outcome = Robot::with_config(Board::new_from_seed(seed), config).run()?;
    Ok(outcome.won)
}

/// Plays `config.count` games on `config.workers` threads and counts wins.
pub fn run(config: &BatchConfig) -> Result<BatchReport, BatchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()?;
    let robot = config.robot;
    let seed = config.seed;

    let wins = pool.install(|| {
        (0..config.count)
            .into_par_iter()
            .map(|i| -> Result<usize, MoveError> {
                let game_seed = seed.wrapping_add(i as u64);
                let won = play_seed(game_seed, robot).inspect_err(|err| {
                    warn!("game with seed {game_seed} failed: {err}");
                })?;
                Ok(usize::from(won))
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    })?;

    let report = BatchReport {
        games: config.count,
        wins,
    };
    info!(
        "{} of {} games won ({:.3})",
        report.wins,
        report.games,
        report.win_rate()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_is_deterministic() {
        let config = BatchConfig {
            count: 12,
            workers: 3,
            seed: 100,
            robot: RobotConfig::default(),
        };
        let report = run(&config).unwrap();
        assert_eq!(report.games, 12);
        assert!(report.wins <= 12);

        let sequential = (100..112)
            .filter(|&seed| play_seed(seed, RobotConfig::default()).unwrap())
            .count();
        assert_eq!(report.wins, sequential);
        assert_eq!(run(&BatchConfig { workers: 1, ..config }).unwrap(), report);
    }

    #[test]
    fn test_empty_batch() {
        let config = BatchConfig {
            count: 0,
            workers: 2,
            seed: 0,
            robot: RobotConfig::default(),
        };
        let report = run(&config).unwrap();
        assert_eq!(report.games, 0);
        assert_eq!(report.win_rate(), 0.0);
    }
}
