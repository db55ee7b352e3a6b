use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use klondike_robot::{
    action::{Move, describe_move, format_moves, parse_moves},
    batch::{self, BatchConfig},
    board::Board,
    checkpoint,
    logger,
    replay::replay_with,
    robot::{Outcome, Robot, RobotConfig},
};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log more, repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Log less, repeat to silence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Deal and solve one game
    Solve(SolveArgs),
    /// Continue a game from a checkpoint
    Resume {
        /// Checkpoint written by a lost run
        #[arg(default_value = "dump.dat")]
        path: PathBuf,
        #[command(flatten)]
        show: ShowArgs,
        /// Replay a winning move list from the board the search started on
        #[arg(long)]
        replay: bool,
    },
    /// Replay move codes against a seeded deal
    Replay {
        #[arg(long)]
        seed: u64,
        #[command(flatten)]
        show: ShowArgs,
        /// Move codes such as `t; f2; p0,3`
        #[arg(required = true)]
        moves: Vec<String>,
    },
    /// Estimate the win rate over many games
    Batch {
        #[arg(short, long, default_value_t = 1000, value_name = "NUM")]
        count: usize,
        #[arg(short = 'j', long, default_value_t = 4, value_name = "NUM")]
        workers: usize,
        /// Base seed; random when omitted
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        no_waste_to_foundation: bool,
    },
}

#[derive(Args)]
struct SolveArgs {
    /// Seed of the deal; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    show: ShowArgs,
    /// Replay a winning move list from the initial deal
    #[arg(long)]
    replay: bool,
    /// Where to write the checkpoint of a lost game
    #[arg(long, default_value = "dump.dat")]
    dump: PathBuf,
    #[arg(long)]
    no_waste_to_foundation: bool,
}

#[derive(Args, Clone, Copy)]
struct ShowArgs {
    /// Print the board after every step
    #[arg(long)]
    show: bool,
    /// Delay between rendered steps
    #[arg(long, value_name = "MS")]
    pause: Option<u64>,
}

impl ShowArgs {
    fn pause(&self) -> Option<Duration> {
        self.pause.map(Duration::from_millis)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base = match cli.command {
        Commands::Batch { .. } => LevelFilter::Warn,
        _ => LevelFilter::Info,
    };
    logger::init(logger::level_from_flags(base, cli.verbose, cli.quiet))
        .context("Failed to install logger")?;

    match cli.command {
        Commands::Solve(args) => {
            let seed = args.seed.unwrap_or_else(rand::random);
            println!("Seed: {seed}");
            let config = RobotConfig {
                waste_to_foundation: !args.no_waste_to_foundation,
            };
            let mut robot = Robot::with_config(Board::new_from_seed(seed), config);
            let outcome = do_solve(&mut robot, args.show, &args.dump)?;
            if outcome.won && args.replay {
                play_back(&robot, args.show.pause())?;
            }
        }
        Commands::Resume { path, show, replay } => {
            let mut robot = checkpoint::read_from_path(&path)
                .with_context(|| format!("Failed to load checkpoint {}", path.display()))?;
            let outcome = do_solve(&mut robot, show, &path)?;
            if outcome.won && replay {
                play_back(&robot, show.pause())?;
            }
        }
        Commands::Replay { seed, show, moves } => {
            let moves = parse_moves(&moves.join(" "))?;
            let board = if show.show {
                show_moves(Board::new_from_seed(seed), &moves, show.pause())?
            } else {
                let mut board = Board::new_from_seed(seed);
                replay_with(&mut board, &moves, |_, _| {})?;
                board
            };
            println!("{}", board.pretty_print());
        }
        Commands::Batch {
            count,
            workers,
            seed,
            no_waste_to_foundation,
        } => {
            if workers == 0 {
                bail!("At least one worker is required.");
            }
            let config = BatchConfig {
                count,
                workers,
                seed: seed.unwrap_or_else(rand::random),
                robot: RobotConfig {
                    waste_to_foundation: !no_waste_to_foundation,
                },
            };
            let start = Instant::now();
            let report = batch::run(&config)?;
            println!(
                "Seed: {}, Games: {}, Wins: {}, Rate: {:.3}, Elapsed: {}",
                config.seed,
                report.games,
                report.wins,
                report.win_rate(),
                format_elapsed(start.elapsed())
            );
        }
    }

    Ok(())
}

fn do_solve(robot: &mut Robot, show: ShowArgs, dump: &Path) -> Result<Outcome> {
    let start = Instant::now();
    let outcome = if show.show {
        robot.run_paced(show.pause(), |board| println!("{}\n", board.pretty_print()))?
    } else {
        robot.run()?
    };
    let Outcome {
        won,
        iterations,
        backtracks,
        visited,
        ..
    } = outcome;
    let elapsed = format_elapsed(start.elapsed());
    let verdict = if won { "✓ Won" } else { "✗ Lost" };
    println!(
        "{verdict}. Score: {}, Steps: {}, Iterations: {iterations}, Backtracks: {backtracks}, States: {visited}, Elapsed: {elapsed}",
        outcome.score(),
        outcome.steps(),
    );

    if won {
        println!("\n===== MOVES =====\n{}", format_moves(outcome.moves()));
    } else {
        println!("\n===== STATE =====\n{}", outcome.board.pretty_print());
        checkpoint::write_to_path(dump, robot)
            .with_context(|| format!("Failed to write checkpoint {}", dump.display()))?;
        println!("\nCheckpoint written to {}", dump.display());
    }
    Ok(outcome)
}

/// Replays the robot's line from the board it started on.
fn play_back(robot: &Robot, pause: Option<Duration>) -> Result<Board> {
    show_moves(robot.origin().clone(), robot.moves_from_origin(), pause)
}

/// Replays `moves` from `board`, printing each move and the board after it.
fn show_moves(mut board: Board, moves: &[Move], pause: Option<Duration>) -> Result<Board> {
    let mut before = board.clone();
    replay_with(&mut board, moves, |after, mv| {
        if let Some(pause) = pause {
            std::thread::sleep(pause);
        }
        println!("{}\n{}\n", describe_move(&before, mv), after.pretty_print());
        before = after.clone();
    })?;
    Ok(board)
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 90 {
        let ms = elapsed.subsec_millis();
        format!("{secs}.{ms:03}s")
    } else {
        let minutes = secs / 60;
        let secs = secs % 60;
        format!("{minutes}m {secs}s")
    }
}
