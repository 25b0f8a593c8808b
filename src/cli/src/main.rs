use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Report, WrapErr, eyre};
use env_logger::TimestampPrecision;
use log::{LevelFilter, info};
use twophase::{
    MoveSequence, SolveOutcome, SolverConfig, TableCache,
    cache::TableOrigin,
    coord::MoveTables,
    cubie::CubieCube,
    facelet,
    pruning::TableId,
    solve,
};

/// Solves the 3x3 Rubik's cube with Kociemba's two-phase algorithm
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a cube given as 54 facelets in URFDLB order.
    Solve {
        facelets: String,
        /// Solve to this facelet string instead of the solved cube.
        #[arg(long, short)]
        pattern: Option<String>,
        /// Read the facelets as arbitrary colours named by their centers.
        #[arg(long)]
        colors: bool,
        /// Solver settings in TOML format. Flags take precedence.
        #[arg(long, short = 'c', value_name = "CONFIG")]
        config: Option<PathBuf>,
        #[arg(long)]
        max_depth: Option<u8>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Keep improving until a solution at most this long is found.
        #[arg(long)]
        target_length: Option<u8>,
        /// Print a `.` between the phase 1 and phase 2 moves.
        #[arg(long)]
        separator: bool,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Print the facelets of the cube reached by a move sequence, e.g.
    /// "R U' F2".
    Scramble { sequence: String },
    /// Print the facelets of a uniformly random cube.
    Random {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Build the pruning tables and store them in the cache directory.
    Tables {
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .format_timestamp(Some(TimestampPrecision::Millis))
        .init();

    match cli.command {
        Commands::Solve {
            facelets,
            pattern,
            colors,
            config,
            max_depth,
            timeout_ms,
            target_length,
            separator,
            cache_dir,
        } => {
            let mut config = match config {
                Some(path) => SolverConfig::from_file(&path)
                    .wrap_err_with(|| format!("Loading {}", path.display()))?,
                None => SolverConfig::default(),
            };
            if let Some(max_depth) = max_depth {
                config.max_depth = max_depth;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = timeout_ms;
            }
            if target_length.is_some() {
                config.target_length = target_length;
            }
            if cache_dir.is_some() {
                config.cache_dir = cache_dir;
            }
            config.use_separator |= separator;

            let (facelets, pattern) = if colors {
                (
                    facelet::normalize_colors(&facelets)?,
                    pattern
                        .map(|pattern| facelet::normalize_colors(&pattern))
                        .transpose()?,
                )
            } else {
                (facelets, pattern)
            };

            let cache = TableCache::shared(config.cache_dir());
            match solve(&facelets, pattern.as_deref(), &config, &cache)? {
                SolveOutcome::Solved(solution) => {
                    info!("Found a {} move solution", solution.len());
                    println!("{}", solution.format(config.use_separator));
                }
                SolveOutcome::TimedOut(Some(solution)) => {
                    eprintln!("Timed out; this solution may not be the shortest");
                    println!("{}", solution.format(config.use_separator));
                }
                SolveOutcome::TimedOut(None) => {
                    return Err(eyre!(
                        "No solution found within {}ms",
                        config.timeout_ms
                    ));
                }
                SolveOutcome::Unsolvable { max_depth } => {
                    return Err(eyre!("No solution exists within {max_depth} moves"));
                }
            }
        }
        Commands::Scramble { sequence } => {
            let moves = sequence.parse::<MoveSequence>()?;
            println!("{}", facelet::encode(&CubieCube::from_sequence(&moves)));
        }
        Commands::Random { seed } => {
            let mut rng = match seed {
                Some(seed) => fastrand::Rng::with_seed(seed),
                None => fastrand::Rng::new(),
            };
            println!("{}", facelet::encode(&CubieCube::random(&mut rng)));
        }
        Commands::Tables { cache_dir } => {
            let config = SolverConfig {
                cache_dir,
                ..SolverConfig::default()
            };
            let cache = TableCache::new(config.cache_dir());
            let moves = MoveTables::new();
            for id in TableId::ALL {
                let path = cache.path(id);
                match cache.get_or_build(id, &moves).1 {
                    TableOrigin::Cache => println!("{id}: up to date in {}", path.display()),
                    TableOrigin::Built => println!("{id}: written to {}", path.display()),
                    TableOrigin::BuiltUncached(err) => {
                        return Err(Report::new(err).wrap_err(format!("Could not cache {id}")));
                    }
                }
            }
        }
    }

    Ok(())
}
