use crate::{
    cache::TableCache,
    config::{ConfigError, SolverConfig},
    cubie::CubieCube,
    facelet::{self, FaceletError},
    pattern::{self, PatternError},
    search::{SearchOutcome, TwoPhaseSearch},
    search_stack::FrameStackOverflow,
    solution::Solution,
};
use log::{debug, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("Invalid cube: {0}")]
    InvalidConfiguration(#[from] FaceletError),
    #[error("Invalid pattern: {0}")]
    PatternMismatch(#[source] FaceletError),
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] ConfigError),
    #[error("Time limit exceeded before any solution was found")]
    TimedOut,
    #[error("No solution exists within {max_depth} moves")]
    Unsolvable { max_depth: u8 },
    #[error(transparent)]
    SearchOverflow(#[from] FrameStackOverflow),
}

impl SolveError {
    /// A numeric code for this failure, compatible with the classic solver:
    /// 1 to 6 for invalid cubes, 7 for no solution within the depth and 8 for
    /// a timeout.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            SolveError::InvalidConfiguration(err) | SolveError::PatternMismatch(err) => err.code(),
            SolveError::Unsolvable { .. } => 7,
            SolveError::TimedOut => 8,
            SolveError::InvalidSettings(_) | SolveError::SearchOverflow(_) => 9,
        }
    }
}

impl From<PatternError> for SolveError {
    fn from(err: PatternError) -> Self {
        match err {
            PatternError::Facelets(err) => SolveError::InvalidConfiguration(err),
            PatternError::Pattern(err) => SolveError::PatternMismatch(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(Solution),
    /// The time limit passed. A solution found in time is included but may
    /// be longer than necessary.
    TimedOut(Option<Solution>),
    Unsolvable { max_depth: u8 },
}

/// Decodes `facelets`, rewrites it relative to `pattern` if one is given, and
/// searches for a solution.
///
/// # Errors
///
/// Fails if the settings are out of range or either string is not a valid
/// reachable cube.
pub fn solve(
    facelets: &str,
    pattern: Option<&str>,
    config: &SolverConfig,
    cache: &TableCache,
) -> Result<SolveOutcome, SolveError> {
    config.validate()?;

    let start = facelet::decode(facelets)?;
    let cube = match pattern {
        Some(pattern) => pattern::patternize_cube(&start, pattern)?,
        None => start,
    };
    debug!("Solving {}", facelet::encode(&cube));

    if cube == CubieCube::SOLVED {
        return Ok(SolveOutcome::Solved(Solution::new([], [])));
    }

    let search = TwoPhaseSearch::new(cache.tables(), config.search_limits());
    Ok(match search.solve(&cube)? {
        SearchOutcome::Solved(solution) => SolveOutcome::Solved(solution),
        SearchOutcome::TimedOut(solution) => {
            warn!(
                "Time limit of {}ms exceeded{}",
                config.timeout_ms,
                if solution.is_some() {
                    ", returning the best solution found"
                } else {
                    ""
                }
            );
            SolveOutcome::TimedOut(solution)
        }
        SearchOutcome::Exhausted => SolveOutcome::Unsolvable {
            max_depth: config.max_depth,
        },
    })
}

/// Like [`solve`], but renders the solution and treats every outcome without
/// one as an error.
///
/// # Errors
///
/// See [`solve`]. Additionally fails with [`SolveError::TimedOut`] or
/// [`SolveError::Unsolvable`] if no solution was found.
pub fn solve_to_notation(
    facelets: &str,
    pattern: Option<&str>,
    config: &SolverConfig,
    cache: &TableCache,
) -> Result<String, SolveError> {
    match solve(facelets, pattern, config, cache)? {
        SolveOutcome::Solved(solution) | SolveOutcome::TimedOut(Some(solution)) => {
            Ok(solution.format(config.use_separator))
        }
        SolveOutcome::TimedOut(None) => Err(SolveError::TimedOut),
        SolveOutcome::Unsolvable { max_depth } => Err(SolveError::Unsolvable { max_depth }),
    }
}
