#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::too_many_lines)]

pub mod cache;
pub mod canonical_fsm;
pub mod config;
pub mod coord;
pub mod cubie;
pub mod facelet;
pub mod moves;
pub mod pattern;
pub mod pruning;
pub mod search;
pub mod search_stack;
pub mod solution;
pub mod solver;

pub use cache::TableCache;
pub use config::SolverConfig;
pub use moves::{Move, MoveSequence};
pub use solution::Solution;
pub use solver::{SolveError, SolveOutcome, solve, solve_to_notation};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}
