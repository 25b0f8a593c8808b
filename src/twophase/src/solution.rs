use crate::moves::{Move, MoveSequence};
use itertools::Itertools;
use std::fmt::Display;

/// The token placed between the phase 1 and phase 2 moves.
pub const PHASE_SEPARATOR: &str = ".";

/// A solving sequence together with the point where phase 2 begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    moves: MoveSequence,
    phase1_len: usize,
}

impl Solution {
    #[must_use]
    pub fn new(phase1: impl IntoIterator<Item = Move>, phase2: impl IntoIterator<Item = Move>) -> Self {
        let mut moves = phase1.into_iter().collect_vec();
        let phase1_len = moves.len();
        moves.extend(phase2);
        Self {
            moves: MoveSequence(moves),
            phase1_len,
        }
    }

    #[must_use]
    pub fn moves(&self) -> &MoveSequence {
        &self.moves
    }

    #[must_use]
    pub fn phase1(&self) -> &[Move] {
        &self.moves[..self.phase1_len]
    }

    #[must_use]
    pub fn phase2(&self) -> &[Move] {
        &self.moves[self.phase1_len..]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Renders the moves space separated, with a `.` token after the phase 1
    /// moves if `use_separator` is set. No token is written when phase 1 is
    /// empty.
    #[must_use]
    pub fn format(&self, use_separator: bool) -> String {
        if use_separator && self.phase1_len > 0 {
            self.phase1()
                .iter()
                .map(ToString::to_string)
                .chain(std::iter::once(PHASE_SEPARATOR.to_owned()))
                .chain(self.phase2().iter().map(ToString::to_string))
                .join(" ")
        } else {
            self.moves.to_string()
        }
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.moves)
    }
}

impl From<Solution> for MoveSequence {
    fn from(solution: Solution) -> Self {
        solution.moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution() -> Solution {
        let phase1: MoveSequence = "R F' U".parse().unwrap();
        let phase2: MoveSequence = "D2 L2 U'".parse().unwrap();
        Solution::new(phase1.0, phase2.0)
    }

    #[test]
    fn test_format() {
        let solution = solution();
        assert_eq!(solution.len(), 6);
        assert_eq!(solution.format(false), "R F' U D2 L2 U'");
        assert_eq!(solution.format(true), "R F' U . D2 L2 U'");
        assert_eq!(solution.to_string(), solution.format(false));
    }

    #[test]
    fn test_phases() {
        let solution = solution();
        assert_eq!(solution.phase1().len(), 3);
        assert!(solution.phase2().iter().all(|m| m.is_phase2()));
    }

    #[test]
    fn test_empty() {
        let solution = Solution::new([], []);
        assert!(solution.is_empty());
        assert_eq!(solution.format(false), "");
        assert_eq!(solution.format(true), "");
    }

    #[test]
    fn test_separator_needs_phase1_moves() {
        let phase2: MoveSequence = "U2 R2".parse().unwrap();
        let solution = Solution::new([], phase2.0);
        assert!(solution.phase1().is_empty());
        assert_eq!(solution.format(true), "U2 R2");

        let phase1: MoveSequence = "R'".parse().unwrap();
        let solution = Solution::new(phase1.0, []);
        assert_eq!(solution.format(true), "R' .");
    }
}
